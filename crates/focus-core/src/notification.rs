//! Notification payloads pushed over the realtime channel.
//!
//! Each domain event is a distinct variant with typed fields; severity,
//! title, message, and the structured `data` block are derived per
//! variant. The JSON wire frame is produced only at the transport
//! boundary, so business logic never assembles loose maps.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Severity category carried in the `notification_type` wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Success,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Success => "success",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain event to push to a user's connected sessions.
#[derive(Debug, Clone)]
pub enum Notification {
    /// A new activity row was recorded for the user.
    ActivityUpdate { activity: Map<String, Value> },
    /// Usage is approaching the configured daily limit for an app.
    LimitWarning { app_name: String, percentage: f64 },
    /// The app crossed its daily limit and is now blocked.
    AppBlocked { app_name: String },
    /// Progress on a challenge the user takes part in.
    ChallengeUpdate {
        challenge_title: String,
        update_type: String,
        message: String,
        data: Map<String, Value>,
    },
    /// A challenge leaderboard was recomputed.
    LeaderboardUpdate {
        challenge_title: String,
        leaderboard: Map<String, Value>,
    },
}

impl Notification {
    pub fn severity(&self) -> Severity {
        match self {
            Notification::ActivityUpdate { .. } | Notification::LeaderboardUpdate { .. } => {
                Severity::Info
            }
            Notification::LimitWarning { .. } => Severity::Warning,
            Notification::AppBlocked { .. } => Severity::Error,
            Notification::ChallengeUpdate { .. } => Severity::Success,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Notification::ActivityUpdate { .. } => "New activity recorded".to_string(),
            Notification::LimitWarning { .. } => "Limit almost reached".to_string(),
            Notification::AppBlocked { .. } => "Application blocked".to_string(),
            Notification::ChallengeUpdate {
                challenge_title, ..
            } => format!("Challenge: {challenge_title}"),
            Notification::LeaderboardUpdate {
                challenge_title, ..
            } => format!("Leaderboard updated: {challenge_title}"),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notification::ActivityUpdate { activity } => {
                let app = activity
                    .get("app_name")
                    .and_then(Value::as_str)
                    .unwrap_or("an application");
                format!("Your activity on {app} has been recorded")
            }
            Notification::LimitWarning {
                app_name,
                percentage,
            } => format!("You have used {percentage:.0}% of your daily limit for {app_name}"),
            Notification::AppBlocked { app_name } => {
                format!("{app_name} is now blocked: daily limit reached")
            }
            Notification::ChallengeUpdate { message, .. } => message.clone(),
            Notification::LeaderboardUpdate { .. } => {
                "The leaderboard has changed, check the new standings".to_string()
            }
        }
    }

    /// Structured `data` block of the wire frame.
    pub fn data(&self) -> Value {
        match self {
            Notification::ActivityUpdate { activity } => Value::Object(activity.clone()),
            Notification::LimitWarning {
                app_name,
                percentage,
            } => json!({ "app_name": app_name, "percentage": percentage }),
            Notification::AppBlocked { app_name } => json!({ "app_name": app_name }),
            Notification::ChallengeUpdate {
                update_type, data, ..
            } => {
                let mut merged = data.clone();
                merged.insert("update_type".to_string(), json!(update_type));
                Value::Object(merged)
            }
            Notification::LeaderboardUpdate { leaderboard, .. } => {
                Value::Object(leaderboard.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn severity_mapping_per_variant() {
        let activity = Notification::ActivityUpdate {
            activity: Map::new(),
        };
        let warning = Notification::LimitWarning {
            app_name: "Instagram".into(),
            percentage: 80.0,
        };
        let blocked = Notification::AppBlocked {
            app_name: "TikTok".into(),
        };
        let challenge = Notification::ChallengeUpdate {
            challenge_title: "Digital Detox".into(),
            update_type: "progress".into(),
            message: "Halfway there".into(),
            data: Map::new(),
        };
        let leaderboard = Notification::LeaderboardUpdate {
            challenge_title: "Digital Detox".into(),
            leaderboard: Map::new(),
        };

        assert_eq!(activity.severity(), Severity::Info);
        assert_eq!(warning.severity(), Severity::Warning);
        assert_eq!(blocked.severity(), Severity::Error);
        assert_eq!(challenge.severity(), Severity::Success);
        assert_eq!(leaderboard.severity(), Severity::Info);
    }

    #[test]
    fn app_blocked_data_carries_app_name() {
        let n = Notification::AppBlocked {
            app_name: "TikTok".into(),
        };
        assert_eq!(n.data()["app_name"], "TikTok");
        assert_eq!(n.title(), "Application blocked");
    }

    #[test]
    fn limit_warning_message_rounds_percentage() {
        let n = Notification::LimitWarning {
            app_name: "YouTube".into(),
            percentage: 87.5,
        };
        assert!(n.message().contains("88%"));
        assert_eq!(n.data()["percentage"], 87.5);
    }

    #[test]
    fn challenge_update_merges_update_type_into_data() {
        let n = Notification::ChallengeUpdate {
            challenge_title: "Screen-free weekend".into(),
            update_type: "rank_change".into(),
            message: "You moved up to 2nd place".into(),
            data: map(&[("rank", json!(2))]),
        };
        let data = n.data();
        assert_eq!(data["update_type"], "rank_change");
        assert_eq!(data["rank"], 2);
        assert_eq!(n.message(), "You moved up to 2nd place");
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
        assert_eq!(Severity::Success.as_str(), "success");
    }
}
