//! Wire protocol of the notification channel.
//!
//! Inbound control frames are discriminated by `action`, outbound
//! frames by `type`; both travel as JSON text frames. Timestamps are
//! RFC 3339 UTC.

use std::fmt;

use chrono::{DateTime, Utc};
use focus_core::{Notification, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::registry::RegistryStats;

/// Control frame sent by the client while the session is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    /// Liveness probe; an attached `timestamp` is echoed back verbatim.
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<Value>,
    },
    /// Interest registration. Acknowledged but not consulted when
    /// routing notifications.
    Subscribe {
        #[serde(default)]
        events: Vec<String>,
    },
    Unsubscribe {
        #[serde(default)]
        events: Vec<String>,
    },
    /// Request a registry snapshot.
    GetStats,
}

/// Frame pushed to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Sent once right after registration to confirm readiness.
    Connection {
        message: String,
        timestamp: DateTime<Utc>,
    },
    Heartbeat {
        timestamp: DateTime<Utc>,
    },
    Pong {
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<Value>,
    },
    Subscribed {
        events: Vec<String>,
        message: String,
    },
    Unsubscribed {
        events: Vec<String>,
        message: String,
    },
    Stats {
        data: RegistryStats,
    },
    Error {
        message: String,
    },
    Notification {
        notification_type: Severity,
        title: String,
        message: String,
        data: Value,
        timestamp: DateTime<Utc>,
    },
}

impl ServerFrame {
    pub fn connection() -> Self {
        ServerFrame::Connection {
            message: "Connection established".to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn heartbeat() -> Self {
        ServerFrame::Heartbeat {
            timestamp: Utc::now(),
        }
    }

    pub fn pong(timestamp: Option<Value>) -> Self {
        ServerFrame::Pong { timestamp }
    }

    pub fn subscribed(events: Vec<String>) -> Self {
        ServerFrame::Subscribed {
            events,
            message: "Subscription successful".to_string(),
        }
    }

    pub fn unsubscribed(events: Vec<String>) -> Self {
        ServerFrame::Unsubscribed {
            events,
            message: "Unsubscription successful".to_string(),
        }
    }

    pub fn stats(data: RegistryStats) -> Self {
        ServerFrame::Stats { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerFrame::Error {
            message: message.into(),
        }
    }

    /// Project a domain notification onto its wire shape.
    pub fn notification(notification: &Notification) -> Self {
        ServerFrame::Notification {
            notification_type: notification.severity(),
            title: notification.title(),
            message: notification.message(),
            data: notification.data(),
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of enqueueing one frame on one session channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Frame handed to the session's writer task.
    Sent,
    /// Channel closed: the session is gone.
    Closed,
    /// The send did not complete within the configured bound; the
    /// session is treated as dead.
    TimedOut,
}

impl SendOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendOutcome::Sent => write!(f, "sent"),
            SendOutcome::Closed => write!(f, "closed"),
            SendOutcome::TimedOut => write!(f, "timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_core::Notification;
    use serde_json::json;

    #[test]
    fn client_actions_parse_from_wire_json() {
        let ping: ClientAction = serde_json::from_str(r#"{"action": "ping"}"#).unwrap();
        assert_eq!(ping, ClientAction::Ping { timestamp: None });

        let ping: ClientAction =
            serde_json::from_str(r#"{"action": "ping", "timestamp": 1712000000}"#).unwrap();
        assert_eq!(
            ping,
            ClientAction::Ping {
                timestamp: Some(json!(1712000000))
            }
        );

        let sub: ClientAction =
            serde_json::from_str(r#"{"action": "subscribe", "events": ["activity"]}"#).unwrap();
        assert_eq!(
            sub,
            ClientAction::Subscribe {
                events: vec!["activity".to_string()]
            }
        );

        let stats: ClientAction = serde_json::from_str(r#"{"action": "get_stats"}"#).unwrap();
        assert_eq!(stats, ClientAction::GetStats);
    }

    #[test]
    fn unknown_action_fails_to_parse() {
        assert!(serde_json::from_str::<ClientAction>(r#"{"action": "dance"}"#).is_err());
        assert!(serde_json::from_str::<ClientAction>(r#"{"events": []}"#).is_err());
    }

    #[test]
    fn frames_are_tagged_by_type() {
        let value = serde_json::to_value(ServerFrame::heartbeat()).unwrap();
        assert_eq!(value["type"], "heartbeat");
        assert!(value["timestamp"].is_string());

        let value = serde_json::to_value(ServerFrame::error("bad frame")).unwrap();
        assert_eq!(value, json!({"type": "error", "message": "bad frame"}));

        let value = serde_json::to_value(ServerFrame::stats(RegistryStats {
            total_users: 2,
            total_connections: 3,
        }))
        .unwrap();
        assert_eq!(
            value,
            json!({"type": "stats", "data": {"total_users": 2, "total_connections": 3}})
        );
    }

    #[test]
    fn pong_echoes_client_timestamp() {
        let value = serde_json::to_value(ServerFrame::pong(Some(json!("2026-01-01")))).unwrap();
        assert_eq!(value, json!({"type": "pong", "timestamp": "2026-01-01"}));

        // Absent timestamp is omitted, not null.
        let value = serde_json::to_value(ServerFrame::pong(None)).unwrap();
        assert_eq!(value, json!({"type": "pong"}));
    }

    #[test]
    fn notification_frame_carries_typed_payload() {
        let frame = ServerFrame::notification(&Notification::AppBlocked {
            app_name: "TikTok".to_string(),
        });
        let value = serde_json::to_value(frame).unwrap();
        assert_eq!(value["type"], "notification");
        assert_eq!(value["notification_type"], "error");
        assert_eq!(value["title"], "Application blocked");
        assert_eq!(value["data"]["app_name"], "TikTok");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn subscription_acks_echo_events() {
        let value =
            serde_json::to_value(ServerFrame::subscribed(vec!["activity".to_string()])).unwrap();
        assert_eq!(value["type"], "subscribed");
        assert_eq!(value["events"], json!(["activity"]));
        assert_eq!(value["message"], "Subscription successful");
    }

    #[test]
    fn send_outcome_classification() {
        assert!(SendOutcome::Sent.is_success());
        assert!(SendOutcome::Closed.is_failure());
        assert!(SendOutcome::TimedOut.is_failure());
        assert_eq!(SendOutcome::TimedOut.to_string(), "timed out");
    }
}
