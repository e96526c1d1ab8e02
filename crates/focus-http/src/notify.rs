//! Typed notification dispatch.
//!
//! Thin façade business logic calls after committing its own writes.
//! Delivery is best-effort: an offline recipient is a normal condition,
//! never an error, and nothing here blocks on client consumption beyond
//! the registry's per-send bound.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use focus_core::{Notification, UserId};

use crate::websocket::protocol::ServerFrame;
use crate::websocket::registry::ConnectionRegistry;

pub struct NotificationDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver one notification to every live session of the user.
    /// Returns the number of sessions that accepted it; 0 means the
    /// user is offline.
    pub async fn notify(&self, user_id: UserId, notification: Notification) -> usize {
        let frame = ServerFrame::notification(&notification);
        let delivered = self.registry.send_to_user(user_id, frame).await;
        debug!(%user_id, delivered, "notification dispatched");
        delivered
    }

    pub async fn notify_activity_update(
        &self,
        user_id: UserId,
        activity: Map<String, Value>,
    ) -> usize {
        self.notify(user_id, Notification::ActivityUpdate { activity })
            .await
    }

    pub async fn notify_limit_warning(
        &self,
        user_id: UserId,
        app_name: impl Into<String>,
        percentage: f64,
    ) -> usize {
        self.notify(
            user_id,
            Notification::LimitWarning {
                app_name: app_name.into(),
                percentage,
            },
        )
        .await
    }

    pub async fn notify_app_blocked(&self, user_id: UserId, app_name: impl Into<String>) -> usize {
        self.notify(
            user_id,
            Notification::AppBlocked {
                app_name: app_name.into(),
            },
        )
        .await
    }

    pub async fn notify_challenge_update(
        &self,
        user_id: UserId,
        challenge_title: impl Into<String>,
        update_type: impl Into<String>,
        message: impl Into<String>,
        data: Map<String, Value>,
    ) -> usize {
        self.notify(
            user_id,
            Notification::ChallengeUpdate {
                challenge_title: challenge_title.into(),
                update_type: update_type.into(),
                message: message.into(),
                data,
            },
        )
        .await
    }

    /// Fan a leaderboard refresh out to every participant. Returns how
    /// many users had at least one live session.
    pub async fn notify_leaderboard_update(
        &self,
        user_ids: &[UserId],
        challenge_title: impl Into<String>,
        leaderboard: Map<String, Value>,
    ) -> usize {
        let challenge_title = challenge_title.into();
        let mut reached = 0;
        for &user_id in user_ids {
            let delivered = self
                .notify(
                    user_id,
                    Notification::LeaderboardUpdate {
                        challenge_title: challenge_title.clone(),
                        leaderboard: leaderboard.clone(),
                    },
                )
                .await;
            if delivered > 0 {
                reached += 1;
            }
        }
        reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_core::{RealtimeConfig, SessionId};
    use serde_json::json;
    use tokio::sync::mpsc;

    fn setup() -> (Arc<ConnectionRegistry>, NotificationDispatcher) {
        let registry = Arc::new(ConnectionRegistry::new(RealtimeConfig::default()));
        let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));
        (registry, dispatcher)
    }

    #[tokio::test]
    async fn app_blocked_reaches_every_session_of_the_user() {
        let (registry, dispatcher) = setup();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        registry.register(UserId::new(7), SessionId::new(), tx_a).await;
        registry.register(UserId::new(7), SessionId::new(), tx_b).await;
        rx_a.recv().await.unwrap();
        rx_b.recv().await.unwrap();

        let delivered = dispatcher.notify_app_blocked(UserId::new(7), "TikTok").await;
        assert_eq!(delivered, 2);

        for rx in [&mut rx_a, &mut rx_b] {
            let frame = rx.recv().await.unwrap();
            let value = serde_json::to_value(frame).unwrap();
            assert_eq!(value["type"], "notification");
            assert_eq!(value["notification_type"], "error");
            assert_eq!(value["data"]["app_name"], "TikTok");
        }
    }

    #[tokio::test]
    async fn offline_recipient_is_not_an_error() {
        let (_registry, dispatcher) = setup();
        let delivered = dispatcher
            .notify_limit_warning(UserId::new(123), "Instagram", 80.0)
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn leaderboard_fanout_counts_reached_users() {
        let (registry, dispatcher) = setup();
        let (tx, mut rx) = mpsc::channel(8);
        registry.register(UserId::new(1), SessionId::new(), tx).await;
        rx.recv().await.unwrap();

        let mut leaderboard = Map::new();
        leaderboard.insert("standings".to_string(), json!([{"user_id": 1, "rank": 1}]));
        let reached = dispatcher
            .notify_leaderboard_update(
                &[UserId::new(1), UserId::new(2), UserId::new(3)],
                "Digital Detox",
                leaderboard,
            )
            .await;
        assert_eq!(reached, 1);

        let frame = rx.recv().await.unwrap();
        let value = serde_json::to_value(frame).unwrap();
        assert_eq!(value["notification_type"], "info");
        assert_eq!(value["title"], "Leaderboard updated: Digital Detox");
    }

    #[tokio::test]
    async fn challenge_update_carries_merged_data() {
        let (registry, dispatcher) = setup();
        let (tx, mut rx) = mpsc::channel(8);
        registry.register(UserId::new(5), SessionId::new(), tx).await;
        rx.recv().await.unwrap();

        let mut data = Map::new();
        data.insert("progress".to_string(), json!(50));
        dispatcher
            .notify_challenge_update(
                UserId::new(5),
                "Screen-free weekend",
                "progress",
                "Halfway there",
                data,
            )
            .await;

        let frame = rx.recv().await.unwrap();
        let value = serde_json::to_value(frame).unwrap();
        assert_eq!(value["notification_type"], "success");
        assert_eq!(value["data"]["update_type"], "progress");
        assert_eq!(value["data"]["progress"], 50);
        assert_eq!(value["message"], "Halfway there");
    }
}
