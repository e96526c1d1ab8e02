//! Connection registry: bookkeeping of live sessions per user.
//!
//! One `RwLock`-guarded map is the only shared mutable state in the
//! realtime core. Fan-out snapshots the senders it needs and releases
//! the lock before awaiting any send, so a slow client can never stall
//! other deliveries or registrations.

use std::collections::HashMap;
use std::time::Instant;

use focus_core::{RealtimeConfig, SessionId, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

use super::protocol::{SendOutcome, ServerFrame};

/// Sender half of one session's outbound frame channel. The matching
/// receiver is drained by the session's writer task.
pub type FrameSender = mpsc::Sender<ServerFrame>;

struct SessionEntry {
    sender: FrameSender,
    connected_at: Instant,
}

/// Registry snapshot reported over `get_stats` and `GET /ws/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_users: usize,
    pub total_connections: usize,
}

/// Registry of live sessions keyed by user. A user key exists iff the
/// user has at least one live session.
pub struct ConnectionRegistry {
    config: RealtimeConfig,
    sessions: RwLock<HashMap<UserId, HashMap<SessionId, SessionEntry>>>,
}

impl ConnectionRegistry {
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Register a session and confirm readiness on its channel.
    pub async fn register(&self, user_id: UserId, session_id: SessionId, sender: FrameSender) {
        {
            let mut sessions = self.sessions.write().await;
            sessions.entry(user_id).or_default().insert(
                session_id,
                SessionEntry {
                    sender: sender.clone(),
                    connected_at: Instant::now(),
                },
            );
        }
        info!(%user_id, %session_id, "session registered");

        // Readiness ack. A session dead this early is caught by its
        // own receive loop, not here.
        let _ = self.deliver(&sender, ServerFrame::connection()).await;
    }

    /// Remove a session. Redundant calls are no-ops, so the receive
    /// loop and the dead-handle pruning path may both run.
    pub async fn unregister(&self, user_id: UserId, session_id: SessionId) {
        let removed = {
            let mut sessions = self.sessions.write().await;
            match sessions.get_mut(&user_id) {
                Some(per_user) => {
                    let entry = per_user.remove(&session_id);
                    if per_user.is_empty() {
                        sessions.remove(&user_id);
                    }
                    entry
                }
                None => None,
            }
        };

        match removed {
            Some(entry) => info!(
                %user_id,
                %session_id,
                duration_secs = entry.connected_at.elapsed().as_secs(),
                "session unregistered"
            ),
            None => debug!(%user_id, %session_id, "unregister for unknown session"),
        }
    }

    /// Push a frame to every live session of one user.
    ///
    /// Returns the number of sessions that accepted the frame. An
    /// unconnected user yields 0 without error. A dead handle is
    /// unregistered as a side effect and never affects delivery to the
    /// user's other sessions.
    pub async fn send_to_user(&self, user_id: UserId, frame: ServerFrame) -> usize {
        let targets: Vec<(SessionId, FrameSender)> = {
            let sessions = self.sessions.read().await;
            match sessions.get(&user_id) {
                Some(per_user) => per_user
                    .iter()
                    .map(|(id, entry)| (*id, entry.sender.clone()))
                    .collect(),
                None => {
                    debug!(%user_id, "no active sessions");
                    return 0;
                }
            }
        };

        let mut delivered = 0;
        for (session_id, sender) in targets {
            match self.deliver(&sender, frame.clone()).await {
                SendOutcome::Sent => delivered += 1,
                outcome => {
                    warn!(%user_id, %session_id, %outcome, "pruning dead session");
                    self.unregister(user_id, session_id).await;
                }
            }
        }
        delivered
    }

    /// Push a frame to every session of every connected user, optionally
    /// excluding one user. Failure isolation matches `send_to_user`.
    pub async fn broadcast(&self, frame: ServerFrame, exclude: Option<UserId>) -> usize {
        let targets: Vec<(UserId, SessionId, FrameSender)> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .filter(|(user_id, _)| exclude != Some(**user_id))
                .flat_map(|(user_id, per_user)| {
                    per_user
                        .iter()
                        .map(move |(id, entry)| (*user_id, *id, entry.sender.clone()))
                })
                .collect()
        };

        let mut delivered = 0;
        for (user_id, session_id, sender) in targets {
            match self.deliver(&sender, frame.clone()).await {
                SendOutcome::Sent => delivered += 1,
                outcome => {
                    warn!(%user_id, %session_id, %outcome, "pruning dead session");
                    self.unregister(user_id, session_id).await;
                }
            }
        }
        debug!(delivered, "broadcast complete");
        delivered
    }

    pub async fn is_user_connected(&self, user_id: UserId) -> bool {
        self.sessions
            .read()
            .await
            .get(&user_id)
            .is_some_and(|per_user| !per_user.is_empty())
    }

    /// Sorted snapshot of users with at least one live session.
    pub async fn connected_users(&self) -> Vec<UserId> {
        let sessions = self.sessions.read().await;
        let mut users: Vec<UserId> = sessions.keys().copied().collect();
        users.sort();
        users
    }

    pub async fn stats(&self) -> RegistryStats {
        let sessions = self.sessions.read().await;
        RegistryStats {
            total_users: sessions.len(),
            total_connections: sessions.values().map(HashMap::len).sum(),
        }
    }

    /// Enqueue one frame on one channel, bounded by the send timeout.
    async fn deliver(&self, sender: &FrameSender, frame: ServerFrame) -> SendOutcome {
        match tokio::time::timeout(self.config.send_timeout, sender.send(frame)).await {
            Ok(Ok(())) => SendOutcome::Sent,
            Ok(Err(_)) => SendOutcome::Closed,
            Err(_) => SendOutcome::TimedOut,
        }
    }
}
