//! WebSocket support for real-time notifications.
//!
//! Layout mirrors the session lifecycle: [`session`] drives a single
//! connection from upgrade to teardown, [`registry`] tracks every live
//! session per user, [`protocol`] defines the wire frames, and
//! [`error`] the session-level failure modes.

pub mod error;
pub mod protocol;
pub mod registry;
pub mod session;

pub use error::WsError;
pub use protocol::{ClientAction, SendOutcome, ServerFrame};
pub use registry::{ConnectionRegistry, FrameSender, RegistryStats};
pub use session::websocket_handler;

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use focus_core::{SessionId, UserId};

/// Typestate marker for a session that has not completed the
/// authentication handshake.
#[derive(Debug)]
pub struct Pending;

/// Typestate marker for an authenticated session.
#[derive(Debug)]
pub struct Authenticated {
    user_id: UserId,
}

/// Per-session record with compile-time authentication state. A
/// `ConnectionInfo<Pending>` cannot reach the registry; only the
/// [`authenticate`](ConnectionInfo::authenticate) transition produces
/// the registered form.
#[derive(Debug)]
pub struct ConnectionInfo<State = Pending> {
    id: SessionId,
    peer: SocketAddr,
    connected_at: Instant,
    state: State,
}

impl ConnectionInfo<Pending> {
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            id: SessionId::new(),
            peer,
            connected_at: Instant::now(),
            state: Pending,
        }
    }

    /// Consume the pending session and mark it authenticated.
    pub fn authenticate(self, user_id: UserId) -> ConnectionInfo<Authenticated> {
        ConnectionInfo {
            id: self.id,
            peer: self.peer,
            connected_at: self.connected_at,
            state: Authenticated { user_id },
        }
    }
}

impl ConnectionInfo<Authenticated> {
    pub fn user_id(&self) -> UserId {
        self.state.user_id
    }
}

impl<State> ConnectionInfo<State> {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:4000".parse().unwrap()
    }

    #[test]
    fn authentication_preserves_session_identity() {
        let pending = ConnectionInfo::new(addr());
        let id = pending.id();
        let open = pending.authenticate(UserId::new(7));
        assert_eq!(open.id(), id);
        assert_eq!(open.user_id(), UserId::new(7));
        assert_eq!(open.peer(), addr());
    }
}
