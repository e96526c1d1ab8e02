//! # Focus HTTP Runtime
//!
//! HTTP and WebSocket runtime for the Focus realtime notification
//! layer: the connection registry, per-session protocol (handshake,
//! heartbeat, control actions), the notification dispatcher used by
//! business logic, and the axum routes that front them.
//!
//! The registry is plain shared state; construct one
//! `Arc<ConnectionRegistry>` in the binary and hand it to the router
//! and to every [`NotificationDispatcher`].

pub mod notify;
pub mod routes;
pub mod shutdown;
pub mod websocket;

pub use notify::NotificationDispatcher;
pub use routes::{AppContext, router};
pub use shutdown::shutdown_signal;
pub use websocket::{
    ConnectionRegistry, RegistryStats, SendOutcome, ServerFrame, WsError,
};
