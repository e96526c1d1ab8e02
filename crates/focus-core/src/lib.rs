//! # Focus Core
//!
//! Domain types shared across the Focus realtime backend: validated
//! identifiers, the notification payload model, bearer-token
//! authentication, and runtime configuration.
//!
//! This crate is transport-agnostic. The WebSocket wire format and the
//! connection registry live in `focus-http`; everything here can be
//! consumed by any delivery mechanism.

pub mod auth;
pub mod config;
pub mod identifiers;
pub mod notification;

pub use auth::{AuthError, Authenticator, Claims, JwtAuthenticator};
pub use config::{ConfigError, RealtimeConfig, RealtimeConfigBuilder};
pub use identifiers::{SessionId, UserId};
pub use notification::{Notification, Severity};
