//! HTTP surface of the realtime layer.
//!
//! Three routes: the WebSocket upgrade, a read-only introspection
//! endpoint for operators, and a health probe. Middleware (CORS,
//! request tracing) is layered on by the server binary.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use focus_core::{Authenticator, UserId};

use crate::websocket::registry::ConnectionRegistry;
use crate::websocket::session::websocket_handler;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppContext {
    pub registry: Arc<ConnectionRegistry>,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppContext {
    pub fn new(registry: Arc<ConnectionRegistry>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            registry,
            authenticator,
        }
    }
}

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/ws/notifications", get(websocket_handler))
        .route("/ws/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .with_state(ctx)
}

#[derive(Debug, Serialize)]
pub struct WsStatsResponse {
    pub websocket_enabled: bool,
    pub active_users: usize,
    pub active_connections: usize,
    pub connected_user_ids: Vec<UserId>,
}

/// `GET /ws/stats` — registry snapshot. Read-only: exposes no way to
/// mutate the registry.
pub async fn stats_handler(State(ctx): State<AppContext>) -> Json<WsStatsResponse> {
    let stats = ctx.registry.stats().await;
    Json(WsStatsResponse {
        websocket_enabled: ctx.registry.config().enabled,
        active_users: stats.total_users,
        active_connections: stats.total_connections,
        connected_user_ids: ctx.registry.connected_users().await,
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// `GET /health` — liveness probe.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "focus-api",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use focus_core::{AuthError, RealtimeConfig, SessionId};
    use tokio::sync::mpsc;

    struct DenyAll;

    #[async_trait]
    impl Authenticator for DenyAll {
        async fn authenticate(&self, _token: &str) -> Result<UserId, AuthError> {
            Err(AuthError::InvalidSubject("denied".to_string()))
        }
    }

    fn ctx() -> AppContext {
        AppContext::new(
            Arc::new(ConnectionRegistry::new(RealtimeConfig::default())),
            Arc::new(DenyAll),
        )
    }

    #[tokio::test]
    async fn stats_route_reflects_registry_contents() {
        let ctx = ctx();
        let (tx_a, _rx_a) = mpsc::channel(8);
        let (tx_b, _rx_b) = mpsc::channel(8);
        ctx.registry
            .register(UserId::new(7), SessionId::new(), tx_a)
            .await;
        ctx.registry
            .register(UserId::new(9), SessionId::new(), tx_b)
            .await;

        let Json(body) = stats_handler(State(ctx)).await;
        assert!(body.websocket_enabled);
        assert_eq!(body.active_users, 2);
        assert_eq!(body.active_connections, 2);
        assert_eq!(
            body.connected_user_ids,
            vec![UserId::new(7), UserId::new(9)]
        );
    }

    #[tokio::test]
    async fn stats_route_reports_disabled_channel() {
        let ctx = AppContext::new(
            Arc::new(ConnectionRegistry::new(
                RealtimeConfig::builder().enabled(false).build(),
            )),
            Arc::new(DenyAll),
        );
        let Json(body) = stats_handler(State(ctx)).await;
        assert!(!body.websocket_enabled);
        assert_eq!(body.active_connections, 0);
    }

    #[tokio::test]
    async fn health_route_reports_service_identity() {
        let Json(body) = health_handler().await;
        assert_eq!(body.status, "healthy");
        assert_eq!(body.service, "focus-api");
        assert!(!body.version.is_empty());
    }
}
