//! WebSocket session lifecycle.
//!
//! A session moves connect → authenticate → open → closing → closed.
//! While open, three units run concurrently: the writer task (owns the
//! socket sink and serializes frames), the heartbeat task, and the
//! receive loop. The receive loop is the sole owner of teardown; the
//! heartbeat task exits silently when its channel dies.
//!
//! Subscribe/unsubscribe actions are acknowledged but deliberately not
//! consulted when routing: every notification reaches all of a user's
//! sessions regardless of announced interests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use focus_core::UserId;

use super::ConnectionInfo;
use super::error::WsError;
use super::protocol::{ClientAction, ServerFrame};
use super::registry::{ConnectionRegistry, FrameSender};
use crate::routes::AppContext;

/// Query parameters of the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// `GET /ws/notifications?token=...` upgrade handler.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(ctx): State<AppContext>,
    Query(query): Query<WsQuery>,
) -> Response {
    if !ctx.registry.config().enabled {
        return (StatusCode::SERVICE_UNAVAILABLE, "websocket channel disabled").into_response();
    }
    debug!(%peer, "websocket upgrade request");
    ws.on_upgrade(move |socket| handle_session(socket, peer, ctx, query.token))
}

async fn handle_session(socket: WebSocket, peer: SocketAddr, ctx: AppContext, token: String) {
    let pending = ConnectionInfo::new(peer);
    let (mut sink, mut stream) = socket.split();

    // One authenticator call per connection. Failure sends a
    // best-effort error frame and closes without touching the registry.
    let session = match ctx.authenticator.authenticate(&token).await {
        Ok(user_id) => pending.authenticate(user_id),
        Err(err) => {
            warn!(%peer, error = %err, "websocket authentication failed");
            let frame = WsError::AuthenticationFailed(err).to_frame();
            if let Ok(text) = serde_json::to_string(&frame) {
                let _ = sink.send(Message::Text(text.into())).await;
            }
            let _ = sink.close().await;
            return;
        }
    };

    let user_id = session.user_id();
    let session_id = session.id();
    info!(%user_id, %session_id, %peer, "websocket session open");

    let (tx, mut rx) = mpsc::channel::<ServerFrame>(ctx.registry.config().channel_buffer);
    ctx.registry.register(user_id, session_id, tx.clone()).await;

    // Writer task: owns the sink; frames are serialized only here.
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(err) => {
                    error!(error = %err, "frame serialization failed");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let heartbeat = tokio::spawn(heartbeat_task(
        tx.clone(),
        ctx.registry.config().heartbeat_interval,
    ));

    let max_message_size = ctx.registry.config().max_message_size;
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if text.len() > max_message_size {
                    let err = WsError::MessageTooLarge {
                        size: text.len(),
                        limit: max_message_size,
                    };
                    let _ = tx.send(err.to_frame()).await;
                    continue;
                }
                handle_action(&ctx.registry, &tx, user_id, text.as_str()).await;
            }
            Ok(Message::Binary(_)) => {
                let err = WsError::MalformedFrame("binary frames not supported".to_string());
                let _ = tx.send(err.to_frame()).await;
            }
            // Transport-level ping/pong is answered by axum itself.
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                debug!(%user_id, %session_id, "client closed connection");
                break;
            }
            Err(err) => {
                warn!(%user_id, %session_id, error = %err, "websocket receive error");
                break;
            }
        }
    }

    // Teardown: stop both companion tasks, then deregister. Unregister
    // is idempotent with the registry's dead-handle pruning.
    heartbeat.abort();
    writer.abort();
    ctx.registry.unregister(user_id, session_id).await;
    info!(%user_id, %session_id, age_secs = session.age().as_secs(), "websocket session closed");
}

/// Interpret one inbound control frame and queue the reply. Errors are
/// answered with an `error` frame; the session stays open.
pub(crate) async fn handle_action(
    registry: &ConnectionRegistry,
    tx: &FrameSender,
    user_id: UserId,
    text: &str,
) {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            let _ = tx
                .send(WsError::MalformedFrame(err.to_string()).to_frame())
                .await;
            return;
        }
    };

    match serde_json::from_value::<ClientAction>(value.clone()) {
        Ok(ClientAction::Ping { timestamp }) => {
            let _ = tx.send(ServerFrame::pong(timestamp)).await;
        }
        Ok(ClientAction::Subscribe { events }) => {
            info!(%user_id, ?events, "subscribe");
            let _ = tx.send(ServerFrame::subscribed(events)).await;
        }
        Ok(ClientAction::Unsubscribe { events }) => {
            info!(%user_id, ?events, "unsubscribe");
            let _ = tx.send(ServerFrame::unsubscribed(events)).await;
        }
        Ok(ClientAction::GetStats) => {
            let stats = registry.stats().await;
            let _ = tx.send(ServerFrame::stats(stats)).await;
        }
        Err(_) => {
            let action = value
                .get("action")
                .and_then(|v| v.as_str())
                .unwrap_or("<missing>")
                .to_string();
            let _ = tx.send(WsError::UnknownAction(action).to_frame()).await;
        }
    }
}

/// Periodic keepalive on the session's outbound channel. Exits silently
/// when the channel closes; teardown also aborts it directly.
pub(crate) async fn heartbeat_task(tx: FrameSender, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick of an interval completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if tx.send(ServerFrame::heartbeat()).await.is_err() {
            break;
        }
    }
}
