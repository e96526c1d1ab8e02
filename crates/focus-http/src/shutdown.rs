//! Graceful shutdown signal handling.

use tokio::signal;
use tracing::info;

/// Completes when a shutdown signal is received: SIGTERM (container
/// orchestration) or SIGINT (Ctrl+C during development).
///
/// # Examples
///
/// ```no_run
/// use focus_http::shutdown_signal;
/// use tokio::net::TcpListener;
/// use axum::Router;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let app = Router::new();
///     let listener = TcpListener::bind("0.0.0.0:8000").await?;
///
///     axum::serve(listener, app)
///         .with_graceful_shutdown(shutdown_signal())
///         .await?;
///
///     Ok(())
/// }
/// ```
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
