use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use focus_core::{JwtAuthenticator, RealtimeConfig};
use focus_http::{AppContext, ConnectionRegistry, router, shutdown_signal};

const SERVICE_NAME: &str = "Focus API";

#[derive(Parser, Debug)]
#[command(name = "focus-server", version)]
#[command(about = "Focus realtime notification server")]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: SocketAddr,
    /// Seconds between server heartbeat frames
    #[arg(long, default_value_t = 30)]
    heartbeat_interval: u64,
    /// Seconds allowed for enqueueing one outbound frame
    #[arg(long, default_value_t = 5)]
    send_timeout: u64,
    /// Disable the websocket channel (introspection routes stay up)
    #[arg(long)]
    no_websocket: bool,
    /// Allowed CORS origin, repeatable; permissive when omitted
    #[arg(long = "cors-origin")]
    cors_origins: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let secret = std::env::var("FOCUS_SECRET_KEY").unwrap_or_else(|_| {
        warn!("FOCUS_SECRET_KEY not set, using the development secret");
        "focus-development-secret".to_string()
    });

    let config = RealtimeConfig::builder()
        .enabled(!cli.no_websocket)
        .heartbeat_interval(Duration::from_secs(cli.heartbeat_interval))?
        .send_timeout(Duration::from_secs(cli.send_timeout))?
        .build();

    info!(
        "Starting {SERVICE_NAME} v{} (websocket {})",
        env!("CARGO_PKG_VERSION"),
        if config.enabled { "enabled" } else { "disabled" }
    );

    let registry = Arc::new(ConnectionRegistry::new(config));
    let authenticator = Arc::new(JwtAuthenticator::new(&secret));
    let ctx = AppContext::new(registry, authenticator);

    let cors = if cli.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins = cli
            .cors_origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = router(ctx).layer(TraceLayer::new_for_http()).layer(cors);

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}
