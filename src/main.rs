use std::env;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_matcher::config::{Config, LogFormat};
use resume_matcher::{build_router, AppState};

const DEFAULT_LOG_FILTER: &str = "resume_matcher=debug,tower_http=debug,axum::rejection=trace";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing(LogFormat::from_env());

    let config = Config::from_env()?;

    tracing::info!("Starting Resume Matcher Service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Model: {} at {}", config.gemini_model, config.gemini_api_base);
    tracing::info!("Max file size: {}MB", config.max_file_size_mb);
    tracing::info!("Max concurrent requests: {}", config.max_concurrent_requests);

    // Railway-style PORT overrides SERVER_PORT
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server_port);
    let addr = format!("{}:{}", config.server_host, port);

    let state = AppState::new(config)?;
    let app = build_router(state);

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
