//! ipveil detection API
//!
//! Serves single-address detection, bulk jobs with polling, detection
//! history, and a liveness endpoint.

mod error;
mod handlers;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ipveil_runtime::{
    load_ranges, DetectionEngine, EngineConfig, JobStore, MemoryCache, MemoryHistory, NullSink,
    ProgressSink,
};

#[derive(Parser)]
#[command(name = "ipveil-server")]
#[command(author, version, about = "Multi-signal VPN/proxy detection API", long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Override the compiled-in VPN/datacenter range file
    #[arg(long)]
    ranges: Option<PathBuf>,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DetectionEngine>,
    pub jobs: Arc<JobStore>,
    pub sink: Arc<dyn ProgressSink>,
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/detect", post(handlers::detect))
        .route("/api/bulk", post(handlers::bulk_submit))
        .route("/api/bulk/:id", get(handlers::bulk_status))
        .route("/api/history", get(handlers::history))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let config = EngineConfig::default();
    config
        .scoring
        .validate()
        .context("invalid scoring configuration")?;

    let mut engine = DetectionEngine::new(
        config,
        Arc::new(MemoryCache::new()),
        Arc::new(MemoryHistory::new()),
    );
    if let Some(path) = &cli.ranges {
        let ranges = load_ranges(path)
            .with_context(|| format!("failed to load ranges from {}", path.display()))?;
        tracing::info!(count = ranges.len(), path = %path.display(), "loaded range file");
        engine = engine.with_ranges(ranges);
    }

    let state = AppState {
        engine: Arc::new(engine),
        jobs: Arc::new(JobStore::new()),
        sink: Arc::new(NullSink),
    };
    let app = build_router(state);

    tracing::info!(addr = %cli.bind, "listening");
    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .context("failed to bind")?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
