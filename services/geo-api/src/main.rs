//! Geo API server
//!
//! Shapefile upload aggregation and raster footprint queries over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use geo_api::build_router;
use geo_api::config::ApiConfig;
use geo_api::state::AppState;

/// Geo API server
#[derive(Parser, Debug)]
#[command(name = "geo-api")]
#[command(about = "Shapefile upload and raster query server")]
struct Args {
    /// Listen address (overrides GEO_API_LISTEN_ADDR)
    #[arg(short, long)]
    listen: Option<String>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "GEO_API_WORKER_THREADS")]
    worker_threads: Option<usize>,

    /// Run schema migrations before serving
    #[arg(long)]
    migrate: bool,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let mut config = ApiConfig::from_env()?;
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    config.migrate |= args.migrate;

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    info!("Prometheus metrics exporter initialized");

    info!(
        storage = ?config.storage,
        temporal_rule = config.temporal_rule.as_str(),
        max_upload_mb = config.max_upload_mb,
        "Starting geo API server"
    );

    let state = Arc::new(AppState::new(&config, Some(prometheus_handle)).await?);
    let app = build_router(state, config.max_upload_bytes());

    let addr: SocketAddr = config.listen_addr.parse()?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
