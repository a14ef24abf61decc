//! Geo API service library.
//!
//! Exposes the router and its modules so integration tests can drive the
//! service without a network listener.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the full router around shared state.
pub fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        // Ingestion
        .route("/api/upload", post(handlers::upload::upload_handler))
        // Raster lookup
        .route("/api/raster/dinamic", post(handlers::raster::raster_query_handler))
        // Workspace listings
        .route("/api/shapefile", get(handlers::workspace::shapefile_handler))
        .route("/api/shapeindex", get(handlers::workspace::shapeindex_handler))
        .route("/api/raster", get(handlers::workspace::raster_handler))
        // Registry
        .route("/api/filetype", get(handlers::filetype::filetype_handler))
        // Health check
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        // Metrics
        .route("/metrics", get(handlers::health::metrics_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
