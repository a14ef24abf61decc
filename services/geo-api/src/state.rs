//! Application state and shared resources.

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use ingestion::FeatureAggregator;
use storage::{
    Catalog, FeatureSink, FileTypeRegistry, MemoryCatalog, RasterMatcher, RasterSource,
    TemporalRule, WorkspaceSource,
};

use crate::config::{ApiConfig, StorageBackend};

/// Shared application state.
pub struct AppState {
    pub registry: Arc<FileTypeRegistry>,
    pub aggregator: FeatureAggregator,
    pub matcher: RasterMatcher,
    /// Persists uploads that carry an owner.
    pub sink: Arc<dyn FeatureSink>,
    /// Used for readiness checks.
    pub source: Arc<dyn RasterSource>,
    pub workspaces: Arc<dyn WorkspaceSource>,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Connect the configured backend.
    pub async fn new(config: &ApiConfig, metrics_handle: Option<PrometheusHandle>) -> Result<Self> {
        let registry = Arc::new(FileTypeRegistry::standard());

        let state = match config.storage {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is not set")?;
                let catalog = Arc::new(Catalog::connect(url, registry.clone()).await?);
                if config.migrate {
                    catalog.migrate().await?;
                }
                info!("Using PostgreSQL catalog");
                Self::with_backends(
                    registry,
                    catalog.clone(),
                    catalog.clone(),
                    catalog,
                    config.temporal_rule,
                )
            }
            StorageBackend::Memory => {
                let catalog = Arc::new(MemoryCatalog::new());
                info!("Using in-memory catalog");
                Self::with_backends(
                    registry,
                    catalog.clone(),
                    catalog.clone(),
                    catalog,
                    config.temporal_rule,
                )
            }
        };

        Ok(state.with_metrics(metrics_handle))
    }

    /// Assemble state around explicit storage implementations.
    pub fn with_backends(
        registry: Arc<FileTypeRegistry>,
        source: Arc<dyn RasterSource>,
        sink: Arc<dyn FeatureSink>,
        workspaces: Arc<dyn WorkspaceSource>,
        rule: TemporalRule,
    ) -> Self {
        Self {
            registry,
            aggregator: FeatureAggregator::default(),
            matcher: RasterMatcher::new(source.clone(), rule),
            sink,
            source,
            workspaces,
            metrics_handle: None,
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics_handle = handle;
        self
    }

    /// State backed by a single in-memory catalog.
    pub fn in_memory(catalog: Arc<MemoryCatalog>, rule: TemporalRule) -> Self {
        Self::with_backends(
            Arc::new(FileTypeRegistry::standard()),
            catalog.clone(),
            catalog.clone(),
            catalog,
            rule,
        )
    }
}
