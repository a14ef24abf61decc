//! Spatial + temporal raster lookup.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use geo_common::{CornerSet, GeoResult, RasterRecord, SpatialQuery};

use crate::source::{RasterSource, TemporalRule};

/// Finds persisted rasters whose footprint intersects a query box.
#[derive(Clone)]
pub struct RasterMatcher {
    source: Arc<dyn RasterSource>,
    rule: TemporalRule,
}

impl RasterMatcher {
    pub fn new(source: Arc<dyn RasterSource>, rule: TemporalRule) -> Self {
        Self { source, rule }
    }

    pub fn rule(&self) -> TemporalRule {
        self.rule
    }

    /// Matching rasters ordered by id. An empty result is not an error.
    #[instrument(skip(self, query), fields(as_of = %query.as_of))]
    pub async fn find_intersecting(&self, query: &SpatialQuery) -> GeoResult<Vec<RasterRecord>> {
        let start = Instant::now();
        let mut matches = self
            .source
            .intersecting(&query.bbox, query.as_of, self.rule)
            .await?;
        matches.sort_by_key(|r| r.id);

        info!(
            matches = matches.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Raster query complete"
        );
        Ok(matches)
    }

    /// Validate raw request parts, then query.
    ///
    /// Missing corners or date fail with `MissingParameter` before storage
    /// is touched.
    pub async fn find_from_parts(
        &self,
        corners: CornerSet,
        as_of: Option<DateTime<Utc>>,
    ) -> GeoResult<Vec<RasterRecord>> {
        let query = SpatialQuery::from_parts(corners, as_of)?;
        self.find_intersecting(&query).await
    }
}
