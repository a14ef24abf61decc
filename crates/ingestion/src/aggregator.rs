//! Merges decoded shapefile members into one workspace bundle.

use std::time::Instant;

use tracing::{info, warn};

use geo_common::{AllFeatures, GeoError, GeoResult};

use crate::classifier::{classify, UploadedFile};
use crate::reader::ShapefileReader;

/// Builds an [`AllFeatures`] bundle from classified upload files.
#[derive(Debug, Clone, Default)]
pub struct FeatureAggregator {
    reader: ShapefileReader,
}

impl FeatureAggregator {
    pub fn new(reader: ShapefileReader) -> Self {
        Self { reader }
    }

    /// Decode `shp_files` then `shx_files`, one at a time in input order.
    ///
    /// The first file that fails aborts the call; nothing decoded before it
    /// is returned. Rasters are not decoded here, so `tif` is always empty.
    pub async fn aggregate(
        &self,
        workspace_id: &str,
        shp_files: &[UploadedFile],
        shx_files: &[UploadedFile],
    ) -> GeoResult<AllFeatures> {
        let workspace_id = workspace_id.trim();
        if workspace_id.is_empty() {
            return Err(GeoError::missing("workspaceId"));
        }

        let start = Instant::now();
        let mut shp = Vec::new();
        for file in shp_files {
            shp.extend(self.reader.read_geometry(file).await?);
        }

        let mut shx = Vec::new();
        for file in shx_files {
            shx.extend(self.reader.read_index(file).await?);
        }

        if !shp_files.is_empty() && !shx_files.is_empty() && shp.len() != shx.len() {
            warn!(
                workspace_id,
                features = shp.len(),
                index_entries = shx.len(),
                "Geometry and index record counts differ"
            );
        }

        info!(
            workspace_id,
            shp_files = shp_files.len(),
            shx_files = shx_files.len(),
            features = shp.len(),
            index_entries = shx.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Aggregated upload"
        );

        Ok(AllFeatures::new(workspace_id, shp, shx))
    }

    /// Classify a raw selection and aggregate its vector members.
    ///
    /// Raster files pass classification but are ignored.
    pub async fn ingest(
        &self,
        workspace_id: &str,
        selection: Vec<UploadedFile>,
    ) -> GeoResult<AllFeatures> {
        let classified = classify(selection)?;
        if !classified.tif.is_empty() {
            info!(
                rasters = classified.tif.len(),
                "Skipping raster files; they are uploaded separately"
            );
        }
        self.aggregate(workspace_id, &classified.shp, &classified.shx)
            .await
    }
}
