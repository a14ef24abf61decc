//! Decoding of uploaded shapefile members into features and index entries.

use tracing::debug;

use geo_common::{Feature, GeoError, GeoResult, ShapeIndexEntry};
use shapefile_parser::{read_index, read_shapes, IndexRecord, ShapeRecord, ShapefileError};

use crate::classifier::UploadedFile;

/// Decodes one whole file per call on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapefileReader;

impl ShapefileReader {
    pub fn new() -> Self {
        Self
    }

    /// All features of a `.shp` file, in record order.
    pub async fn read_geometry(&self, file: &UploadedFile) -> GeoResult<Vec<Feature>> {
        let data = file.data.clone();
        let records = tokio::task::spawn_blocking(move || read_shapes(&data))
            .await
            .map_err(|e| GeoError::Internal(format!("decoder task failed: {}", e)))?
            .map_err(|e| parse_error(&file.name, e))?;

        debug!(file = %file.name, features = records.len(), "Decoded geometry file");
        Ok(records.into_iter().map(to_feature).collect())
    }

    /// All entries of a `.shx` file, in record order.
    pub async fn read_index(&self, file: &UploadedFile) -> GeoResult<Vec<ShapeIndexEntry>> {
        let data = file.data.clone();
        let records = tokio::task::spawn_blocking(move || read_index(&data))
            .await
            .map_err(|e| GeoError::Internal(format!("decoder task failed: {}", e)))?
            .map_err(|e| parse_error(&file.name, e))?;

        debug!(file = %file.name, entries = records.len(), "Decoded index file");
        Ok(records.into_iter().map(to_index_entry).collect())
    }
}

fn parse_error(file: &str, e: ShapefileError) -> GeoError {
    GeoError::ParseError {
        file: file.to_string(),
        reason: e.to_string(),
    }
}

fn to_feature(record: ShapeRecord) -> Feature {
    Feature::new(record.geometry)
}

fn to_index_entry(record: IndexRecord) -> ShapeIndexEntry {
    ShapeIndexEntry {
        feature_id: record.record_number,
        geom_offset: record.offset_bytes(),
        content_length: record.content_length_bytes(),
        user_id: None,
        is_global: false,
    }
}
