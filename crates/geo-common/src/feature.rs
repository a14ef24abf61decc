//! Vector features, index entries and raster records.
//!
//! Features serialize as GeoJSON so the bundle returned by the upload
//! endpoint can be handed to a map client unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A coordinate pair `[x, y]` (longitude, latitude for EPSG:4326).
pub type Position = [f64; 2];

/// GeoJSON geometry subset produced by shapefile decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// GeoJSON type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }
}

/// A single vector record with its attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    /// `None` for null shapes.
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Option<Geometry>) -> Self {
        Self {
            geometry,
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The `name` property, if it is a string.
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }
}

/// One `.shx` record locating a geometry inside its `.shp` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeIndexEntry {
    /// 1-based record number of the indexed feature.
    pub feature_id: u32,
    /// Byte offset of the record header in the `.shp` file.
    pub geom_offset: u64,
    /// Record content length in bytes.
    pub content_length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub is_global: bool,
}

/// Persisted raster metadata, as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterRecord {
    pub id: i64,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub description: Option<String>,
    pub user_id: Option<i64>,
    pub srid: i32,
    /// Footprint as GeoJSON.
    pub geom: Option<Value>,
    pub raster_type: Option<String>,
    pub is_global: bool,
    pub upload_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything parsed from one upload, tagged with its workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllFeatures {
    #[serde(rename = "workspaceId")]
    pub workspace_id: String,
    pub shp: Vec<Feature>,
    pub shx: Vec<ShapeIndexEntry>,
    pub tif: Vec<RasterRecord>,
}

impl AllFeatures {
    /// Bundle with vector content only; rasters are ingested out of band.
    pub fn new(workspace_id: impl Into<String>, shp: Vec<Feature>, shx: Vec<ShapeIndexEntry>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            shp,
            shx,
            tif: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shp.is_empty() && self.shx.is_empty() && self.tif.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feature_serializes_as_geojson() {
        let feature = Feature::new(Some(Geometry::Point([-79.6, -2.1]))).with_property("name", "well");
        let value = serde_json::to_value(&feature).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-79.6, -2.1] },
                "properties": { "name": "well" }
            })
        );
    }

    #[test]
    fn test_null_shape_serializes_null_geometry() {
        let value = serde_json::to_value(Feature::new(None)).unwrap();
        assert_eq!(value["geometry"], Value::Null);
    }

    #[test]
    fn test_all_features_uses_workspace_id_key() {
        let bundle = AllFeatures::new("42", vec![], vec![]);
        let value = serde_json::to_value(&bundle).unwrap();
        assert_eq!(value["workspaceId"], "42");
        assert_eq!(value["tif"], json!([]));
        assert!(bundle.is_empty());
    }
}
