//! Common types and utilities shared across the geo services.

pub mod bbox;
pub mod error;
pub mod feature;
pub mod file_kind;
pub mod time;

pub use bbox::{BoundingBox, CornerSet, LatLng, QueryBox, SpatialQuery};
pub use error::{GeoError, GeoResult};
pub use feature::{AllFeatures, Feature, Geometry, Position, RasterRecord, ShapeIndexEntry};
pub use file_kind::FileKind;
pub use time::parse_iso8601;
