//! Shapefile parser implementation (ESRI Shapefile Technical Description).
//!
//! This crate decodes the two binary members of a shapefile set that the
//! upload pipeline accepts:
//!
//! - `.shp` geometry records into GeoJSON-shaped [`geo_common::Geometry`]
//! - `.shx` index records into offsets/lengths
//!
//! Decoding is all-or-nothing: a malformed record fails the whole file.

pub mod error;
pub mod header;
pub mod rings;
pub mod shp;
pub mod shx;

pub use error::{Result, ShapefileError};
pub use header::{parse_header, FileHeader, ShapeType};
pub use shp::{read_shapes, ShapeRecord};
pub use shx::{read_index, IndexRecord};
