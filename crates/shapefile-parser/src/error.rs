//! Error types for shapefile decoding.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ShapefileError {
    #[error("Invalid shapefile format: {0}")]
    InvalidFormat(String),

    #[error("Truncated data: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Unsupported shape type: {0}")]
    UnsupportedShapeType(i32),

    #[error("Invalid record {record}: {reason}")]
    InvalidRecord { record: u32, reason: String },
}

pub type Result<T> = std::result::Result<T, ShapefileError>;
