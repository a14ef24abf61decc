//! Error types shared by the ingestion and query services.

use thiserror::Error;

/// Result type alias using GeoError.
pub type GeoResult<T> = Result<T, GeoError>;

/// Primary error type for ingestion and raster matching.
#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    // === Request Errors ===
    #[error("Invalid file type: {file}")]
    InvalidFileType { file: String },

    #[error("Missing required parameter: {}", .0.join(", "))]
    MissingParameter(Vec<String>),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Data Errors ===
    #[error("Failed to parse '{file}': {reason}")]
    ParseError { file: String, reason: String },

    // === Storage Errors ===
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl GeoError {
    /// Shorthand for a single missing field.
    pub fn missing(field: impl Into<String>) -> Self {
        GeoError::MissingParameter(vec![field.into()])
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            GeoError::InvalidFileType { .. } => "InvalidFileType",
            GeoError::MissingParameter(_) => "MissingParameter",
            GeoError::InvalidParameter { .. } => "InvalidParameterValue",
            GeoError::ParseError { .. } => "ParseError",
            GeoError::StorageFailure(_) => "StorageFailure",
            GeoError::Internal(_) => "NoApplicableCode",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            GeoError::InvalidFileType { .. }
            | GeoError::MissingParameter(_)
            | GeoError::InvalidParameter { .. } => 400,

            GeoError::ParseError { .. } => 422,

            _ => 500,
        }
    }

    /// Whether the message may be shown to an external caller.
    ///
    /// Storage and internal failures are logged server-side only.
    pub fn is_client_error(&self) -> bool {
        self.http_status_code() < 500
    }
}

impl From<std::io::Error> for GeoError {
    fn from(err: std::io::Error) -> Self {
        GeoError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for GeoError {
    fn from(err: serde_json::Error) -> Self {
        GeoError::Internal(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_lists_fields() {
        let err = GeoError::MissingParameter(vec!["southEast".into(), "date".into()]);
        assert_eq!(err.to_string(), "Missing required parameter: southEast, date");
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_storage_failure_is_server_error() {
        let err = GeoError::StorageFailure("connection refused".into());
        assert_eq!(err.http_status_code(), 500);
        assert!(!err.is_client_error());
        assert_eq!(err.error_code(), "StorageFailure");
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = GeoError::ParseError {
            file: "roads.shp".into(),
            reason: "truncated".into(),
        };
        assert!(err.to_string().contains("roads.shp"));
        assert_eq!(err.http_status_code(), 422);
    }
}
