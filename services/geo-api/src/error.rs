//! JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use geo_common::GeoError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

/// Wraps a [`GeoError`] for use as a handler error.
///
/// Server-side failures are logged with full detail and answered with a
/// generic message.
#[derive(Debug)]
pub struct ApiError(pub GeoError);

impl From<GeoError> for ApiError {
    fn from(e: GeoError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_client_error() {
            warn!(code = self.0.error_code(), error = %self.0, "Request rejected");
            self.0.to_string()
        } else {
            error!(code = self.0.error_code(), error = %self.0, "Request failed");
            "Internal server error".to_string()
        };

        let body = ErrorBody {
            error: message,
            code: self.0.error_code(),
        };
        (status, Json(body)).into_response()
    }
}
