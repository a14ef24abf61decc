//! `POST /api/raster/dinamic`: rasters intersecting a box at a date.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use geo_common::{parse_iso8601, CornerSet, GeoError, GeoResult, RasterRecord};

use crate::metrics::record_raster_query;
use crate::state::AppState;

/// One query as sent by the map client.
#[derive(Debug, Default, Deserialize)]
pub struct RasterQueryBody {
    pub date: Option<String>,
    #[serde(default)]
    pub coordinates: CornerSet,
}

/// Clients wrap the query in a one-element array; a bare object is also
/// accepted. Arrays with more than one query are rejected.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RasterQueryPayload {
    Wrapped(Vec<RasterQueryBody>),
    Bare(RasterQueryBody),
}

impl RasterQueryPayload {
    fn into_query(self) -> GeoResult<RasterQueryBody> {
        match self {
            RasterQueryPayload::Wrapped(items) if items.len() > 1 => Err(GeoError::InvalidParameter {
                param: "body".to_string(),
                message: format!("expected a single query, got {}", items.len()),
            }),
            RasterQueryPayload::Wrapped(items) => Ok(items.into_iter().next().unwrap_or_default()),
            RasterQueryPayload::Bare(body) => Ok(body),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RasterQueryResponse {
    pub result: Vec<RasterRecord>,
}

pub async fn raster_query_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let result = run_query(&state, &body).await;
    let matches = result.as_ref().map(Vec::len).unwrap_or(0);
    record_raster_query(result.is_ok(), matches, start.elapsed());

    match result {
        Ok(result) => Json(RasterQueryResponse { result }).into_response(),
        Err(e) => {
            let status = StatusCode::from_u16(e.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if e.is_client_error() {
                warn!(code = e.error_code(), error = %e, "Raster query rejected");
            } else {
                error!(code = e.error_code(), error = %e, "Raster query failed");
            }
            (status, Json(RasterQueryResponse { result: Vec::new() })).into_response()
        }
    }
}

async fn run_query(state: &AppState, body: &[u8]) -> GeoResult<Vec<RasterRecord>> {
    let payload: RasterQueryPayload =
        serde_json::from_slice(body).map_err(|e| GeoError::InvalidParameter {
            param: "body".to_string(),
            message: e.to_string(),
        })?;
    let query = payload.into_query()?;

    let as_of = query
        .date
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(parse_iso8601)
        .transpose()?;

    state.matcher.find_from_parts(query.coordinates, as_of).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shapes() {
        let wrapped: RasterQueryPayload = serde_json::from_str(
            r#"[{"date":"2024-06-15","coordinates":{"northWest":{"lat":1.0,"lng":2.0}}}]"#,
        )
        .unwrap();
        let query = wrapped.into_query().unwrap();
        assert_eq!(query.date.as_deref(), Some("2024-06-15"));
        assert!(query.coordinates.north_west.is_some());
        assert_eq!(query.coordinates.missing_fields().len(), 3);

        let bare: RasterQueryPayload = serde_json::from_str(r#"{"date":"2024-06-15"}"#).unwrap();
        assert_eq!(bare.into_query().unwrap().coordinates.missing_fields().len(), 4);

        let empty: RasterQueryPayload = serde_json::from_str("[]").unwrap();
        assert!(empty.into_query().unwrap().date.is_none());
    }

    #[test]
    fn test_multiple_queries_rejected() {
        let pair: RasterQueryPayload =
            serde_json::from_str(r#"[{"date":"2024-06-15"},{"date":"2024-06-16"}]"#).unwrap();
        assert!(matches!(
            pair.into_query(),
            Err(GeoError::InvalidParameter { ref param, .. }) if param == "body"
        ));
    }
}
