//! `GET /api/filetype`: file-type registry lookup.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use storage::FileTypeSpec;

use crate::error::ErrorBody;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FileTypeParams {
    pub code: Option<String>,
}

/// With `?code=`, the matching entry or 404; without, every entry.
pub async fn filetype_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<FileTypeParams>,
) -> Response {
    let Some(code) = params.code else {
        let all: Vec<&FileTypeSpec> = state.registry.iter().collect();
        return Json(all).into_response();
    };

    let code = code.trim().to_ascii_lowercase();
    match state.registry.for_code(&code) {
        Some(spec) => Json(spec).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: format!("Unknown file type code '{}'", code),
                code: "UnknownFileType",
            }),
        )
            .into_response(),
    }
}
