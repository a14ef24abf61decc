//! `GET /api/shapefile`, `/api/shapeindex`, `/api/raster`: files linked to a workspace.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::{Deserialize, Serialize};

use geo_common::{FileKind, GeoError};
use storage::WorkspaceFiles;

use crate::error::ApiError;
use crate::metrics::record_workspace_listing;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WorkspaceParams {
    #[serde(alias = "workspaceId")]
    pub workspace_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WorkspaceFilesResponse {
    pub result: WorkspaceFiles,
}

pub async fn shapefile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<WorkspaceParams>,
) -> Result<Json<WorkspaceFilesResponse>, ApiError> {
    list_files(&state, params, FileKind::ShapeGeometry).await
}

pub async fn shapeindex_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<WorkspaceParams>,
) -> Result<Json<WorkspaceFilesResponse>, ApiError> {
    list_files(&state, params, FileKind::ShapeIndex).await
}

pub async fn raster_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<WorkspaceParams>,
) -> Result<Json<WorkspaceFilesResponse>, ApiError> {
    list_files(&state, params, FileKind::Raster).await
}

async fn list_files(
    state: &AppState,
    params: WorkspaceParams,
    kind: FileKind,
) -> Result<Json<WorkspaceFilesResponse>, ApiError> {
    let workspace_id = params
        .workspace_id
        .as_deref()
        .map(str::trim)
        .filter(|ws| !ws.is_empty())
        .ok_or_else(|| GeoError::missing("workspace_id"))?;

    let result = state.workspaces.files_by_workspace(workspace_id, kind).await;
    record_workspace_listing(
        kind.code(),
        result.is_ok(),
        result.as_ref().map(WorkspaceFiles::len).unwrap_or(0),
    );

    Ok(Json(WorkspaceFilesResponse { result: result? }))
}
