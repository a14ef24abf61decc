//! `POST /api/upload`: multipart shapefile upload.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{multipart::{Field, MultipartRejection}, Extension, Multipart},
    Json,
};
use tracing::{info, warn};
use uuid::Uuid;

use geo_common::{AllFeatures, GeoError, GeoResult};
use ingestion::UploadedFile;
use storage::Owner;

use crate::error::ApiError;
use crate::metrics::record_upload;
use crate::state::AppState;

/// Parsed multipart form.
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<UploadedFile>,
    workspace_id: Option<String>,
    user_id: Option<i64>,
    is_global: bool,
}

impl UploadForm {
    fn owner(&self) -> Option<Owner> {
        self.user_id.map(|user_id| Owner {
            user_id,
            is_global: self.is_global,
        })
    }
}

pub async fn upload_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AllFeatures>, ApiError> {
    let upload_id = Uuid::new_v4();
    let start = Instant::now();

    let result = match multipart {
        Ok(multipart) => handle_upload(&state, multipart, upload_id).await,
        Err(rejection) => Err(rejection_error(rejection)),
    };

    let (files, features) = match &result {
        Ok((files, bundle)) => (*files, bundle.shp.len()),
        Err(_) => (0, 0),
    };
    record_upload(result.is_ok(), files, features, start.elapsed());

    let (_, bundle) = result?;
    Ok(Json(bundle))
}

async fn handle_upload(
    state: &AppState,
    multipart: Multipart,
    upload_id: Uuid,
) -> GeoResult<(usize, AllFeatures)> {
    let form = read_form(multipart).await?;
    let owner = form.owner();
    let file_count = form.files.len();
    let workspace_id = form.workspace_id.unwrap_or_default();

    info!(%upload_id, workspace_id = %workspace_id, files = file_count, "Upload received");

    let mut bundle = state.aggregator.ingest(&workspace_id, form.files).await?;

    if let Some(owner) = owner {
        for entry in &mut bundle.shx {
            entry.user_id = Some(owner.user_id);
            entry.is_global = owner.is_global;
        }
        let saved = state.sink.save_bundle(&bundle, owner).await?;
        info!(
            %upload_id,
            features = saved.shp_ids.len(),
            index_entries = saved.shx_ids.len(),
            "Upload persisted"
        );
    }

    Ok((file_count, bundle))
}

async fn read_form(mut multipart: Multipart) -> GeoResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" | "files[]" | "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                form.files.push(UploadedFile::new(file_name, data));
            }
            "workspace_id" | "workspaceId" => {
                form.workspace_id = Some(text(field).await?);
            }
            "user_id" | "userId" => {
                let value = text(field).await?;
                let user_id = value.trim().parse().map_err(|_| GeoError::InvalidParameter {
                    param: "user_id".to_string(),
                    message: format!("'{}' is not an integer", value),
                })?;
                form.user_id = Some(user_id);
            }
            "is_global" | "isGlobal" => {
                form.is_global = parse_flag(&text(field).await?)?;
            }
            other => {
                warn!(field = other, "Ignoring unknown upload field");
            }
        }
    }

    Ok(form)
}

async fn text(field: Field<'_>) -> GeoResult<String> {
    field.text().await.map_err(multipart_error)
}

fn parse_flag(value: &str) -> GeoResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(GeoError::InvalidParameter {
            param: "is_global".to_string(),
            message: format!("'{}' is not a boolean", other),
        }),
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> GeoError {
    GeoError::InvalidParameter {
        param: "files".to_string(),
        message: e.to_string(),
    }
}

fn rejection_error(rejection: MultipartRejection) -> GeoError {
    GeoError::InvalidParameter {
        param: "body".to_string(),
        message: rejection.body_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE").unwrap(), true);
        assert_eq!(parse_flag("0").unwrap(), false);
        assert_eq!(parse_flag("").unwrap(), false);
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_owner_requires_user_id() {
        let mut form = UploadForm {
            is_global: true,
            ..Default::default()
        };
        assert_eq!(form.owner(), None);

        form.user_id = Some(5);
        assert_eq!(
            form.owner(),
            Some(Owner {
                user_id: 5,
                is_global: true
            })
        );
    }
}
