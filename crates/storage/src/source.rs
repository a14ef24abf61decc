//! Storage collaborator traits.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use geo_common::time::same_utc_day;
use geo_common::{
    AllFeatures, FileKind, GeoError, GeoResult, Geometry, QueryBox, RasterRecord,
};

/// How a raster's `upload_date` is compared with the query date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemporalRule {
    /// Raster uploaded at or before the query instant.
    #[default]
    OnOrBefore,
    /// Raster uploaded on the same UTC calendar day.
    SameDay,
}

impl TemporalRule {
    /// Records without an upload date never match.
    pub fn matches(&self, upload_date: Option<&DateTime<Utc>>, as_of: &DateTime<Utc>) -> bool {
        match (self, upload_date) {
            (_, None) => false,
            (TemporalRule::OnOrBefore, Some(uploaded)) => uploaded <= as_of,
            (TemporalRule::SameDay, Some(uploaded)) => same_utc_day(uploaded, as_of),
        }
    }

    /// SQL predicate over `upload_date` for the given bind placeholder.
    pub fn sql_predicate(&self, placeholder: &str) -> String {
        match self {
            TemporalRule::OnOrBefore => format!("upload_date <= {}::timestamptz", placeholder),
            TemporalRule::SameDay => format!(
                "(upload_date AT TIME ZONE 'UTC')::date = ({}::timestamptz AT TIME ZONE 'UTC')::date",
                placeholder
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemporalRule::OnOrBefore => "on-or-before",
            TemporalRule::SameDay => "same-day",
        }
    }
}

impl FromStr for TemporalRule {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on-or-before" => Ok(TemporalRule::OnOrBefore),
            "same-day" => Ok(TemporalRule::SameDay),
            other => Err(GeoError::InvalidParameter {
                param: "temporal_rule".to_string(),
                message: format!("unknown rule '{}'", other),
            }),
        }
    }
}

/// Read side: persisted raster metadata queried by footprint and date.
#[async_trait]
pub trait RasterSource: Send + Sync {
    /// Rasters whose footprint intersects `bbox` and whose upload date
    /// satisfies `rule` against `as_of`.
    async fn intersecting(
        &self,
        bbox: &QueryBox,
        as_of: DateTime<Utc>,
        rule: TemporalRule,
    ) -> GeoResult<Vec<RasterRecord>>;

    /// Connectivity check.
    async fn ping(&self) -> GeoResult<()> {
        Ok(())
    }
}

/// Ownership stamped on persisted upload rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub user_id: i64,
    pub is_global: bool,
}

/// Row ids created by [`FeatureSink::save_bundle`], in bundle order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedBundle {
    pub workspace_id: String,
    pub shp_ids: Vec<i64>,
    pub shx_ids: Vec<i64>,
}

/// Write side: persists an aggregated upload under its workspace.
#[async_trait]
pub trait FeatureSink: Send + Sync {
    /// Persist every feature and index entry; all or nothing.
    async fn save_bundle(&self, bundle: &AllFeatures, owner: Owner) -> GeoResult<SavedBundle>;
}

/// A persisted feature row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFeature {
    pub id: i64,
    pub name: Option<String>,
    pub geometry: Option<Geometry>,
    pub properties: Map<String, Value>,
    pub user_id: Option<i64>,
    pub is_global: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted `.shx` entry row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredIndexEntry {
    pub id: i64,
    pub feature_id: i32,
    pub geom_offset: i64,
    pub content_length: i64,
    pub user_id: Option<i64>,
    pub is_global: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rows of one file kind linked to a workspace, ordered by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WorkspaceFiles {
    Features(Vec<StoredFeature>),
    Index(Vec<StoredIndexEntry>),
    Rasters(Vec<RasterRecord>),
}

impl WorkspaceFiles {
    pub fn kind(&self) -> FileKind {
        match self {
            WorkspaceFiles::Features(_) => FileKind::ShapeGeometry,
            WorkspaceFiles::Index(_) => FileKind::ShapeIndex,
            WorkspaceFiles::Rasters(_) => FileKind::Raster,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            WorkspaceFiles::Features(rows) => rows.len(),
            WorkspaceFiles::Index(rows) => rows.len(),
            WorkspaceFiles::Rasters(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read side of the workspace link table.
#[async_trait]
pub trait WorkspaceSource: Send + Sync {
    /// Every row of `kind` associated with `workspace_id`.
    async fn files_by_workspace(&self, workspace_id: &str, kind: FileKind) -> GeoResult<WorkspaceFiles>;
}
