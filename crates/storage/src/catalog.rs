//! Metadata catalog using PostgreSQL with PostGIS.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, info, instrument};

use geo_common::{AllFeatures, FileKind, GeoError, GeoResult, QueryBox, RasterRecord};

use crate::file_types::FileTypeRegistry;
use crate::source::{
    FeatureSink, Owner, RasterSource, SavedBundle, StoredFeature, StoredIndexEntry, TemporalRule,
    WorkspaceFiles, WorkspaceSource,
};

/// SRID assumed for footprints stored without one.
pub const DEFAULT_SRID: i32 = 4326;

/// Database connection pool and catalog operations.
pub struct Catalog {
    pool: PgPool,
    registry: Arc<FileTypeRegistry>,
}

impl Catalog {
    /// Create a new catalog connection from database URL.
    pub async fn connect(database_url: &str, registry: Arc<FileTypeRegistry>) -> GeoResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| db_error("Connection failed", e))?;

        Ok(Self { pool, registry })
    }

    /// Wrap an existing pool.
    pub fn with_pool(pool: PgPool, registry: Arc<FileTypeRegistry>) -> Self {
        Self { pool, registry }
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> GeoResult<()> {
        for statement in SCHEMA_SQL.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| db_error("Migration failed", e))?;
            }
        }

        info!("Catalog schema is up to date");
        Ok(())
    }

    async fn insert_features(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: &AllFeatures,
        owner: Owner,
    ) -> GeoResult<Vec<i64>> {
        let table = self.registry.for_kind(FileKind::ShapeGeometry).table_name;
        let sql = format!(
            "INSERT INTO {} (name, geometry, properties, user_id, is_global) \
             VALUES ($1, ST_SetSRID(ST_GeomFromGeoJSON($2::text), 4326), $3::text::jsonb, $4, $5) \
             RETURNING id",
            table
        );

        let mut ids = Vec::with_capacity(bundle.shp.len());
        for feature in &bundle.shp {
            let geometry = feature
                .geometry
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            let properties = serde_json::to_string(&feature.properties)?;

            let id: i64 = sqlx::query_scalar(&sql)
                .bind(feature.name())
                .bind(geometry)
                .bind(properties)
                .bind(owner.user_id)
                .bind(owner.is_global)
                .fetch_one(&mut **tx)
                .await
                .map_err(|e| db_error("Feature insert failed", e))?;
            ids.push(id);
        }
        Ok(ids)
    }

    async fn insert_index(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        bundle: &AllFeatures,
        owner: Owner,
    ) -> GeoResult<Vec<i64>> {
        let table = self.registry.for_kind(FileKind::ShapeIndex).table_name;
        let sql = format!(
            "INSERT INTO {} (feature_id, geom_offset, content_length, user_id, is_global) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
            table
        );

        let mut ids = Vec::with_capacity(bundle.shx.len());
        for entry in &bundle.shx {
            let id: i64 = sqlx::query_scalar(&sql)
                .bind(entry.feature_id as i32)
                .bind(entry.geom_offset as i64)
                .bind(entry.content_length as i64)
                .bind(owner.user_id)
                .bind(owner.is_global)
                .fetch_one(&mut **tx)
                .await
                .map_err(|e| db_error("Index insert failed", e))?;
            ids.push(id);
        }
        Ok(ids)
    }

    async fn link_workspace(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: &str,
        kind: FileKind,
        ids: &[i64],
    ) -> GeoResult<()> {
        let filetype_id = self.registry.for_kind(kind).table_id;
        for id in ids {
            sqlx::query(
                "INSERT INTO \"GPG_WORKSPACE_FILES\" (workspace_id, filetype_id, file_id) \
                 VALUES ($1, $2, $3)",
            )
            .bind(workspace_id)
            .bind(filetype_id)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| db_error("Workspace link failed", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl RasterSource for Catalog {
    #[instrument(skip(self, bbox), fields(rule = rule.as_str()))]
    async fn intersecting(
        &self,
        bbox: &QueryBox,
        as_of: DateTime<Utc>,
        rule: TemporalRule,
    ) -> GeoResult<Vec<RasterRecord>> {
        let sql = raster_query_sql(&self.registry, rule);
        let polygon = bbox.to_geojson().to_string();

        let rows = sqlx::query_as::<_, RasterRow>(&sql)
            .bind(polygon)
            .bind(as_of)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Query failed", e))?;

        debug!(rows = rows.len(), "Raster footprint query complete");
        rows.into_iter().map(RasterRecord::try_from).collect()
    }

    async fn ping(&self) -> GeoResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Ping failed", e))?;
        Ok(())
    }
}

#[async_trait]
impl FeatureSink for Catalog {
    #[instrument(skip(self, bundle), fields(workspace_id = %bundle.workspace_id))]
    async fn save_bundle(&self, bundle: &AllFeatures, owner: Owner) -> GeoResult<SavedBundle> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Transaction start failed", e))?;

        let shp_ids = self.insert_features(&mut tx, bundle, owner).await?;
        let shx_ids = self.insert_index(&mut tx, bundle, owner).await?;
        self.link_workspace(&mut tx, &bundle.workspace_id, FileKind::ShapeGeometry, &shp_ids)
            .await?;
        self.link_workspace(&mut tx, &bundle.workspace_id, FileKind::ShapeIndex, &shx_ids)
            .await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Transaction commit failed", e))?;

        info!(
            features = shp_ids.len(),
            index_entries = shx_ids.len(),
            "Saved upload bundle"
        );

        Ok(SavedBundle {
            workspace_id: bundle.workspace_id.clone(),
            shp_ids,
            shx_ids,
        })
    }
}

#[async_trait]
impl WorkspaceSource for Catalog {
    #[instrument(skip(self), fields(kind = kind.code()))]
    async fn files_by_workspace(&self, workspace_id: &str, kind: FileKind) -> GeoResult<WorkspaceFiles> {
        let sql = workspace_files_sql(&self.registry, kind);
        let filetype_id = self.registry.for_kind(kind).table_id;

        let files = match kind {
            FileKind::ShapeGeometry => {
                let rows = sqlx::query_as::<_, FeatureRow>(&sql)
                    .bind(workspace_id)
                    .bind(filetype_id)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| db_error("Workspace features query failed", e))?;
                WorkspaceFiles::Features(
                    rows.into_iter()
                        .map(StoredFeature::try_from)
                        .collect::<GeoResult<_>>()?,
                )
            }
            FileKind::ShapeIndex => {
                let rows = sqlx::query_as::<_, IndexRow>(&sql)
                    .bind(workspace_id)
                    .bind(filetype_id)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| db_error("Workspace index query failed", e))?;
                WorkspaceFiles::Index(rows.into_iter().map(StoredIndexEntry::from).collect())
            }
            FileKind::Raster => {
                let rows = sqlx::query_as::<_, RasterRow>(&sql)
                    .bind(workspace_id)
                    .bind(filetype_id)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| db_error("Workspace raster query failed", e))?;
                WorkspaceFiles::Rasters(
                    rows.into_iter()
                        .map(RasterRecord::try_from)
                        .collect::<GeoResult<_>>()?,
                )
            }
        };

        debug!(rows = files.len(), "Workspace files loaded");
        Ok(files)
    }
}

/// Footprint SRID with unknown (0) read as EPSG:4326.
const FOOTPRINT_SRID: &str = "COALESCE(NULLIF(ST_SRID(geom), 0), 4326)";

/// SQL used by [`RasterSource::intersecting`].
///
/// `$1` is the query polygon as GeoJSON in EPSG:4326, `$2` the query
/// instant. The polygon is transformed into each row's own SRID; rows
/// stored without an SRID are treated as EPSG:4326.
pub fn raster_query_sql(registry: &FileTypeRegistry, rule: TemporalRule) -> String {
    let spec = registry.for_kind(FileKind::Raster);
    format!(
        "SELECT {select} FROM {table} \
         WHERE ST_Intersects(\
         ST_SetSRID(geom, {srid}), \
         ST_Transform(ST_SetSRID(ST_GeomFromGeoJSON($1::text), 4326), {srid})) \
         AND {temporal} \
         ORDER BY id",
        select = spec.select_list(),
        table = spec.table_name,
        srid = FOOTPRINT_SRID,
        temporal = rule.sql_predicate("$2"),
    )
}

/// SQL used by [`WorkspaceSource::files_by_workspace`].
///
/// `$1` is the workspace id, `$2` the registry table id of `kind`.
pub fn workspace_files_sql(registry: &FileTypeRegistry, kind: FileKind) -> String {
    let spec = registry.for_kind(kind);
    format!(
        "SELECT {} FROM {} \
         WHERE id IN (SELECT file_id FROM \"GPG_WORKSPACE_FILES\" WHERE workspace_id = $1 AND filetype_id = $2) \
         ORDER BY id",
        spec.select_list(),
        spec.table_name,
    )
}

fn db_error(context: &str, e: sqlx::Error) -> GeoError {
    GeoError::StorageFailure(format!("{}: {}", context, e))
}

/// Internal row type for raster queries.
#[derive(FromRow)]
struct RasterRow {
    id: i64,
    file_name: String,
    file_path: String,
    file_size: i64,
    description: Option<String>,
    user_id: Option<i64>,
    srid: Option<i32>,
    geom: Option<String>,
    raster_type: Option<String>,
    is_global: bool,
    upload_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RasterRow> for RasterRecord {
    type Error = GeoError;

    fn try_from(row: RasterRow) -> GeoResult<Self> {
        let geom = row
            .geom
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| {
                GeoError::StorageFailure(format!("Raster {} has invalid footprint: {}", row.id, e))
            })?;

        Ok(RasterRecord {
            id: row.id,
            file_name: row.file_name,
            file_path: row.file_path,
            file_size: row.file_size,
            description: row.description,
            user_id: row.user_id,
            srid: row.srid.filter(|s| *s > 0).unwrap_or(DEFAULT_SRID),
            geom,
            raster_type: row.raster_type,
            is_global: row.is_global,
            upload_date: row.upload_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for workspace feature listings.
#[derive(FromRow)]
struct FeatureRow {
    id: i64,
    name: Option<String>,
    geometry: Option<String>,
    properties: String,
    user_id: Option<i64>,
    is_global: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FeatureRow> for StoredFeature {
    type Error = GeoError;

    fn try_from(row: FeatureRow) -> GeoResult<Self> {
        let invalid = |what: &str, e: serde_json::Error| {
            GeoError::StorageFailure(format!("Feature {} has invalid {}: {}", row.id, what, e))
        };
        let geometry = row
            .geometry
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| invalid("geometry", e))?;
        let properties = serde_json::from_str(&row.properties).map_err(|e| invalid("properties", e))?;

        Ok(StoredFeature {
            id: row.id,
            name: row.name,
            geometry,
            properties,
            user_id: row.user_id,
            is_global: row.is_global,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for workspace index listings.
#[derive(FromRow)]
struct IndexRow {
    id: i64,
    feature_id: i32,
    geom_offset: i64,
    content_length: i64,
    user_id: Option<i64>,
    is_global: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<IndexRow> for StoredIndexEntry {
    fn from(row: IndexRow) -> Self {
        Self {
            id: row.id,
            feature_id: row.feature_id,
            geom_offset: row.geom_offset,
            content_length: row.content_length,
            user_id: row.user_id,
            is_global: row.is_global,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database schema SQL.
const SCHEMA_SQL: &str = r#"
CREATE EXTENSION IF NOT EXISTS postgis;

CREATE TABLE IF NOT EXISTS "GPG_SHAPEFILE" (
    id BIGSERIAL PRIMARY KEY,
    name TEXT,
    geometry GEOMETRY(Geometry, 4326),
    properties JSONB NOT NULL DEFAULT '{}'::jsonb,
    user_id BIGINT,
    is_global BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS "GPG_SHAPEINDEX" (
    id BIGSERIAL PRIMARY KEY,
    feature_id INTEGER NOT NULL,
    geom_offset BIGINT NOT NULL,
    content_length BIGINT NOT NULL,
    user_id BIGINT,
    is_global BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS "GPG_RASTERS" (
    id BIGSERIAL PRIMARY KEY,
    file_name TEXT NOT NULL,
    file_path TEXT NOT NULL,
    file_size BIGINT NOT NULL DEFAULT 0,
    description TEXT,
    user_id BIGINT,
    geom GEOMETRY,
    raster_type TEXT,
    is_global BOOLEAN NOT NULL DEFAULT FALSE,
    upload_date TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_rasters_geom ON "GPG_RASTERS" USING GIST (geom);
CREATE INDEX IF NOT EXISTS idx_rasters_upload_date ON "GPG_RASTERS" (upload_date);

CREATE TABLE IF NOT EXISTS "GPG_WORKSPACE_FILES" (
    id BIGSERIAL PRIMARY KEY,
    workspace_id TEXT NOT NULL,
    filetype_id INTEGER NOT NULL,
    file_id BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_workspace_files_ws ON "GPG_WORKSPACE_FILES" (workspace_id, filetype_id)
"#;
