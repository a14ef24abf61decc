//! In-process catalog for tests and database-less deployments.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geo::{Intersects, Polygon};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use geo_common::{AllFeatures, BoundingBox, FileKind, GeoError, GeoResult, QueryBox, RasterRecord};

use crate::catalog::DEFAULT_SRID;
use crate::source::{
    FeatureSink, Owner, RasterSource, SavedBundle, StoredFeature, StoredIndexEntry, TemporalRule,
    WorkspaceFiles, WorkspaceSource,
};

struct StoredRaster {
    record: RasterRecord,
    envelope: BoundingBox,
    footprint: Polygon<f64>,
}

struct StoredBundle {
    bundle: AllFeatures,
    owner: Owner,
    saved: SavedBundle,
    created_at: DateTime<Utc>,
}

/// Catalog kept entirely in memory.
///
/// Footprints are EPSG:4326 polygons. Candidates are filtered by envelope
/// first, then tested exactly with `geo`.
#[derive(Default)]
pub struct MemoryCatalog {
    rasters: RwLock<Vec<StoredRaster>>,
    bundles: Mutex<Vec<StoredBundle>>,
    raster_links: Mutex<Vec<(String, i64)>>,
    next_id: AtomicI64,
    queries: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raster covering `footprint`, returning the stored record.
    pub async fn insert_raster(
        &self,
        file_name: &str,
        footprint: QueryBox,
        upload_date: Option<DateTime<Utc>>,
    ) -> RasterRecord {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let record = RasterRecord {
            id,
            file_name: file_name.to_string(),
            file_path: format!("/rasters/{}", file_name),
            file_size: 0,
            description: None,
            user_id: None,
            srid: DEFAULT_SRID,
            geom: Some(footprint.to_geojson()),
            raster_type: None,
            is_global: false,
            upload_date,
            created_at: now,
            updated_at: now,
        };

        self.rasters.write().await.push(StoredRaster {
            record: record.clone(),
            envelope: footprint.envelope(),
            footprint: footprint.to_polygon(),
        });
        record
    }

    /// Number of `intersecting` calls served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Make every call fail with a storage error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Associate a stored raster with a workspace.
    pub async fn link_raster(&self, workspace_id: &str, raster_id: i64) {
        self.raster_links
            .lock()
            .await
            .push((workspace_id.to_string(), raster_id));
    }

    /// Bundles persisted through [`FeatureSink::save_bundle`].
    pub async fn saved_bundles(&self) -> Vec<(AllFeatures, Owner)> {
        self.bundles
            .lock()
            .await
            .iter()
            .map(|stored| (stored.bundle.clone(), stored.owner))
            .collect()
    }

    async fn workspace_features(&self, workspace_id: &str) -> Vec<StoredFeature> {
        let bundles = self.bundles.lock().await;
        bundles
            .iter()
            .filter(|stored| stored.bundle.workspace_id == workspace_id)
            .flat_map(|stored| {
                stored
                    .bundle
                    .shp
                    .iter()
                    .zip(&stored.saved.shp_ids)
                    .map(move |(feature, &id)| StoredFeature {
                        id,
                        name: feature.name().map(str::to_string),
                        geometry: feature.geometry.clone(),
                        properties: feature.properties.clone(),
                        user_id: Some(stored.owner.user_id),
                        is_global: stored.owner.is_global,
                        created_at: stored.created_at,
                        updated_at: stored.created_at,
                    })
            })
            .collect()
    }

    async fn workspace_index(&self, workspace_id: &str) -> Vec<StoredIndexEntry> {
        let bundles = self.bundles.lock().await;
        bundles
            .iter()
            .filter(|stored| stored.bundle.workspace_id == workspace_id)
            .flat_map(|stored| {
                stored
                    .bundle
                    .shx
                    .iter()
                    .zip(&stored.saved.shx_ids)
                    .map(move |(entry, &id)| StoredIndexEntry {
                        id,
                        feature_id: entry.feature_id as i32,
                        geom_offset: entry.geom_offset as i64,
                        content_length: entry.content_length as i64,
                        user_id: Some(stored.owner.user_id),
                        is_global: stored.owner.is_global,
                        created_at: stored.created_at,
                        updated_at: stored.created_at,
                    })
            })
            .collect()
    }

    async fn workspace_rasters(&self, workspace_id: &str) -> Vec<RasterRecord> {
        let ids: Vec<i64> = self
            .raster_links
            .lock()
            .await
            .iter()
            .filter(|(ws, _)| ws == workspace_id)
            .map(|(_, id)| *id)
            .collect();
        let rasters = self.rasters.read().await;
        rasters
            .iter()
            .filter(|r| ids.contains(&r.record.id))
            .map(|r| r.record.clone())
            .collect()
    }

    fn check_available(&self) -> GeoResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GeoError::StorageFailure("catalog unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RasterSource for MemoryCatalog {
    async fn intersecting(
        &self,
        bbox: &QueryBox,
        as_of: DateTime<Utc>,
        rule: TemporalRule,
    ) -> GeoResult<Vec<RasterRecord>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let query = bbox.to_polygon();
        let query_envelope = bbox.envelope();
        let rasters = self.rasters.read().await;
        let mut matches: Vec<RasterRecord> = rasters
            .iter()
            .filter(|r| r.envelope.intersects(&query_envelope))
            .filter(|r| r.footprint.intersects(&query))
            .filter(|r| rule.matches(r.record.upload_date.as_ref(), &as_of))
            .map(|r| r.record.clone())
            .collect();
        matches.sort_by_key(|r| r.id);

        debug!(candidates = rasters.len(), matched = matches.len(), "Memory raster query");
        Ok(matches)
    }

    async fn ping(&self) -> GeoResult<()> {
        self.check_available()
    }
}

#[async_trait]
impl FeatureSink for MemoryCatalog {
    async fn save_bundle(&self, bundle: &AllFeatures, owner: Owner) -> GeoResult<SavedBundle> {
        self.check_available()?;

        let next = || self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let shp_ids = bundle.shp.iter().map(|_| next()).collect();
        let shx_ids = bundle.shx.iter().map(|_| next()).collect();

        let saved = SavedBundle {
            workspace_id: bundle.workspace_id.clone(),
            shp_ids,
            shx_ids,
        };
        self.bundles.lock().await.push(StoredBundle {
            bundle: bundle.clone(),
            owner,
            saved: saved.clone(),
            created_at: Utc::now(),
        });
        Ok(saved)
    }
}

#[async_trait]
impl WorkspaceSource for MemoryCatalog {
    async fn files_by_workspace(&self, workspace_id: &str, kind: FileKind) -> GeoResult<WorkspaceFiles> {
        self.check_available()?;

        let mut files = match kind {
            FileKind::ShapeGeometry => WorkspaceFiles::Features(self.workspace_features(workspace_id).await),
            FileKind::ShapeIndex => WorkspaceFiles::Index(self.workspace_index(workspace_id).await),
            FileKind::Raster => WorkspaceFiles::Rasters(self.workspace_rasters(workspace_id).await),
        };
        match &mut files {
            WorkspaceFiles::Features(rows) => rows.sort_by_key(|r| r.id),
            WorkspaceFiles::Index(rows) => rows.sort_by_key(|r| r.id),
            WorkspaceFiles::Rasters(rows) => rows.sort_by_key(|r| r.id),
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_common::{Feature, LatLng};

    fn square(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> QueryBox {
        QueryBox::new(
            LatLng::new(max_lat, min_lng),
            LatLng::new(max_lat, max_lng),
            LatLng::new(min_lat, min_lng),
            LatLng::new(min_lat, max_lng),
        )
    }

    #[tokio::test]
    async fn test_touching_footprints_intersect() {
        let catalog = MemoryCatalog::new();
        let now = Utc::now();
        catalog
            .insert_raster("left.tif", square(0.0, 0.0, 1.0, 1.0), Some(now))
            .await;

        let hits = catalog
            .intersecting(&square(1.0, 0.0, 2.0, 1.0), now, TemporalRule::OnOrBefore)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(catalog.query_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_catalog_fails() {
        let catalog = MemoryCatalog::new();
        catalog.set_unavailable(true);
        let err = catalog
            .intersecting(&square(0.0, 0.0, 1.0, 1.0), Utc::now(), TemporalRule::SameDay)
            .await
            .unwrap_err();
        assert!(matches!(err, GeoError::StorageFailure(_)));
        assert!(catalog.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_save_bundle_assigns_ids() {
        let catalog = MemoryCatalog::new();
        let bundle = AllFeatures::new("42", vec![Feature::new(None), Feature::new(None)], vec![]);
        let owner = Owner {
            user_id: 9,
            is_global: true,
        };

        let saved = catalog.save_bundle(&bundle, owner).await.unwrap();
        assert_eq!(saved.shp_ids, vec![1, 2]);
        assert!(saved.shx_ids.is_empty());
        assert_eq!(catalog.saved_bundles().await[0].1, owner);
    }

    #[tokio::test]
    async fn test_files_by_workspace() {
        let catalog = MemoryCatalog::new();
        let owner = Owner {
            user_id: 9,
            is_global: false,
        };
        let entry = geo_common::ShapeIndexEntry {
            feature_id: 1,
            geom_offset: 100,
            content_length: 56,
            user_id: None,
            is_global: false,
        };
        let ours = AllFeatures::new("42", vec![Feature::new(None).with_property("name", "lot")], vec![entry]);
        let theirs = AllFeatures::new("7", vec![Feature::new(None)], vec![]);
        let saved = catalog.save_bundle(&ours, owner).await.unwrap();
        catalog.save_bundle(&theirs, owner).await.unwrap();

        let raster = catalog
            .insert_raster("tile.tif", square(0.0, 0.0, 1.0, 1.0), None)
            .await;
        catalog.link_raster("42", raster.id).await;

        match catalog.files_by_workspace("42", FileKind::ShapeGeometry).await.unwrap() {
            WorkspaceFiles::Features(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].id, saved.shp_ids[0]);
                assert_eq!(rows[0].name.as_deref(), Some("lot"));
                assert_eq!(rows[0].user_id, Some(9));
            }
            other => panic!("expected features, got {other:?}"),
        }
        match catalog.files_by_workspace("42", FileKind::ShapeIndex).await.unwrap() {
            WorkspaceFiles::Index(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].geom_offset, 100);
            }
            other => panic!("expected index entries, got {other:?}"),
        }
        let rasters = catalog.files_by_workspace("42", FileKind::Raster).await.unwrap();
        assert_eq!(rasters, WorkspaceFiles::Rasters(vec![raster]));
        assert!(catalog
            .files_by_workspace("missing", FileKind::ShapeGeometry)
            .await
            .unwrap()
            .is_empty());
    }
}
