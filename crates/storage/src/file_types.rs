//! Static mapping from file kind to storage table and column projection.

use serde::Serialize;

use geo_common::FileKind;

/// Table and projection backing one file kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTypeSpec {
    pub kind: FileKind,
    /// Value stored in `GPG_WORKSPACE_FILES.filetype_id`.
    pub table_id: i32,
    /// Quoted table name, ready to splice into SQL.
    pub table_name: &'static str,
    /// Projected columns; may contain PostGIS expressions with aliases.
    pub columns: &'static [&'static str],
}

impl FileTypeSpec {
    /// Comma-separated projection for a `SELECT`.
    pub fn select_list(&self) -> String {
        self.columns.join(", ")
    }
}

const SHAPEFILE_COLUMNS: &[&str] = &[
    "id",
    "name",
    "ST_AsGeoJSON(geometry) AS geometry",
    "properties::text AS properties",
    "user_id",
    "is_global",
    "created_at",
    "updated_at",
];

const SHAPEINDEX_COLUMNS: &[&str] = &[
    "id",
    "feature_id",
    "geom_offset",
    "content_length",
    "user_id",
    "is_global",
    "created_at",
    "updated_at",
];

const RASTER_COLUMNS: &[&str] = &[
    "id",
    "file_name",
    "file_path",
    "file_size",
    "description",
    "user_id",
    "ST_SRID(geom) AS srid",
    "ST_AsGeoJSON(geom) AS geom",
    "raster_type",
    "is_global",
    "upload_date",
    "created_at",
    "updated_at",
];

/// Immutable file-type registry.
///
/// Built once at startup and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct FileTypeRegistry {
    specs: [FileTypeSpec; 3],
}

impl FileTypeRegistry {
    pub fn standard() -> Self {
        Self {
            specs: [
                FileTypeSpec {
                    kind: FileKind::ShapeGeometry,
                    table_id: 1,
                    table_name: "\"GPG_SHAPEFILE\"",
                    columns: SHAPEFILE_COLUMNS,
                },
                FileTypeSpec {
                    kind: FileKind::ShapeIndex,
                    table_id: 2,
                    table_name: "\"GPG_SHAPEINDEX\"",
                    columns: SHAPEINDEX_COLUMNS,
                },
                FileTypeSpec {
                    kind: FileKind::Raster,
                    table_id: 3,
                    table_name: "\"GPG_RASTERS\"",
                    columns: RASTER_COLUMNS,
                },
            ],
        }
    }

    pub fn for_kind(&self, kind: FileKind) -> &FileTypeSpec {
        match kind {
            FileKind::ShapeGeometry => &self.specs[0],
            FileKind::ShapeIndex => &self.specs[1],
            FileKind::Raster => &self.specs[2],
        }
    }

    /// Lookup by short code (`shp`, `shx`, `tif`).
    pub fn for_code(&self, code: &str) -> Option<&FileTypeSpec> {
        FileKind::from_code(code).map(|kind| self.for_kind(kind))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileTypeSpec> {
        self.specs.iter()
    }
}

impl Default for FileTypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_raster_projection() {
        let registry = FileTypeRegistry::standard();
        let tif = registry.for_code("tif").unwrap();
        assert_eq!(tif.table_id, 3);
        assert_eq!(tif.table_name, "\"GPG_RASTERS\"");
        assert_eq!(tif.columns.len(), 13);
        assert!(tif.select_list().contains("ST_AsGeoJSON(geom) AS geom"));
    }

    #[test]
    fn test_codes_map_to_kinds() {
        let registry = FileTypeRegistry::standard();
        for spec in registry.iter() {
            assert_eq!(registry.for_code(spec.kind.code()), Some(spec));
        }
        assert!(registry.for_code("dbf").is_none());
    }

    #[test]
    fn test_table_ids_are_distinct() {
        let registry = FileTypeRegistry::standard();
        let ids: BTreeSet<i32> = registry.iter().map(|s| s.table_id).collect();
        assert_eq!(ids.len(), registry.iter().count());
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
