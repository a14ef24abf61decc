//! Storage abstractions for the geo services.
//!
//! Provides:
//! - The file-type registry mapping file kinds to tables
//! - PostgreSQL/PostGIS catalog for raster metadata and uploaded features
//! - Workspace file listings through the registry projections
//! - An in-memory catalog with the same traits
//! - The raster matcher built on top of either

pub mod catalog;
pub mod file_types;
pub mod matcher;
pub mod memory;
pub mod source;

pub use catalog::{raster_query_sql, workspace_files_sql, Catalog, DEFAULT_SRID};
pub use file_types::{FileTypeRegistry, FileTypeSpec};
pub use matcher::RasterMatcher;
pub use memory::MemoryCatalog;
pub use source::{
    FeatureSink, Owner, RasterSource, SavedBundle, StoredFeature, StoredIndexEntry, TemporalRule,
    WorkspaceFiles, WorkspaceSource,
};
