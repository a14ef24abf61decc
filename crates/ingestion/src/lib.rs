//! Upload ingestion library.
//!
//! Turns a multipart file selection into a workspace-tagged feature bundle:
//!
//! - classification by extension (all-or-nothing)
//! - `.shp`/`.shx` decoding on the blocking pool
//! - sequential aggregation into [`geo_common::AllFeatures`]
//!
//! Rasters are classified but never decoded here.

pub mod aggregator;
pub mod classifier;
pub mod reader;

pub use aggregator::FeatureAggregator;
pub use classifier::{classify, ClassificationSummary, ClassifiedFiles, UploadedFile};
pub use reader::ShapefileReader;
