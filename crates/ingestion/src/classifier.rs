//! Upload validation and partitioning by file kind.

use bytes::Bytes;
use serde::Serialize;

use geo_common::{FileKind, GeoError, GeoResult};

/// One uploaded file: original name plus raw content.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn kind(&self) -> Option<FileKind> {
        FileKind::from_file_name(&self.name)
    }
}

/// A selection split into per-kind buckets, each in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedFiles {
    pub shp: Vec<UploadedFile>,
    pub shx: Vec<UploadedFile>,
    pub tif: Vec<UploadedFile>,
}

impl ClassifiedFiles {
    pub fn len(&self) -> usize {
        self.shp.len() + self.shx.len() + self.tif.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-bucket counts, for logs and responses.
    pub fn summary(&self) -> ClassificationSummary {
        ClassificationSummary {
            shp: self.shp.len(),
            shx: self.shx.len(),
            tif: self.tif.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationSummary {
    pub shp: usize,
    pub shx: usize,
    pub tif: usize,
}

/// Partition `files` by extension.
///
/// All-or-nothing: the first file with an unrecognized extension fails the
/// whole call and nothing is returned.
pub fn classify(files: Vec<UploadedFile>) -> GeoResult<ClassifiedFiles> {
    let mut classified = ClassifiedFiles::default();

    for file in files {
        let bucket = match file.kind() {
            Some(FileKind::ShapeGeometry) => &mut classified.shp,
            Some(FileKind::ShapeIndex) => &mut classified.shx,
            Some(FileKind::Raster) => &mut classified.tif,
            None => return Err(GeoError::InvalidFileType { file: file.name }),
        };
        bucket.push(file);
    }

    Ok(classified)
}
