//! Recognized upload file kinds.

use serde::{Deserialize, Serialize};

/// Geospatial file kind derived from a file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    /// `.shp` vector geometry.
    ShapeGeometry,
    /// `.shx` shape index.
    ShapeIndex,
    /// `.tif` / `.tiff` raster.
    Raster,
}

impl FileKind {
    pub const ALL: [FileKind; 3] = [FileKind::ShapeGeometry, FileKind::ShapeIndex, FileKind::Raster];

    /// Short type code used by the file-type registry.
    pub fn code(&self) -> &'static str {
        match self {
            FileKind::ShapeGeometry => "shp",
            FileKind::ShapeIndex => "shx",
            FileKind::Raster => "tif",
        }
    }

    /// Inverse of [`FileKind::code`].
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Map an extension (without the dot, any case) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "shp" => Some(FileKind::ShapeGeometry),
            "shx" => Some(FileKind::ShapeIndex),
            "tif" | "tiff" => Some(FileKind::Raster),
            _ => None,
        }
    }

    /// Kind of a file name, judged by its final extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
