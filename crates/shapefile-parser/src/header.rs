//! Main file header shared by `.shp` and `.shx` files.
//!
//! Both files start with the same 100-byte header. The file code and file
//! length are big-endian; everything from the version onwards is
//! little-endian.

use geo_common::BoundingBox;

use crate::error::{Result, ShapefileError};

/// Magic number at offset 0.
pub const FILE_CODE: i32 = 9994;

/// Only version ever published.
pub const VERSION: i32 = 1000;

/// Header length in bytes.
pub const HEADER_LEN: usize = 100;

/// Shape types defined by the ESRI shapefile technical description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

/// Geometry layout shared by the plain, M and Z variants of a shape type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseShape {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    MultiPatch,
}

impl ShapeType {
    pub fn from_code(code: i32) -> Result<Self> {
        let shape_type = match code {
            0 => ShapeType::Null,
            1 => ShapeType::Point,
            3 => ShapeType::PolyLine,
            5 => ShapeType::Polygon,
            8 => ShapeType::MultiPoint,
            11 => ShapeType::PointZ,
            13 => ShapeType::PolyLineZ,
            15 => ShapeType::PolygonZ,
            18 => ShapeType::MultiPointZ,
            21 => ShapeType::PointM,
            23 => ShapeType::PolyLineM,
            25 => ShapeType::PolygonM,
            28 => ShapeType::MultiPointM,
            31 => ShapeType::MultiPatch,
            other => return Err(ShapefileError::UnsupportedShapeType(other)),
        };
        Ok(shape_type)
    }

    pub fn code(&self) -> i32 {
        match self {
            ShapeType::Null => 0,
            ShapeType::Point => 1,
            ShapeType::PolyLine => 3,
            ShapeType::Polygon => 5,
            ShapeType::MultiPoint => 8,
            ShapeType::PointZ => 11,
            ShapeType::PolyLineZ => 13,
            ShapeType::PolygonZ => 15,
            ShapeType::MultiPointZ => 18,
            ShapeType::PointM => 21,
            ShapeType::PolyLineM => 23,
            ShapeType::PolygonM => 25,
            ShapeType::MultiPointM => 28,
            ShapeType::MultiPatch => 31,
        }
    }

    pub fn base(&self) -> BaseShape {
        match self {
            ShapeType::Null => BaseShape::Null,
            ShapeType::Point | ShapeType::PointZ | ShapeType::PointM => BaseShape::Point,
            ShapeType::PolyLine | ShapeType::PolyLineZ | ShapeType::PolyLineM => BaseShape::PolyLine,
            ShapeType::Polygon | ShapeType::PolygonZ | ShapeType::PolygonM => BaseShape::Polygon,
            ShapeType::MultiPoint | ShapeType::MultiPointZ | ShapeType::MultiPointM => {
                BaseShape::MultiPoint
            }
            ShapeType::MultiPatch => BaseShape::MultiPatch,
        }
    }
}

/// Parsed main file header.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    /// Declared file length in bytes (the header stores 16-bit words).
    pub file_length: usize,
    pub version: i32,
    pub shape_type: ShapeType,
    pub bbox: BoundingBox,
}

/// Parse the 100-byte header and check it against the buffer size.
pub fn parse_header(data: &[u8]) -> Result<FileHeader> {
    if data.len() < HEADER_LEN {
        return Err(ShapefileError::Truncated {
            expected: HEADER_LEN,
            actual: data.len(),
        });
    }

    let file_code = be_i32(data, 0)?;
    if file_code != FILE_CODE {
        return Err(ShapefileError::InvalidFormat(format!(
            "Invalid file code {}, expected {}",
            file_code, FILE_CODE
        )));
    }

    let length_words = be_i32(data, 24)?;
    if length_words < (HEADER_LEN / 2) as i32 {
        return Err(ShapefileError::InvalidFormat(format!(
            "Declared file length {} words is shorter than the header",
            length_words
        )));
    }
    let file_length = length_words as usize * 2;
    if data.len() < file_length {
        return Err(ShapefileError::Truncated {
            expected: file_length,
            actual: data.len(),
        });
    }

    let version = le_i32(data, 28)?;
    if version != VERSION {
        return Err(ShapefileError::InvalidFormat(format!(
            "Unsupported version {}",
            version
        )));
    }

    let shape_type = ShapeType::from_code(le_i32(data, 32)?)?;

    let bbox = BoundingBox::new(
        le_f64(data, 36)?,
        le_f64(data, 44)?,
        le_f64(data, 52)?,
        le_f64(data, 60)?,
    );

    Ok(FileHeader {
        file_length,
        version,
        shape_type,
        bbox,
    })
}

// ===== Byte helpers =====

fn slice<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or(ShapefileError::Truncated {
            expected: offset + N,
            actual: data.len(),
        })
}

pub(crate) fn be_i32(data: &[u8], offset: usize) -> Result<i32> {
    slice::<4>(data, offset).map(i32::from_be_bytes)
}

pub(crate) fn le_i32(data: &[u8], offset: usize) -> Result<i32> {
    slice::<4>(data, offset).map(i32::from_le_bytes)
}

pub(crate) fn le_f64(data: &[u8], offset: usize) -> Result<f64> {
    slice::<8>(data, offset).map(f64::from_le_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(shape_type: i32, length_words: i32) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data[0..4].copy_from_slice(&FILE_CODE.to_be_bytes());
        data[24..28].copy_from_slice(&length_words.to_be_bytes());
        data[28..32].copy_from_slice(&VERSION.to_le_bytes());
        data[32..36].copy_from_slice(&shape_type.to_le_bytes());
        data[36..44].copy_from_slice(&(-80.0f64).to_le_bytes());
        data[44..52].copy_from_slice(&(-3.0f64).to_le_bytes());
        data[52..60].copy_from_slice(&(-79.0f64).to_le_bytes());
        data[60..68].copy_from_slice(&(-2.0f64).to_le_bytes());
        data
    }

    #[test]
    fn test_parse_header() {
        let h = parse_header(&header(5, 50)).unwrap();
        assert_eq!(h.file_length, 100);
        assert_eq!(h.shape_type, ShapeType::Polygon);
        assert_eq!(h.bbox, BoundingBox::new(-80.0, -3.0, -79.0, -2.0));
    }

    #[test]
    fn test_bad_file_code() {
        let mut data = header(1, 50);
        data[0..4].copy_from_slice(&1234i32.to_be_bytes());
        assert!(matches!(parse_header(&data), Err(ShapefileError::InvalidFormat(_))));
    }

    #[test]
    fn test_declared_length_beyond_buffer() {
        let data = header(1, 60);
        assert_eq!(
            parse_header(&data),
            Err(ShapefileError::Truncated {
                expected: 120,
                actual: 100
            })
        );
    }

    #[test]
    fn test_short_buffer() {
        assert!(matches!(
            parse_header(&[0u8; 20]),
            Err(ShapefileError::Truncated { expected: 100, .. })
        ));
    }

    #[test]
    fn test_unknown_shape_type() {
        assert_eq!(
            parse_header(&header(2, 50)),
            Err(ShapefileError::UnsupportedShapeType(2))
        );
    }

    #[test]
    fn test_shape_type_variants_share_base() {
        for code in [5, 15, 25] {
            assert_eq!(ShapeType::from_code(code).unwrap().base(), BaseShape::Polygon);
        }
        assert_eq!(ShapeType::PointZ.code(), 11);
    }
}
