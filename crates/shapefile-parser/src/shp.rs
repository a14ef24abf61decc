//! `.shp` record decoding.
//!
//! Each record is an 8-byte big-endian header (record number, content
//! length in words) followed by little-endian content starting with the
//! shape type. Z and M values are skipped; only XY is decoded.

use geo_common::{Geometry, Position};
use tracing::debug;

use crate::error::{Result, ShapefileError};
use crate::header::{be_i32, le_f64, le_i32, parse_header, BaseShape, ShapeType, HEADER_LEN};
use crate::rings::assemble_polygon;

/// Record header length in bytes.
pub const RECORD_HEADER_LEN: usize = 8;

/// One decoded geometry record.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    /// 1-based record number as stored in the file.
    pub record_number: u32,
    pub shape_type: ShapeType,
    /// `None` for null shapes and empty geometries.
    pub geometry: Option<Geometry>,
}

/// Decode every record of a `.shp` file.
pub fn read_shapes(data: &[u8]) -> Result<Vec<ShapeRecord>> {
    let header = parse_header(data)?;
    let end = header.file_length;
    let mut records = Vec::new();
    let mut offset = HEADER_LEN;

    while offset < end {
        if offset + RECORD_HEADER_LEN > end {
            return Err(ShapefileError::InvalidFormat(format!(
                "Trailing {} bytes after last record",
                end - offset
            )));
        }

        let record_number = be_i32(data, offset)?;
        let content_words = be_i32(data, offset + 4)?;
        if record_number < 1 || content_words < 2 {
            return Err(ShapefileError::InvalidRecord {
                record: record_number.max(0) as u32,
                reason: format!("Bad record header (content length {} words)", content_words),
            });
        }
        let record_number = record_number as u32;

        let start = offset + RECORD_HEADER_LEN;
        let stop = start + content_words as usize * 2;
        if stop > end {
            return Err(ShapefileError::InvalidRecord {
                record: record_number,
                reason: format!("Content runs past end of file ({} > {})", stop, end),
            });
        }

        records.push(parse_record(&data[start..stop], record_number)?);
        offset = stop;
    }

    debug!(
        records = records.len(),
        shape_type = ?header.shape_type,
        "Decoded shapefile geometry"
    );

    Ok(records)
}

fn parse_record(content: &[u8], record: u32) -> Result<ShapeRecord> {
    let shape_type = ShapeType::from_code(le_i32(content, 0)?)?;

    let geometry = match shape_type.base() {
        BaseShape::Null => None,
        BaseShape::Point => Some(Geometry::Point(read_point(content, 4, record)?)),
        BaseShape::MultiPoint => read_multipoint(content, record)?,
        BaseShape::PolyLine => {
            let parts = read_parts(content, record)?;
            match parts.len() {
                0 => None,
                1 => parts.into_iter().next().map(Geometry::LineString),
                _ => Some(Geometry::MultiLineString(parts)),
            }
        }
        BaseShape::Polygon => assemble_polygon(read_parts(content, record)?),
        BaseShape::MultiPatch => {
            return Err(ShapefileError::UnsupportedShapeType(shape_type.code()));
        }
    };

    Ok(ShapeRecord {
        record_number: record,
        shape_type,
        geometry,
    })
}

fn read_point(content: &[u8], offset: usize, record: u32) -> Result<Position> {
    let x = le_f64(content, offset).map_err(|_| truncated(record))?;
    let y = le_f64(content, offset + 8).map_err(|_| truncated(record))?;
    Ok([x, y])
}

/// Content: type(4) bbox(32) num_points(4) points(16*n).
fn read_multipoint(content: &[u8], record: u32) -> Result<Option<Geometry>> {
    let num_points = read_count(content, 36, record, "point")?;
    ensure_fits(content, record, 40, &[(num_points, 16)])?;
    let points = (0..num_points)
        .map(|i| read_point(content, 40 + i * 16, record))
        .collect::<Result<Vec<_>>>()?;

    Ok(match points.len() {
        0 => None,
        1 => Some(Geometry::Point(points[0])),
        _ => Some(Geometry::MultiPoint(points)),
    })
}

/// Content: type(4) bbox(32) num_parts(4) num_points(4) parts(4*p) points(16*n).
fn read_parts(content: &[u8], record: u32) -> Result<Vec<Vec<Position>>> {
    let num_parts = read_count(content, 36, record, "part")?;
    let num_points = read_count(content, 40, record, "point")?;

    let parts_offset = 44;
    ensure_fits(content, record, parts_offset, &[(num_parts, 4), (num_points, 16)])?;
    let points_offset = parts_offset + num_parts * 4;

    let mut starts = Vec::with_capacity(num_parts);
    for i in 0..num_parts {
        let start = le_i32(content, parts_offset + i * 4).map_err(|_| truncated(record))?;
        if start < 0 || start as usize > num_points {
            return Err(ShapefileError::InvalidRecord {
                record,
                reason: format!("Part {} starts at point {} of {}", i, start, num_points),
            });
        }
        if let Some(&previous) = starts.last() {
            if (start as usize) < previous {
                return Err(ShapefileError::InvalidRecord {
                    record,
                    reason: "Part indices are not ascending".to_string(),
                });
            }
        }
        starts.push(start as usize);
    }

    let points = (0..num_points)
        .map(|i| read_point(content, points_offset + i * 16, record))
        .collect::<Result<Vec<_>>>()?;

    let parts = starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let stop = starts.get(i + 1).copied().unwrap_or(num_points);
            points[start..stop].to_vec()
        })
        .filter(|part| !part.is_empty())
        .collect();

    Ok(parts)
}

fn read_count(content: &[u8], offset: usize, record: u32, what: &str) -> Result<usize> {
    let count = le_i32(content, offset).map_err(|_| truncated(record))?;
    if count < 0 {
        return Err(ShapefileError::InvalidRecord {
            record,
            reason: format!("Negative {} count {}", what, count),
        });
    }
    Ok(count as usize)
}

/// Reject counts whose arrays cannot fit in the record content.
fn ensure_fits(
    content: &[u8],
    record: u32,
    base: usize,
    arrays: &[(usize, usize)],
) -> Result<()> {
    let needed = arrays.iter().try_fold(base, |total, &(count, width)| {
        count.checked_mul(width).and_then(|bytes| total.checked_add(bytes))
    });
    match needed {
        Some(needed) if needed <= content.len() => Ok(()),
        _ => Err(ShapefileError::InvalidRecord {
            record,
            reason: format!(
                "Declared counts need more than the {} content bytes",
                content.len()
            ),
        }),
    }
}

fn truncated(record: u32) -> ShapefileError {
    ShapefileError::InvalidRecord {
        record,
        reason: "Record content is truncated".to_string(),
    }
}
