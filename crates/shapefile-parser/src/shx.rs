//! `.shx` index decoding.
//!
//! After the 100-byte header the index is a flat array of 8-byte big-endian
//! records: offset and content length, both in 16-bit words.

use tracing::debug;

use crate::error::{Result, ShapefileError};
use crate::header::{be_i32, parse_header, HEADER_LEN};

/// Index record length in bytes.
pub const INDEX_RECORD_LEN: usize = 8;

/// One index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    /// 1-based number of the `.shp` record this entry points to.
    pub record_number: u32,
    pub offset_words: u32,
    pub content_length_words: u32,
}

impl IndexRecord {
    pub fn offset_bytes(&self) -> u64 {
        self.offset_words as u64 * 2
    }

    pub fn content_length_bytes(&self) -> u64 {
        self.content_length_words as u64 * 2
    }
}

/// Decode every entry of a `.shx` file.
pub fn read_index(data: &[u8]) -> Result<Vec<IndexRecord>> {
    let header = parse_header(data)?;
    let body = header.file_length - HEADER_LEN;
    if body % INDEX_RECORD_LEN != 0 {
        return Err(ShapefileError::InvalidFormat(format!(
            "Index body of {} bytes is not a whole number of records",
            body
        )));
    }

    let count = body / INDEX_RECORD_LEN;
    let mut records = Vec::with_capacity(count);

    for i in 0..count {
        let at = HEADER_LEN + i * INDEX_RECORD_LEN;
        let record_number = i as u32 + 1;
        let offset = be_i32(data, at)?;
        let length = be_i32(data, at + 4)?;

        if offset < (HEADER_LEN / 2) as i32 || length < 0 {
            return Err(ShapefileError::InvalidRecord {
                record: record_number,
                reason: format!("Bad index entry (offset {} words, length {} words)", offset, length),
            });
        }

        records.push(IndexRecord {
            record_number,
            offset_words: offset as u32,
            content_length_words: length as u32,
        });
    }

    debug!(records = records.len(), "Decoded shapefile index");

    Ok(records)
}
