//! Tests for `.shx` index decoding.

use shapefile_parser::{read_index, read_shapes, ShapefileError};
use test_utils::{square_polygons, ShapefileBuilder, TestShape};

#[test]
fn test_index_matches_geometry_records() {
    let builder = square_polygons(3);
    let shp = builder.build_shp();
    let index = read_index(&builder.build_shx()).unwrap();

    assert_eq!(index.len(), 3);
    assert_eq!(index.len(), read_shapes(&shp).unwrap().len());
    assert_eq!(index[0].record_number, 1);
    assert_eq!(index[0].offset_bytes(), 100);

    // Each offset points at a record header carrying the expected number.
    for entry in &index {
        let at = entry.offset_bytes() as usize;
        let number = i32::from_be_bytes([shp[at], shp[at + 1], shp[at + 2], shp[at + 3]]);
        assert_eq!(number as u32, entry.record_number);
        let words = i32::from_be_bytes([shp[at + 4], shp[at + 5], shp[at + 6], shp[at + 7]]);
        assert_eq!(words as u64 * 2, entry.content_length_bytes());
    }
}

#[test]
fn test_point_index_lengths() {
    let builder = ShapefileBuilder::points()
        .with(TestShape::Point(0.0, 0.0))
        .with(TestShape::Null);
    let index = read_index(&builder.build_shx()).unwrap();
    assert_eq!(index[0].content_length_bytes(), 20);
    assert_eq!(index[1].content_length_bytes(), 4);
    assert_eq!(index[1].offset_bytes(), 100 + 8 + 20);
}

#[test]
fn test_partial_index_record_fails() {
    let mut shx = square_polygons(2).build_shx();
    // Declare 4 extra bytes and append them: half a record.
    let words = i32::from_be_bytes([shx[24], shx[25], shx[26], shx[27]]) + 2;
    shx[24..28].copy_from_slice(&words.to_be_bytes());
    shx.extend_from_slice(&[0, 0, 0, 0]);
    assert!(matches!(read_index(&shx), Err(ShapefileError::InvalidFormat(_))));
}

#[test]
fn test_offset_inside_header_fails() {
    let mut shx = square_polygons(1).build_shx();
    shx[100..104].copy_from_slice(&10i32.to_be_bytes());
    assert!(matches!(
        read_index(&shx),
        Err(ShapefileError::InvalidRecord { record: 1, .. })
    ));
}
