//! Tests for `.shp` geometry decoding using synthetic files.

use geo_common::Geometry;
use shapefile_parser::{read_shapes, ShapeType, ShapefileError};
use test_utils::{
    assert_coords_approx_eq, clockwise_square, counter_clockwise_square, square_polygons,
    ShapefileBuilder, TestShape,
};

// ============================================================================
// Point / MultiPoint
// ============================================================================

#[test]
fn test_read_points_in_order() {
    let shp = ShapefileBuilder::points()
        .with(TestShape::Point(-79.63, -2.16))
        .with(TestShape::Point(-79.62, -2.17))
        .with(TestShape::Point(-79.61, -2.18))
        .build_shp();

    let records = read_shapes(&shp).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(
        records.iter().map(|r| r.record_number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    match records[1].geometry {
        Some(Geometry::Point([x, y])) => assert_coords_approx_eq!((x, y), (-79.62, -2.17), 1e-12),
        ref other => panic!("expected point, got {other:?}"),
    }
}

#[test]
fn test_single_multipoint_collapses_to_point() {
    let shp = ShapefileBuilder::new(8)
        .with(TestShape::MultiPoint(vec![(1.0, 2.0)]))
        .with(TestShape::MultiPoint(vec![(1.0, 2.0), (3.0, 4.0)]))
        .build_shp();

    let records = read_shapes(&shp).unwrap();
    assert_eq!(records[0].geometry, Some(Geometry::Point([1.0, 2.0])));
    assert_eq!(
        records[1].geometry,
        Some(Geometry::MultiPoint(vec![[1.0, 2.0], [3.0, 4.0]]))
    );
}

#[test]
fn test_null_shape_has_no_geometry() {
    let shp = ShapefileBuilder::points()
        .with(TestShape::Null)
        .with(TestShape::Point(0.0, 0.0))
        .build_shp();

    let records = read_shapes(&shp).unwrap();
    assert_eq!(records[0].shape_type, ShapeType::Null);
    assert_eq!(records[0].geometry, None);
    assert!(records[1].geometry.is_some());
}

// ============================================================================
// PolyLine / Polygon
// ============================================================================

#[test]
fn test_polyline_parts() {
    let shp = ShapefileBuilder::polylines()
        .with(TestShape::PolyLine(vec![vec![(0.0, 0.0), (1.0, 1.0)]]))
        .with(TestShape::PolyLine(vec![
            vec![(0.0, 0.0), (1.0, 1.0)],
            vec![(2.0, 2.0), (3.0, 3.0), (4.0, 4.0)],
        ]))
        .build_shp();

    let records = read_shapes(&shp).unwrap();
    assert_eq!(
        records[0].geometry,
        Some(Geometry::LineString(vec![[0.0, 0.0], [1.0, 1.0]]))
    );
    match &records[1].geometry {
        Some(Geometry::MultiLineString(lines)) => {
            assert_eq!(lines.len(), 2);
            assert_eq!(lines[1].len(), 3);
        }
        other => panic!("expected multilinestring, got {other:?}"),
    }
}

#[test]
fn test_polygon_with_hole() {
    let shp = ShapefileBuilder::polygons()
        .with(TestShape::Polygon(vec![
            clockwise_square(0.0, 0.0, 10.0, 10.0),
            counter_clockwise_square(2.0, 2.0, 4.0, 4.0),
        ]))
        .build_shp();

    let records = read_shapes(&shp).unwrap();
    match &records[0].geometry {
        Some(Geometry::Polygon(rings)) => {
            assert_eq!(rings.len(), 2);
            assert_eq!(rings[0].len(), 5);
            assert_eq!(rings[0].first(), rings[0].last());
        }
        other => panic!("expected polygon, got {other:?}"),
    }
}

#[test]
fn test_polygon_with_two_shells() {
    let shp = ShapefileBuilder::polygons()
        .with(TestShape::Polygon(vec![
            clockwise_square(0.0, 0.0, 1.0, 1.0),
            clockwise_square(5.0, 5.0, 6.0, 6.0),
        ]))
        .build_shp();

    let records = read_shapes(&shp).unwrap();
    assert!(matches!(records[0].geometry, Some(Geometry::MultiPolygon(ref p)) if p.len() == 2));
}

#[test]
fn test_empty_file_has_no_records() {
    let shp = ShapefileBuilder::polygons().build_shp();
    assert!(read_shapes(&shp).unwrap().is_empty());
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn test_truncated_file_fails() {
    let mut shp = square_polygons(3).build_shp();
    shp.truncate(shp.len() - 10);
    assert!(matches!(
        read_shapes(&shp),
        Err(ShapefileError::Truncated { .. })
    ));
}

#[test]
fn test_record_overrunning_declared_length_fails() {
    let mut shp = square_polygons(1).build_shp();
    // Inflate the first record's content length.
    shp[104..108].copy_from_slice(&1000i32.to_be_bytes());
    assert!(matches!(
        read_shapes(&shp),
        Err(ShapefileError::InvalidRecord { record: 1, .. })
    ));
}

#[test]
fn test_not_a_shapefile() {
    let data = b"II*\0 this is a tiff, not a shapefile".repeat(4);
    assert!(matches!(
        read_shapes(&data),
        Err(ShapefileError::InvalidFormat(_))
    ));
}

#[test]
fn test_bad_part_index_fails() {
    let mut shp = ShapefileBuilder::polylines()
        .with(TestShape::PolyLine(vec![vec![(0.0, 0.0), (1.0, 1.0)]]))
        .build_shp();
    // record header(8) + type(4) + bbox(32) + parts(4) + points(4) -> first part index
    let at = 100 + 8 + 4 + 32 + 8;
    shp[at..at + 4].copy_from_slice(&7i32.to_le_bytes());
    assert!(matches!(
        read_shapes(&shp),
        Err(ShapefileError::InvalidRecord { record: 1, .. })
    ));
}

/// Overwrite a little-endian i32 inside the first record's content.
fn set_content_i32(shp: &mut [u8], content_offset: usize, value: i32) {
    let at = 100 + 8 + content_offset;
    shp[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

#[test]
fn test_huge_part_count_fails_without_allocating() {
    let mut shp = square_polygons(1).build_shp();
    set_content_i32(&mut shp, 36, i32::MAX);
    assert!(matches!(
        read_shapes(&shp),
        Err(ShapefileError::InvalidRecord { record: 1, .. })
    ));
}

#[test]
fn test_huge_point_count_fails_without_allocating() {
    let mut shp = square_polygons(1).build_shp();
    set_content_i32(&mut shp, 40, i32::MAX);
    assert!(matches!(
        read_shapes(&shp),
        Err(ShapefileError::InvalidRecord { record: 1, .. })
    ));

    let mut multipoint = ShapefileBuilder::new(8)
        .with(TestShape::MultiPoint(vec![(1.0, 2.0), (3.0, 4.0)]))
        .build_shp();
    set_content_i32(&mut multipoint, 36, i32::MAX);
    assert!(matches!(
        read_shapes(&multipoint),
        Err(ShapefileError::InvalidRecord { record: 1, .. })
    ));
}
