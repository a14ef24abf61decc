//! Aggregation ordering, atomicity and workspace stamping.

use geo_common::{GeoError, Geometry};
use ingestion::{classify, FeatureAggregator, UploadedFile};
use test_utils::workspace;
use test_utils::{square_polygons, ShapefileBuilder, TestShape};
use tokio_test::{assert_err, assert_ok};

fn points_file(name: &str, xs: &[f64]) -> UploadedFile {
    let builder = xs
        .iter()
        .fold(ShapefileBuilder::points(), |b, x| b.with(TestShape::Point(*x, 0.0)));
    UploadedFile::new(name, builder.build_shp())
}

fn x_of(geometry: &Option<Geometry>) -> f64 {
    match geometry {
        Some(Geometry::Point([x, _])) => *x,
        other => panic!("expected point, got {other:?}"),
    }
}

#[tokio::test]
async fn test_features_follow_file_then_record_order() {
    let a = points_file("a.shp", &[1.0, 2.0]);
    let b = points_file("b.shp", &[3.0]);

    let bundle = assert_ok!(
        FeatureAggregator::default()
            .aggregate(workspace::DEFAULT, &[a, b], &[])
            .await
    );

    let xs: Vec<f64> = bundle.shp.iter().map(|f| x_of(&f.geometry)).collect();
    assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    assert_eq!(bundle.workspace_id, workspace::DEFAULT);
    assert!(bundle.shx.is_empty());
    assert!(bundle.tif.is_empty());
}

#[tokio::test]
async fn test_failing_file_aborts_whole_aggregation() {
    let good = points_file("good.shp", &[1.0]);
    let bad = UploadedFile::new("bad.shp", b"not a shapefile at all".to_vec());
    let later = points_file("later.shp", &[2.0]);

    let err = assert_err!(
        FeatureAggregator::default()
            .aggregate(workspace::DEFAULT, &[good, bad, later], &[])
            .await
    );
    match err {
        GeoError::ParseError { file, .. } => assert_eq!(file, "bad.shp"),
        other => panic!("expected ParseError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_bad_index_file_aborts_after_geometry() {
    let builder = square_polygons(2);
    let shp = UploadedFile::new("parcels.shp", builder.build_shp());
    let shx = UploadedFile::new("parcels.shx", vec![1u8, 2, 3]);

    let err = FeatureAggregator::default()
        .aggregate(workspace::DEFAULT, &[shp], &[shx])
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "ParseError");
}

#[tokio::test]
async fn test_workspace_stamped_with_no_files() {
    let bundle = assert_ok!(
        FeatureAggregator::default()
            .aggregate("ws-7", &[], &[])
            .await
    );
    assert_eq!(bundle.workspace_id, "ws-7");
    assert!(bundle.is_empty());
}

#[tokio::test]
async fn test_blank_workspace_rejected() {
    let err = FeatureAggregator::default()
        .aggregate("  ", &[], &[])
        .await
        .unwrap_err();
    assert_eq!(err, GeoError::MissingParameter(vec!["workspaceId".to_string()]));
}

#[tokio::test]
async fn test_geometry_and_index_pair_by_position() {
    let builder = square_polygons(3);
    let shp = UploadedFile::new("parcels.shp", builder.build_shp());
    let shx = UploadedFile::new("parcels.shx", builder.build_shx());

    let bundle = FeatureAggregator::default()
        .aggregate(workspace::DEFAULT, &[shp], &[shx])
        .await
        .unwrap();

    assert_eq!(bundle.shp.len(), 3);
    assert_eq!(bundle.shx.len(), 3);
    for (i, entry) in bundle.shx.iter().enumerate() {
        assert_eq!(entry.feature_id as usize, i + 1);
    }
}

#[tokio::test]
async fn test_raster_is_classified_but_not_decoded() {
    let selection = vec![
        UploadedFile::new("parcels.shp", square_polygons(3).build_shp()),
        UploadedFile::new("ortho.tif", b"II*\0".to_vec()),
    ];

    let classified = classify(selection.clone()).unwrap();
    assert_eq!(classified.shp.len(), 1);
    assert_eq!(classified.tif.len(), 1);

    let bundle = FeatureAggregator::default()
        .ingest(workspace::DEFAULT, selection)
        .await
        .unwrap();
    assert_eq!(bundle.shp.len(), 3);
    assert!(bundle.tif.is_empty());
}

#[tokio::test]
async fn test_ingest_rejects_unknown_extension_before_decoding() {
    let selection = vec![
        UploadedFile::new("broken.shp", vec![0u8; 4]),
        UploadedFile::new("notes.txt", b"hello".to_vec()),
    ];

    let err = FeatureAggregator::default()
        .ingest(workspace::DEFAULT, selection)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GeoError::InvalidFileType {
            file: "notes.txt".to_string()
        }
    );
}
