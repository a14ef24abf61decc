//! Request counters and timings exported through the `metrics` facade.

use std::time::Duration;

use metrics::{counter, histogram};

/// Outcome label shared by all request metrics.
pub fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

pub fn record_upload(ok: bool, files: usize, features: usize, elapsed: Duration) {
    counter!("geo_uploads_total", "outcome" => outcome(ok)).increment(1);
    counter!("geo_upload_files_total").increment(files as u64);
    if ok {
        counter!("geo_upload_features_total").increment(features as u64);
    }
    histogram!("geo_upload_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_raster_query(ok: bool, matches: usize, elapsed: Duration) {
    counter!("geo_raster_queries_total", "outcome" => outcome(ok)).increment(1);
    histogram!("geo_raster_query_matches").record(matches as f64);
    histogram!("geo_raster_query_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_workspace_listing(kind: &'static str, ok: bool, rows: usize) {
    counter!("geo_workspace_listings_total", "kind" => kind, "outcome" => outcome(ok)).increment(1);
    histogram!("geo_workspace_listing_rows", "kind" => kind).record(rows as f64);
}
