//! Bounding box and spatial query types.

use chrono::{DateTime, Utc};
use geo::{LineString, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{GeoError, GeoResult};

/// An axis-aligned bounding box in EPSG:4326 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Check if this bbox overlaps another (shared edges count).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

/// A latitude/longitude pair as sent by the map client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Corner set as received from the wire; any corner may be absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CornerSet {
    pub north_west: Option<LatLng>,
    pub north_east: Option<LatLng>,
    pub south_west: Option<LatLng>,
    pub south_east: Option<LatLng>,
}

/// A validated four-corner query box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryBox {
    pub north_west: LatLng,
    pub north_east: LatLng,
    pub south_west: LatLng,
    pub south_east: LatLng,
}

impl QueryBox {
    pub fn new(north_west: LatLng, north_east: LatLng, south_west: LatLng, south_east: LatLng) -> Self {
        Self {
            north_west,
            north_east,
            south_west,
            south_east,
        }
    }

    /// Closed exterior ring as `(lng, lat)` pairs.
    ///
    /// Ring order is northWest, northEast, southEast, southWest and back to
    /// northWest.
    pub fn ring(&self) -> Vec<(f64, f64)> {
        [
            self.north_west,
            self.north_east,
            self.south_east,
            self.south_west,
            self.north_west,
        ]
        .iter()
        .map(|c| (c.lng, c.lat))
        .collect()
    }

    /// GeoJSON polygon for `ST_GeomFromGeoJSON`.
    pub fn to_geojson(&self) -> serde_json::Value {
        let coordinates: Vec<[f64; 2]> = self.ring().into_iter().map(|(x, y)| [x, y]).collect();
        json!({
            "type": "Polygon",
            "coordinates": [coordinates],
        })
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(LineString::from(self.ring()), vec![])
    }

    /// Smallest axis-aligned box enclosing the four corners.
    pub fn envelope(&self) -> BoundingBox {
        let ring = self.ring();
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in ring {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }
}

impl TryFrom<CornerSet> for QueryBox {
    type Error = GeoError;

    fn try_from(corners: CornerSet) -> GeoResult<Self> {
        match corners {
            CornerSet {
                north_west: Some(nw),
                north_east: Some(ne),
                south_west: Some(sw),
                south_east: Some(se),
            } => Ok(QueryBox::new(nw, ne, sw, se)),
            other => Err(GeoError::MissingParameter(other.missing_fields())),
        }
    }
}

impl CornerSet {
    /// Names of absent corners, in declaration order.
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("northWest", self.north_west.is_none()),
            ("northEast", self.north_east.is_none()),
            ("southWest", self.south_west.is_none()),
            ("southEast", self.south_east.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

/// A validated spatial + temporal raster query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialQuery {
    pub bbox: QueryBox,
    pub as_of: DateTime<Utc>,
}

impl SpatialQuery {
    pub fn new(bbox: QueryBox, as_of: DateTime<Utc>) -> Self {
        Self { bbox, as_of }
    }

    /// Validate raw parts, reporting every missing field at once.
    pub fn from_parts(corners: CornerSet, as_of: Option<DateTime<Utc>>) -> GeoResult<Self> {
        let mut missing = corners.missing_fields();
        if as_of.is_none() {
            missing.push("date".to_string());
        }
        if !missing.is_empty() {
            return Err(GeoError::MissingParameter(missing));
        }

        let bbox = QueryBox::try_from(corners)?;
        let as_of = as_of.ok_or_else(|| GeoError::missing("date"))?;
        Ok(Self { bbox, as_of })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corners() -> CornerSet {
        CornerSet {
            north_west: Some(LatLng::new(-2.0, -80.0)),
            north_east: Some(LatLng::new(-2.0, -79.0)),
            south_west: Some(LatLng::new(-3.0, -80.0)),
            south_east: Some(LatLng::new(-3.0, -79.0)),
        }
    }

    #[test]
    fn test_ring_order_is_closed_nw_ne_se_sw() {
        let bbox = QueryBox::try_from(corners()).unwrap();
        let ring = bbox.ring();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], (-80.0, -2.0));
        assert_eq!(ring[1], (-79.0, -2.0));
        assert_eq!(ring[2], (-79.0, -3.0));
        assert_eq!(ring[3], (-80.0, -3.0));
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_missing_south_east() {
        let mut c = corners();
        c.south_east = None;
        let err = SpatialQuery::from_parts(c, Some(Utc::now())).unwrap_err();
        match err {
            GeoError::MissingParameter(fields) => assert_eq!(fields, vec!["southEast"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_date_and_corner_reported_together() {
        let mut c = corners();
        c.north_west = None;
        let err = SpatialQuery::from_parts(c, None).unwrap_err();
        match err {
            GeoError::MissingParameter(fields) => assert_eq!(fields, vec!["northWest", "date"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_envelope() {
        let bbox = QueryBox::try_from(corners()).unwrap();
        assert_eq!(bbox.envelope(), BoundingBox::new(-80.0, -3.0, -79.0, -2.0));
    }
}
