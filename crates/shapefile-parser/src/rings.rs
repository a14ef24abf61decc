//! Polygon ring grouping.
//!
//! Shapefile polygons are a flat list of rings. Outer rings wind clockwise
//! and holes counter-clockwise; each hole belongs to the outer ring that
//! contains it.

use geo_common::{Geometry, Position};

/// Signed area of a ring (shoelace). Negative for clockwise rings.
pub fn signed_area(ring: &[Position]) -> f64 {
    ring.windows(2)
        .map(|w| w[0][0] * w[1][1] - w[1][0] * w[0][1])
        .sum::<f64>()
        / 2.0
}

pub fn is_clockwise(ring: &[Position]) -> bool {
    signed_area(ring) < 0.0
}

/// Even-odd ray cast.
pub fn ring_contains(ring: &[Position], point: Position) -> bool {
    let [x, y] = point;
    let mut inside = false;
    for w in ring.windows(2) {
        let ([xi, yi], [xj, yj]) = (w[0], w[1]);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
    }
    inside
}

/// Group rings into a Polygon or MultiPolygon.
pub fn assemble_polygon(rings: Vec<Vec<Position>>) -> Option<Geometry> {
    let mut polygons: Vec<Vec<Vec<Position>>> = Vec::new();
    let mut holes: Vec<Vec<Position>> = Vec::new();

    for ring in rings {
        if ring.is_empty() {
            continue;
        }
        if is_clockwise(&ring) {
            polygons.push(vec![ring]);
        } else {
            holes.push(ring);
        }
    }

    for hole in holes {
        let owner = polygons
            .iter_mut()
            .find(|polygon| ring_contains(&polygon[0], hole[0]));
        match owner {
            Some(polygon) => polygon.push(hole),
            // An orphan counter-clockwise ring is kept as its own shell.
            None => polygons.push(vec![hole]),
        }
    }

    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(polygons)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64, clockwise: bool) -> Vec<Position> {
        let mut ring = vec![[min, min], [min, max], [max, max], [max, min], [min, min]];
        if !clockwise {
            ring.reverse();
        }
        ring
    }

    #[test]
    fn test_orientation() {
        assert!(is_clockwise(&square(0.0, 10.0, true)));
        assert!(!is_clockwise(&square(0.0, 10.0, false)));
        assert_eq!(signed_area(&square(0.0, 10.0, false)), 100.0);
    }

    #[test]
    fn test_hole_attached_to_containing_shell() {
        let geometry = assemble_polygon(vec![square(0.0, 10.0, true), square(2.0, 4.0, false)]);
        match geometry {
            Some(Geometry::Polygon(rings)) => assert_eq!(rings.len(), 2),
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn test_two_shells_make_multipolygon() {
        let geometry = assemble_polygon(vec![
            square(0.0, 1.0, true),
            square(5.0, 6.0, true),
            square(5.2, 5.8, false),
        ]);
        match geometry {
            Some(Geometry::MultiPolygon(polygons)) => {
                assert_eq!(polygons.len(), 2);
                assert_eq!(polygons[0].len(), 1);
                assert_eq!(polygons[1].len(), 2);
            }
            other => panic!("expected multipolygon, got {other:?}"),
        }
    }

    #[test]
    fn test_no_rings() {
        assert_eq!(assemble_polygon(vec![]), None);
    }
}
