//! Polygon offsetting with mitre joins
//!
//! A small, purpose-built offset used by the reconciler's sliver dissolve:
//! each ring's edges are displaced along their outward normal and rejoined
//! by intersecting consecutive offset edges (mitre), falling back to a
//! bevel past the mitre limit. Ring winding is normalized first so a
//! positive distance always grows the polygon (holes shrink) and a
//! negative distance erodes it. Offset rings are renormalized through
//! boolean ops, which also resolves the self-touches that dissolve thin
//! notches and slivers.

use geo::algorithm::orient::{Direction, Orient};
use geo::algorithm::{Area, BooleanOps};
use geo_types::{Coord, LineString, MultiPolygon, Polygon};

/// Mitre length limit as a multiple of the offset distance; sharper
/// corners are beveled.
const MITRE_LIMIT: f64 = 5.0;

const EPS: f64 = 1e-12;

/// Offset a closed ring by `distance` toward its right-hand side.
///
/// For a counter-clockwise exterior ring this is outward; for a clockwise
/// hole it shrinks the hole. Returns `None` when the ring is degenerate or
/// collapses entirely.
pub fn offset_ring(ring: &LineString<f64>, distance: f64) -> Option<LineString<f64>> {
    // Unique vertices, dropping the closing duplicate
    let mut pts: Vec<Coord<f64>> = ring.0.clone();
    if pts.len() >= 2 && pts.first() == pts.last() {
        pts.pop();
    }
    if pts.len() < 3 {
        return None;
    }

    let n = pts.len();

    // Right-hand unit normal per edge
    let mut normals = Vec::with_capacity(n);
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len = (dx * dx + dy * dy).sqrt();
        if len < EPS {
            return None;
        }
        normals.push(Coord {
            x: dy / len,
            y: -dx / len,
        });
    }

    let limit = MITRE_LIMIT * distance.abs();
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(n + 4);

    for i in 0..n {
        let prev = (i + n - 1) % n;
        let vertex = pts[i];
        let np = normals[prev];
        let ni = normals[i];

        // Offset lines through the vertex along each adjacent edge
        let a1 = Coord {
            x: pts[prev].x + np.x * distance,
            y: pts[prev].y + np.y * distance,
        };
        let a2 = Coord {
            x: vertex.x + np.x * distance,
            y: vertex.y + np.y * distance,
        };
        let b1 = Coord {
            x: vertex.x + ni.x * distance,
            y: vertex.y + ni.y * distance,
        };
        let b2 = Coord {
            x: pts[(i + 1) % n].x + ni.x * distance,
            y: pts[(i + 1) % n].y + ni.y * distance,
        };

        let d1 = Coord {
            x: a2.x - a1.x,
            y: a2.y - a1.y,
        };
        let d2 = Coord {
            x: b2.x - b1.x,
            y: b2.y - b1.y,
        };

        let denom = d1.x * d2.y - d1.y * d2.x;
        if denom.abs() < EPS {
            // Collinear edges: single displaced vertex
            out.push(a2);
            continue;
        }

        let t = ((b1.x - a1.x) * d2.y - (b1.y - a1.y) * d2.x) / denom;
        let meet = Coord {
            x: a1.x + t * d1.x,
            y: a1.y + t * d1.y,
        };

        let mitre_len =
            ((meet.x - vertex.x).powi(2) + (meet.y - vertex.y).powi(2)).sqrt();
        if mitre_len > limit {
            // Bevel: keep both offset-edge endpoints at this corner
            out.push(a2);
            out.push(b1);
        } else {
            out.push(meet);
        }
    }

    if out.len() < 3 {
        return None;
    }
    out.push(out[0]);
    Some(LineString::new(out))
}

/// Buffer a multipolygon by `distance` (positive grows, negative erodes)
/// using mitre joins.
///
/// Each polygon is rebuilt from its offset exterior minus its offset holes
/// through boolean ops, which cleans self-intersections introduced at
/// dissolving notches. Collapsed parts drop out; the result may be empty.
pub fn buffer_multi_polygon(mp: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    let oriented = mp.orient(Direction::Default);
    let mut merged: Option<MultiPolygon<f64>> = None;

    for polygon in &oriented {
        let Some(exterior) = offset_ring(polygon.exterior(), distance) else {
            continue;
        };

        let shell = Polygon::new(exterior, vec![]);
        // An exterior that flipped orientation has collapsed
        if shell.signed_area().abs() < EPS
            || shell.signed_area().signum() != polygon.exterior_signed_area_sign()
        {
            continue;
        }
        let mut part = MultiPolygon::new(vec![shell]);

        for hole in polygon.interiors() {
            let Some(offset_hole) = offset_ring(hole, distance) else {
                // Hole collapsed: it dissolves into the polygon
                continue;
            };
            let hole_poly = Polygon::new(offset_hole, vec![]);
            if hole_poly.signed_area().abs() < EPS {
                continue;
            }
            part = part.difference(&MultiPolygon::new(vec![hole_poly]));
        }

        merged = Some(match merged {
            Some(acc) => acc.union(&part),
            None => part,
        });
    }

    merged.unwrap_or_else(|| MultiPolygon::new(vec![]))
}

/// Helper: sign of a polygon's exterior orientation
trait ExteriorSign {
    fn exterior_signed_area_sign(&self) -> f64;
}

impl ExteriorSign for Polygon<f64> {
    fn exterior_signed_area_sign(&self) -> f64 {
        let shell = Polygon::new(self.exterior().clone(), vec![]);
        shell.signed_area().signum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::polygon;

    fn square(size: f64) -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: size, y: 0.0),
            (x: size, y: size),
            (x: 0.0, y: size),
            (x: 0.0, y: 0.0),
        ]
    }

    #[test]
    fn test_square_grows_with_sharp_corners() {
        let mp = MultiPolygon::new(vec![square(10.0)]);
        let grown = buffer_multi_polygon(&mp, 1.0);

        // Mitre joins keep corners square: (10 + 2)^2
        assert_relative_eq!(grown.unsigned_area(), 144.0, epsilon = 1e-9);
    }

    #[test]
    fn test_square_erodes() {
        let mp = MultiPolygon::new(vec![square(10.0)]);
        let shrunk = buffer_multi_polygon(&mp, -1.0);

        assert_relative_eq!(shrunk.unsigned_area(), 64.0, epsilon = 1e-9);
    }

    #[test]
    fn test_dilate_erode_roundtrip() {
        let mp = MultiPolygon::new(vec![square(10.0)]);
        let back = buffer_multi_polygon(&buffer_multi_polygon(&mp, 0.5), -0.5);

        assert_relative_eq!(back.unsigned_area(), 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_over_erosion_collapses() {
        let mp = MultiPolygon::new(vec![square(1.0)]);
        let gone = buffer_multi_polygon(&mp, -2.0);

        assert!(gone.unsigned_area() < 1e-9);
    }

    #[test]
    fn test_hole_preserved_and_shrunk() {
        let with_hole = Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 10.0),
                (0.0, 10.0),
                (0.0, 0.0),
            ]),
            vec![LineString::from(vec![
                (4.0, 4.0),
                (6.0, 4.0),
                (6.0, 6.0),
                (4.0, 6.0),
                (4.0, 4.0),
            ])],
        );
        let mp = MultiPolygon::new(vec![with_hole]);

        let grown = buffer_multi_polygon(&mp, 0.5);

        // Exterior 11x11, hole shrinks to 1x1: 121 - 1
        assert_relative_eq!(grown.unsigned_area(), 120.0, epsilon = 1e-6);
    }
}
