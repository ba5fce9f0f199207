//! Geometry reconciliation
//!
//! Merges the hierarchical basin result with the flood-fill result. The
//! flood-fill polygon is simplified first (its boundary is cell-resolution
//! staircase), then unioned with the basin polygons; the seam between two
//! independently derived boundaries leaves slivers, dissolved by a
//! buffer-out/buffer-in pass with mitre joins.

use crate::offset::buffer_multi_polygon;
use geo::algorithm::{Area, BooleanOps, Simplify};
use geo_types::MultiPolygon;
use tracing::debug;

/// Douglas-Peucker tolerance applied to the flood-fill boundary, in degrees
pub const SIMPLIFY_TOLERANCE: f64 = 0.0041;

/// Buffer epsilon of the sliver-dissolve pass, in degrees
pub const BUFFER_EPS: f64 = 0.005;

/// Merge basin-graph output and flood-fill output into the final boundary.
///
/// With both inputs the flood polygon is simplified and unioned in, and the
/// dissolve pass runs; a single input passes through (the dissolve pass
/// still runs when that input is the flood fill, whose rasterized boundary
/// is the sliver source). Returns `None` when no input, or only degenerate
/// geometry, is available.
pub fn reconcile(
    basin: Option<&MultiPolygon<f64>>,
    flood: Option<&MultiPolygon<f64>>,
    simplify_tolerance: f64,
    buffer_eps: f64,
) -> Option<MultiPolygon<f64>> {
    let simplified = flood.map(|f| f.simplify(&simplify_tolerance));

    let merged = match (basin, &simplified) {
        (Some(b), Some(s)) => b.union(s),
        (Some(b), None) => b.clone(),
        (None, Some(s)) => s.clone(),
        (None, None) => return None,
    };

    let cleaned = if simplified.is_some() {
        let dissolved = buffer_multi_polygon(
            &buffer_multi_polygon(&merged, buffer_eps),
            -buffer_eps,
        );
        debug!(
            before = merged.unsigned_area(),
            after = dissolved.unsigned_area(),
            "sliver dissolve"
        );
        dissolved
    } else {
        merged
    };

    if cleaned.unsigned_area() > 0.0 {
        Some(cleaned)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::{polygon, Polygon};

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]
    }

    /// A right-hand square whose west edge is a fine staircase instead of a
    /// straight line, leaving sliver-scale notches against its neighbor.
    fn jagged_square(x0: f64, y0: f64, size: f64, teeth: usize) -> Polygon<f64> {
        let step = size / teeth as f64;
        let depth = 0.002;

        let mut coords = vec![(x0, y0)];
        coords.push((x0 + size, y0));
        coords.push((x0 + size, y0 + size));
        coords.push((x0, y0 + size));
        // staircase back down the west edge
        for i in (0..teeth).rev() {
            let y = y0 + i as f64 * step;
            coords.push((x0 + if i % 2 == 0 { 0.0 } else { depth }, y + step));
            coords.push((x0 + if i % 2 == 0 { 0.0 } else { depth }, y));
        }
        coords.push((x0, y0));
        Polygon::new(coords.into(), vec![])
    }

    #[test]
    fn test_single_basin_passthrough() {
        let basin = MultiPolygon::new(vec![square(0.0, 0.0, 1.0)]);
        let out = reconcile(Some(&basin), None, SIMPLIFY_TOLERANCE, BUFFER_EPS).unwrap();

        // No flood contribution: geometry is untouched
        assert_relative_eq!(out.unsigned_area(), 1.0);
        assert_eq!(out.0[0].exterior().0.len(), basin.0[0].exterior().0.len());
    }

    #[test]
    fn test_single_flood_is_cleaned() {
        let flood = MultiPolygon::new(vec![square(0.0, 0.0, 1.0)]);
        let out = reconcile(None, Some(&flood), SIMPLIFY_TOLERANCE, BUFFER_EPS).unwrap();

        assert_relative_eq!(out.unsigned_area(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_nothing_in_nothing_out() {
        assert!(reconcile(None, None, SIMPLIFY_TOLERANCE, BUFFER_EPS).is_none());
    }

    #[test]
    fn test_union_dissolves_seam_slivers() {
        // Basin on the left, jagged flood result on the right sharing the
        // x = 1 boundary. The union has sliver notches along the seam; the
        // dissolve pass must remove them without materially changing area.
        let basin = MultiPolygon::new(vec![square(0.0, 0.0, 1.0)]);
        let flood = MultiPolygon::new(vec![jagged_square(1.0, 0.0, 1.0, 50)]);

        let naive_area = basin.union(&flood).unsigned_area();
        let out = reconcile(Some(&basin), Some(&flood), 0.0, BUFFER_EPS).unwrap();

        assert_relative_eq!(out.unsigned_area(), naive_area, epsilon = 0.02);

        // The result is one piece: the seam fused
        assert_eq!(out.0.len(), 1);
    }

    #[test]
    fn test_degenerate_output_is_none() {
        // A zero-area ring (collinear vertices) must not come back as a
        // successful boundary
        let degenerate = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 0.5, y: 0.0),
            (x: 0.0, y: 0.0),
        ]]);

        assert!(reconcile(None, Some(&degenerate), SIMPLIFY_TOLERANCE, BUFFER_EPS).is_none());
    }
}
