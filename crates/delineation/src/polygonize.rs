//! Catchment mask polygonization
//!
//! Converts the flood fill's visited-cell set into geometry: the cells are
//! rasterized over their bounding extent, the foreground/background
//! boundary is walked into closed rings, and every ring becomes a filled
//! polygon before the final union. Unioning the rings as filled polygons
//! deliberately swallows interior holes, matching the reference behavior
//! of unioning each emitted ring separately.

use crate::flood_fill::CatchmentMask;
use cuencas_core::GeoTransform;
use geo::algorithm::{Area, BooleanOps};
use geo_types::{LineString, MultiPolygon, Polygon};
use ndarray::Array2;
use std::collections::BTreeMap;

/// Convert a catchment mask into a single (possibly multi-part) polygon in
/// geographic coordinates. Returns `None` for an empty mask or when every
/// ring degenerates.
pub fn mask_to_polygon(
    mask: &CatchmentMask,
    transform: &GeoTransform,
) -> Option<MultiPolygon<f64>> {
    let (min_col, min_row, max_col, max_row) = mask.bounds()?;

    let rows = (max_row - min_row + 1) as usize;
    let cols = (max_col - min_col + 1) as usize;

    let mut grid = Array2::<u8>::zeros((rows, cols));
    for &(col, row) in mask.iter() {
        grid[((row - min_row) as usize, (col - min_col) as usize)] = 1;
    }

    // Local transform anchored at the mask extent's upper-left corner
    let (origin_x, origin_y) = transform.cell_to_geo_corner(min_col, min_row);
    let local = GeoTransform::new(
        origin_x,
        origin_y,
        transform.pixel_width,
        transform.pixel_height,
    );

    let mut merged: Option<MultiPolygon<f64>> = None;

    for ring in boundary_rings(&grid) {
        let coords: Vec<(f64, f64)> = ring
            .iter()
            .map(|&(vx, vy)| {
                (
                    local.origin_x + vx as f64 * local.pixel_width,
                    local.origin_y + vy as f64 * local.pixel_height,
                )
            })
            .collect();

        let polygon = Polygon::new(LineString::from(coords), vec![]);
        if polygon.unsigned_area() <= 0.0 {
            continue;
        }

        let part = MultiPolygon::new(vec![polygon]);
        merged = Some(match merged {
            Some(acc) => acc.union(&part),
            None => part,
        });
    }

    merged.filter(|mp| mp.unsigned_area() > 0.0)
}

/// Extract all closed boundary rings of the foreground cells.
///
/// Vertices are lattice points in cell units; each boundary edge is emitted
/// directed so the foreground lies on a consistent side, and rings are
/// stitched by preferring the sharpest consistent turn at shared corners,
/// which keeps diagonally-touching regions in separate rings. Traversal
/// order is deterministic (sorted adjacency, smallest start vertex first).
fn boundary_rings(grid: &Array2<u8>) -> Vec<Vec<(i64, i64)>> {
    let (rows, cols) = grid.dim();

    let fg = |r: isize, c: isize| -> bool {
        r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols && grid[(r as usize, c as usize)] != 0
    };

    // Directed edges: foreground cell boundary traversed with the cell on
    // the same side everywhere.
    let mut edges: BTreeMap<(i64, i64), Vec<(i64, i64)>> = BTreeMap::new();
    let mut push = |from: (i64, i64), to: (i64, i64)| {
        edges.entry(from).or_default().push(to);
    };

    for r in 0..rows as isize {
        for c in 0..cols as isize {
            if !fg(r, c) {
                continue;
            }
            let (x, y) = (c as i64, r as i64);
            if !fg(r - 1, c) {
                push((x, y), (x + 1, y)); // top edge, eastward
            }
            if !fg(r, c + 1) {
                push((x + 1, y), (x + 1, y + 1)); // right edge, southward
            }
            if !fg(r + 1, c) {
                push((x + 1, y + 1), (x, y + 1)); // bottom edge, westward
            }
            if !fg(r, c - 1) {
                push((x, y + 1), (x, y)); // left edge, northward
            }
        }
    }

    for ends in edges.values_mut() {
        ends.sort_unstable();
    }

    let mut rings = Vec::new();

    loop {
        // Smallest remaining start vertex keeps traversal deterministic
        let Some((&start, _)) = edges.iter().find(|(_, ends)| !ends.is_empty()) else {
            break;
        };

        let first = edges.get_mut(&start).and_then(|ends| {
            if ends.is_empty() {
                None
            } else {
                Some(ends.remove(0))
            }
        });
        let Some(mut current) = first else { break };

        let mut ring = vec![start, current];
        let mut prev = start;

        while current != start {
            let incoming = (current.0 - prev.0, current.1 - prev.1);

            let Some(ends) = edges.get_mut(&current) else {
                break; // malformed boundary; drop the partial ring
            };
            if ends.is_empty() {
                break;
            }

            // Sharpest turn with the region kept on the traversal side:
            // maximize the z component of incoming x outgoing.
            let (best_idx, _) = ends
                .iter()
                .enumerate()
                .map(|(i, &(ex, ey))| {
                    let out = (ex - current.0, ey - current.1);
                    (i, incoming.0 * out.1 - incoming.1 * out.0)
                })
                .max_by_key(|&(_, cross)| cross)
                .unwrap_or((0, 0));

            let next = ends.remove(best_idx);

            // Merge collinear runs as we go
            let out = (next.0 - current.0, next.1 - current.1);
            if out == incoming {
                *ring.last_mut().unwrap() = next;
            } else {
                ring.push(next);
            }

            prev = current;
            current = next;
        }

        if current == start && ring.len() > 3 {
            rings.push(ring);
        }
    }

    rings
}
