//! Grid flood fill: enumerate every cell draining to a pour point
//!
//! Follows inverse flow direction outward from the pour cell using an
//! explicit work stack plus a visited set, never native recursion, so the
//! depth bound is enforceable regardless of host stack limits. Expansion
//! past the depth bound stops silently along that branch; it is a guard
//! against degenerate direction data, not an expected terminal condition.

use crate::error::Result;
use crate::grid::{FlowGrid, INFLOW_CODES};
use crate::polygonize;
use geo::algorithm::Contains;
use geo_types::{Geometry, MultiPolygon, Point};
use std::collections::HashSet;
use tracing::debug;

/// Maximum expansion depth from the pour cell
pub const MAX_DEPTH: u32 = 950;

/// The working cell set built by one flood-fill invocation. Cells are keyed
/// by absolute (col, row) grid indices and only ever added.
#[derive(Debug, Default)]
pub struct CatchmentMask {
    cells: HashSet<(i64, i64)>,
}

impl CatchmentMask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a cell; returns false when it was already present
    pub fn insert(&mut self, col: i64, row: i64) -> bool {
        self.cells.insert((col, row))
    }

    pub fn contains(&self, col: i64, row: i64) -> bool {
        self.cells.contains(&(col, row))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(i64, i64)> {
        self.cells.iter()
    }

    /// Inclusive cell-index bounds as (min_col, min_row, max_col, max_row)
    pub fn bounds(&self) -> Option<(i64, i64, i64, i64)> {
        let mut iter = self.cells.iter();
        let &(x0, y0) = iter.next()?;
        Some(iter.fold((x0, y0, x0, y0), |(xmin, ymin, xmax, ymax), &(x, y)| {
            (xmin.min(x), ymin.min(y), xmax.max(x), ymax.max(y))
        }))
    }
}

/// Delineate the catchment upstream of a pour point directly from the flow
/// direction grid.
///
/// An optional `mask` restricts expansion to cells whose corner coordinate
/// falls inside it, keeping the fill within a known basin remnant.
///
/// Soft-fails to `None` when any grid read or coordinate conversion errors
/// (the pour point sitting at the grid edge is the common case), or when
/// nothing polygonizable is visited. The caller decides how to fall back.
pub fn flood_fill_catchment(
    grid: &FlowGrid,
    pour_point: Point<f64>,
    mask: Option<&Geometry<f64>>,
) -> Option<MultiPolygon<f64>> {
    let (col, row) = grid.cell_at(pour_point.x(), pour_point.y());

    let mut visited = CatchmentMask::new();
    if let Err(e) = fill(grid, col, row, mask, &mut visited) {
        debug!(error = %e, cells = visited.len(), "flood fill aborted");
        return None;
    }

    debug!(cells = visited.len(), "flood fill complete");
    polygonize::mask_to_polygon(&visited, grid.transform())
}

fn fill(
    grid: &FlowGrid,
    start_col: i64,
    start_row: i64,
    mask: Option<&Geometry<f64>>,
    visited: &mut CatchmentMask,
) -> Result<()> {
    let mut stack: Vec<(i64, i64, u32)> = vec![(start_col, start_row, 0)];

    while let Some((col, row, depth)) = stack.pop() {
        // A cell can be scheduled by several downstream neighbors before
        // its first visit; process it once.
        if !visited.insert(col, row) {
            continue;
        }

        let window = grid.window3(col, row)?;

        if depth >= MAX_DEPTH {
            continue;
        }

        for (i, row_codes) in INFLOW_CODES.iter().enumerate() {
            for (j, &inflow) in row_codes.iter().enumerate() {
                if i == 1 && j == 1 {
                    continue; // center cell, not a neighbor
                }
                if window[(i, j)] != inflow {
                    continue;
                }

                let ncol = col + j as i64 - 1;
                let nrow = row + i as i64 - 1;

                if visited.contains(ncol, nrow) {
                    continue;
                }

                if let Some(mask) = mask {
                    let (lon, lat) = grid.transform().cell_to_geo_corner(ncol, nrow);
                    if !mask.contains(&Point::new(lon, lat)) {
                        continue;
                    }
                }

                stack.push((ncol, nrow, depth + 1));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuencas_core::{GeoTransform, Raster};
    use geo::algorithm::Area;
    use geo_types::polygon;

    /// Build a grid where every cell in `row 1, cols 1..=east` flows east
    /// (code 1) and everything else is a sink (0).
    fn east_strip(rows: usize, cols: usize) -> FlowGrid {
        let mut raster: Raster<u8> = Raster::new(rows, cols);
        raster.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        for col in 1..cols - 1 {
            raster.set(1, col, 1).unwrap();
        }
        FlowGrid::from_raster(raster)
    }

    #[test]
    fn test_linear_catchment() {
        // 3x10 grid, middle row flows east; pour at (8, 1). Upstream cells
        // are cols 1..=8 in row 1.
        let grid = east_strip(3, 10);

        let mut visited = CatchmentMask::new();
        fill(&grid, 8, 1, None, &mut visited).unwrap();

        assert_eq!(visited.len(), 8);
        assert!(visited.contains(1, 1));
        assert!(visited.contains(8, 1));
        assert!(!visited.contains(9, 1));
        assert!(!visited.contains(4, 0));
    }

    #[test]
    fn test_depth_bound() {
        // A strip much longer than the depth bound: expansion stops at
        // MAX_DEPTH hops from the pour cell.
        let len = MAX_DEPTH as usize + 300;
        let grid = east_strip(3, len + 2);

        let mut visited = CatchmentMask::new();
        fill(&grid, len as i64, 1, None, &mut visited).unwrap();

        assert_eq!(visited.len(), MAX_DEPTH as usize + 1);
    }

    #[test]
    fn test_cyclic_directions_terminate() {
        // Two cells pointing at each other: (1,1) flows E, (2,1) flows W.
        // The visited set must stop the ping-pong.
        let mut raster: Raster<u8> = Raster::new(3, 4);
        raster.set_transform(GeoTransform::new(0.0, 3.0, 1.0, -1.0));
        raster.set(1, 1, 1).unwrap(); // E
        raster.set(1, 2, 16).unwrap(); // W
        let grid = FlowGrid::from_raster(raster);

        let mut visited = CatchmentMask::new();
        fill(&grid, 2, 1, None, &mut visited).unwrap();

        assert_eq!(visited.len(), 2);
    }

    #[test]
    fn test_edge_read_soft_fails() {
        // Pour cell on the grid border: the 3x3 window leaves the grid and
        // the whole fill reports None.
        let grid = east_strip(3, 10);
        let result = flood_fill_catchment(&grid, Point::new(0.5, 1.5), None);
        assert!(result.is_none());
    }

    #[test]
    fn test_mask_restricts_expansion() {
        let grid = east_strip(3, 10);

        // Mask covering only cols >= 5 of the strip
        let mask = Geometry::Polygon(polygon![
            (x: 5.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 3.0),
            (x: 5.0, y: 3.0),
            (x: 5.0, y: 0.0),
        ]);

        let mut visited = CatchmentMask::new();
        fill(&grid, 8, 1, Some(&mask), &mut visited).unwrap();

        assert!(visited.contains(8, 1));
        assert!(visited.contains(6, 1));
        assert!(!visited.contains(3, 1), "mask must stop expansion");
    }

    #[test]
    fn test_catchment_polygon_area() {
        // The full strip catchment covers 8 unit cells
        let grid = east_strip(3, 10);
        let polygon = flood_fill_catchment(&grid, Point::new(8.5, 1.5), None).unwrap();
        assert!((polygon.unsigned_area() - 8.0).abs() < 1e-9);
    }
}
