//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between cell coordinates (col, row) and geographic coordinates
/// (x, y):
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// For north-up grids `pixel_height` is negative: row indices grow southward
/// while latitude decreases. Rotation terms are not modeled; the HydroSHEDS
/// grids this engine consumes are always north-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell width (cell size in X direction)
    pub pixel_width: f64,
    /// Cell height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Create a new GeoTransform for a north-up grid
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Create from an upper-left corner and positive cell sizes.
    ///
    /// `pixel_height` is stored negated, matching the usual north-up layout.
    pub fn from_origin(west: f64, north: f64, cell_width: f64, cell_height: f64) -> Self {
        Self::new(west, north, cell_width, -cell_height)
    }

    /// Convert geographic coordinates to integer cell indices.
    ///
    /// The cell containing the coordinate, anchored at its upper-left
    /// corner. Indices may be negative or beyond the raster extent; bounds
    /// checks belong to the raster accessors.
    pub fn geo_to_cell(&self, x: f64, y: f64) -> (i64, i64) {
        let col = ((x - self.origin_x) / self.pixel_width).floor() as i64;
        let row = ((y - self.origin_y) / self.pixel_height).floor() as i64;
        (col, row)
    }

    /// Convert cell indices to the geographic coordinate of the cell's
    /// upper-left corner.
    pub fn cell_to_geo_corner(&self, col: i64, row: i64) -> (f64, f64) {
        let x = self.origin_x + col as f64 * self.pixel_width;
        let y = self.origin_y + row as f64 * self.pixel_height;
        (x, y)
    }

    /// Convert cell indices to the geographic coordinate of the cell center.
    pub fn cell_to_geo_center(&self, col: i64, row: i64) -> (f64, f64) {
        let x = self.origin_x + (col as f64 + 0.5) * self.pixel_width;
        let y = self.origin_y + (row as f64 + 0.5) * self.pixel_height;
        (x, y)
    }

    /// Get the cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Calculate the bounding box for a raster of given dimensions
    /// as (min_x, min_y, max_x, max_y).
    pub fn bounds(&self, cols: usize, rows: usize) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.cell_to_geo_corner(0, 0);
        let (x1, y1) = self.cell_to_geo_corner(cols as i64, rows as i64);

        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
