//! Main Raster type

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::{Array2, ArrayView2};

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a 2D grid with an associated
/// affine transform and optional no-data value. Windowed reads use GDAL-style
/// (col, row) offsets and are bounds-checked: a window that leaves the grid
/// is an error, which the flood fill relies on for its soft-failure contract.
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// Affine transformation
    transform: GeoTransform,
    /// No-data value
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a raster from existing row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self {
            data: array,
            transform: GeoTransform::default(),
            nodata: None,
        })
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row: row as i64,
                col: col as i64,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row: row as i64,
                col: col as i64,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Sample the cell at signed (col, row) indices.
    ///
    /// Negative or out-of-extent indices are errors, mirroring a windowed
    /// read of size 1x1.
    pub fn sample(&self, col: i64, row: i64) -> Result<T> {
        if col < 0 || row < 0 || col as usize >= self.cols() || row as usize >= self.rows() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(self.data[(row as usize, col as usize)])
    }

    /// Read a window of cells with GDAL-style (col, row) offset.
    ///
    /// The whole window must lie inside the raster.
    pub fn window(&self, col: i64, row: i64, width: usize, height: usize) -> Result<Array2<T>> {
        let (rows, cols) = self.shape();
        if col < 0
            || row < 0
            || col as usize + width > cols
            || row as usize + height > rows
        {
            return Err(Error::WindowOutOfBounds {
                col,
                row,
                width,
                height,
                rows,
                cols,
            });
        }

        let view = self.data.slice(ndarray::s![
            row as usize..row as usize + height,
            col as usize..col as usize + width
        ]);
        Ok(view.to_owned())
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Convert a geographic coordinate to signed cell indices
    pub fn geo_to_cell(&self, x: f64, y: f64) -> (i64, i64) {
        self.transform.geo_to_cell(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<u8> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f64> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert_eq!(raster.sample(5, 5).unwrap(), 42.0);
        assert!(raster.sample(-1, 5).is_err());
        assert!(raster.sample(5, 10).is_err());
    }

    #[test]
    fn test_window_read() {
        let mut raster: Raster<u8> = Raster::new(4, 4);
        for row in 0..4 {
            for col in 0..4 {
                raster.set(row, col, (row * 4 + col) as u8).unwrap();
            }
        }

        let win = raster.window(1, 1, 3, 3).unwrap();
        assert_eq!(win.dim(), (3, 3));
        assert_eq!(win[(0, 0)], 5);
        assert_eq!(win[(2, 2)], 15);

        // Any part off-grid is an error
        assert!(raster.window(-1, 0, 3, 3).is_err());
        assert!(raster.window(2, 2, 3, 3).is_err());
    }
}
