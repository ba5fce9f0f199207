//! Flow-direction and accumulation grid accessors
//!
//! HydroSHEDS D8 grids encode, per cell, which one of its 8 neighbors the
//! cell drains into, as a bit flag: 1=E, 2=SE, 4=S, 8=SW, 16=W, 32=NW,
//! 64=N, 128=NE. 0 marks a sink, 247 marks ocean/no-data.

use cuencas_core::io::read_geotiff;
use cuencas_core::{GeoTransform, Raster, Result};
use ndarray::Array2;
use std::path::Path;

/// Ocean / off-grid sentinel in HydroSHEDS direction grids
pub const DIR_NODATA: u8 = 247;

/// A cell that drains nowhere (inland sink)
pub const DIR_SINK: u8 = 0;

/// Direction code a 3x3-window cell must carry to drain into the window
/// center, indexed by (window row, window col). The center entry is a
/// placeholder and is never matched (sink cells carry 0 but the center is
/// excluded from neighbor checks).
///
/// Example: the cell at window position (0, 0) sits north-west of the
/// center, so it contributes exactly when it drains south-east (code 2).
pub const INFLOW_CODES: [[u8; 3]; 3] = [
    [2, 4, 8],     //
    [1, 0, 16],    //
    [128, 64, 32], //
];

/// Read-only accessor over a flow-direction raster.
#[derive(Debug)]
pub struct FlowGrid {
    raster: Raster<u8>,
}

impl FlowGrid {
    /// Open a direction grid from a GeoTIFF file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            raster: read_geotiff(path)?,
        })
    }

    /// Wrap an in-memory raster
    pub fn from_raster(raster: Raster<u8>) -> Self {
        Self { raster }
    }

    /// The grid's affine transform
    pub fn transform(&self) -> &GeoTransform {
        self.raster.transform()
    }

    /// Cell indices (col, row) containing a geographic coordinate
    pub fn cell_at(&self, lon: f64, lat: f64) -> (i64, i64) {
        self.raster.geo_to_cell(lon, lat)
    }

    /// Direction code at signed (col, row) indices
    pub fn sample(&self, col: i64, row: i64) -> Result<u8> {
        self.raster.sample(col, row)
    }

    /// The 3x3 direction-code window centered on (col, row).
    ///
    /// Errors when any part of the window leaves the grid; the flood fill
    /// converts that into its soft failure.
    pub fn window3(&self, col: i64, row: i64) -> Result<Array2<u8>> {
        self.raster.window(col - 1, row - 1, 3, 3)
    }
}

/// Read-only accessor over a flow-accumulation raster.
#[derive(Debug)]
pub struct AccumulationGrid {
    raster: Raster<f64>,
}

impl AccumulationGrid {
    /// Open an accumulation grid from a GeoTIFF file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            raster: read_geotiff(path)?,
        })
    }

    /// Wrap an in-memory raster
    pub fn from_raster(raster: Raster<f64>) -> Self {
        Self { raster }
    }

    /// The grid's affine transform
    pub fn transform(&self) -> &GeoTransform {
        self.raster.transform()
    }

    /// Cell indices (col, row) containing a geographic coordinate
    pub fn cell_at(&self, lon: f64, lat: f64) -> (i64, i64) {
        self.raster.geo_to_cell(lon, lat)
    }

    /// Accumulation value at signed (col, row) indices
    pub fn sample(&self, col: i64, row: i64) -> Result<f64> {
        self.raster.sample(col, row)
    }
}
