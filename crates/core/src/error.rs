//! Error types for cuencas

use thiserror::Error;

/// Main error type for cuencas core operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: i64,
        col: i64,
        rows: usize,
        cols: usize,
    },

    #[error("Window out of bounds: offset ({col}, {row}) size {width}x{height} in raster of size ({rows}, {cols})")]
    WindowOutOfBounds {
        col: i64,
        row: i64,
        width: usize,
        height: usize,
        rows: usize,
        cols: usize,
    },

    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for cuencas core operations
pub type Result<T> = std::result::Result<T, Error>;
