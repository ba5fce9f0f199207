//! # Cuencas Core
//!
//! Core types and I/O for the cuencas watershed delineation engine.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced raster grid with windowed access
//! - `GeoTransform`: affine transformation for georeferencing
//! - `Feature` / `FeatureCollection`: vector features over geo-types
//! - Native GeoTIFF and GeoJSON I/O

pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection};
}
