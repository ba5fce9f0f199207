//! Error taxonomy for the delineation engine

use thiserror::Error;

/// Errors surfaced by a delineation request.
///
/// `RegionNotFound`, `GridRegionNotFound` and `BasinNotFound` are terminal
/// for the request. A flood-fill failure is soft: it is carried as data by
/// the engine (the hierarchical result stands in) and only becomes this
/// error when no fallback geometry exists.
#[derive(Error, Debug)]
pub enum DelineationError {
    #[error("point ({lon}, {lat}) is outside every known basin region")]
    RegionNotFound { lon: f64, lat: f64 },

    #[error("no flow-direction grid covers point ({lon}, {lat})")]
    GridRegionNotFound { lon: f64, lat: f64 },

    #[error("no basin contains point ({lon}, {lat}) at level {level}")]
    BasinNotFound { lon: f64, lat: f64, level: u8 },

    #[error("grid flood fill failed: {0}")]
    FloodFillFailed(String),

    #[error("dataset read error: {0}")]
    Dataset(#[from] cuencas_core::Error),
}

/// Result type alias for delineation operations
pub type Result<T> = std::result::Result<T, DelineationError>;
