//! # Cuencas Delineation
//!
//! Computes the drainage catchment upstream of a geographic point from a
//! hierarchical basin-boundary dataset (HydroBASINS-style linked records)
//! and a continental flow-direction/accumulation raster pair
//! (HydroSHEDS-style D8 grids).
//!
//! The engine combines two strategies per request:
//! - a **basin graph search** walking pre-delineated sub-basins across
//!   subdivision levels to assemble every unit draining to the point's
//!   containing basin;
//! - a **grid flood fill** following inverse flow direction cell by cell
//!   when the hierarchical resolution is insufficient, restricted to the
//!   point's basin remnant.
//!
//! A mode selector compares flow accumulation at the pour point against
//! the directly-contributing upstream units to decide which combination to
//! trust, and the reconciler merges the boundaries and dissolves seam
//! slivers.
//!
//! The engine is synchronous and single-threaded per request; dataset
//! handles are scoped to one call and nothing is shared across requests.
//!
//! ```no_run
//! use cuencas_delineation::{delineate_feature, DelineateParams};
//! use geo_types::Point;
//!
//! let feature = delineate_feature(
//!     std::path::Path::new("./data"),
//!     Point::new(-114.81376, 32.49434),
//!     &DelineateParams::default(),
//!     "Feature",
//! )?;
//! # Ok::<(), cuencas_delineation::DelineationError>(())
//! ```

pub mod basin_search;
pub mod dataset;
pub mod delineate;
pub mod error;
pub mod flood_fill;
pub mod grid;
pub mod mode;
pub mod offset;
pub mod polygonize;
pub mod reconcile;
pub mod region;

pub use dataset::{BasinLayer, DrainageUnit, LookupRow, Region};
pub use delineate::{delineate, delineate_feature, DelineateParams};
pub use error::{DelineationError, Result};
pub use flood_fill::{flood_fill_catchment, CatchmentMask, MAX_DEPTH};
pub use grid::{AccumulationGrid, FlowGrid, DIR_NODATA, DIR_SINK};
pub use mode::{select_mode, DelineationMode};
pub use region::{locate_basin_region, locate_grid_region};
