//! Region location: mapping a point to its continental dataset partition
//!
//! Two independent lookups, both driven by fixed bounding-box tables with a
//! containment/validation fallback:
//!
//! - the basin-vector partition, chosen by testing true polygon containment
//!   against candidate regions' level-1 layers in a priority order picked
//!   per longitude/latitude band;
//! - the flow-direction raster tile, chosen by bounding box and validated
//!   by sampling the point's cell (the ocean sentinel rejects a tile and
//!   the next candidate is tried).

use crate::dataset::Region;
use crate::error::{DelineationError, Result};
use crate::grid::{FlowGrid, DIR_NODATA};
use geo::algorithm::Contains;
use geo_types::Point;
use std::path::Path;
use tracing::debug;

/// Continental regions with basin-vector coverage, default priority order
const BASIN_REGIONS: [&str; 6] = ["as", "af", "eu", "na", "sa", "au"];

/// Ordered bounding-box rules for the flow-direction grids. Evaluated top
/// to bottom; the first match not excluded wins. Bounds are the original
/// dataset's seam heuristics, not exact continental outlines.
fn grid_region_for(lon: f64, lat: f64, exclude: &[&str]) -> Option<&'static str> {
    let rules: [(&str, bool); 7] = [
        ("ca", 6.0 < lat && lat < 38.0 && -118.0 < lon && lon < -61.0),
        ("sa", -56.0 < lat && lat < 15.0 && -93.0 < lon && lon < -32.0),
        ("na", 24.0 < lat && lat < 61.0 && -138.0 < lon && lon < -52.0),
        ("eu", 12.0 < lat && lat < 62.0 && -14.0 < lon && lon < 70.0),
        ("af", -35.0 < lat && lat < 38.0 && -19.0 < lon && lon < 55.0),
        ("as", -12.0 < lat && lat < 61.0 && 57.0 < lon && lon < 180.0),
        ("au", -56.0 < lat && lat < -10.0 && 112.0 < lon && lon < 180.0),
    ];

    rules
        .iter()
        .find(|(region, hit)| *hit && !exclude.contains(region))
        .map(|(region, _)| *region)
}

/// Priority ordering of basin-vector regions for a point. The bands bias
/// the search toward the most likely partition where continental bounding
/// boxes overlap.
fn basin_region_priority(lon: f64, lat: f64) -> &'static [&'static str] {
    if 90.0 < lon && lon < 190.0 && lat < 8.0 {
        &["au", "as"]
    } else if 57.0 < lon && lon < 155.0 && 7.0 < lat && lat < 55.0 {
        &["as", "eu", "au"]
    } else if -30.0 < lon && lon < 55.0 && lat < 40.0 {
        &["af", "eu"]
    } else if -25.0 < lon && lon < 70.0 && 12.0 < lat {
        &["eu", "af", "as"]
    } else if -82.0 < lon && lon < -34.0 && lat < 15.0 {
        &["sa", "na"]
    } else if -140.0 < lon && lon < -52.0 && 7.0 < lat && lat < 62.0 {
        &["na", "sa"]
    } else {
        &BASIN_REGIONS
    }
}

/// Resolve the basin-vector region containing a point.
///
/// Candidates are tried in priority order; the first whose level-1 layer
/// has a feature containing the point wins. A candidate whose layer cannot
/// be loaded is skipped (partially materialized dataset roots are common in
/// deployment), so an uncovered point surfaces as `RegionNotFound` rather
/// than a read error.
pub fn locate_basin_region(root: &Path, point: Point<f64>, cell_size: u32) -> Result<Region> {
    for code in basin_region_priority(point.x(), point.y()) {
        let region = Region::new(root, code, cell_size);
        let layer = match region.load_layer(1) {
            Ok(layer) => layer,
            Err(e) => {
                debug!(region = code, error = %e, "skipping basin region candidate");
                continue;
            }
        };

        if layer.iter().any(|unit| unit.geometry.contains(&point)) {
            debug!(region = code, "basin region located");
            return Ok(region);
        }
    }

    Err(DelineationError::RegionNotFound {
        lon: point.x(),
        lat: point.y(),
    })
}

/// Resolve the flow-direction raster tile covering a point.
///
/// Opens the bounding-box candidate and samples the point's cell; a missing
/// tile, an out-of-extent cell or the ocean sentinel rejects the candidate
/// and the next one is tried. Returns the opened grid together with its
/// region so the caller does not re-open it.
pub fn locate_grid_region(
    root: &Path,
    point: Point<f64>,
    cell_size: u32,
) -> Result<(Region, FlowGrid)> {
    let (lon, lat) = (point.x(), point.y());
    let mut rejected: Vec<&str> = Vec::new();

    while let Some(code) = grid_region_for(lon, lat, &rejected) {
        let region = Region::new(root, code, cell_size);

        match FlowGrid::open(region.dir_grid_path()) {
            Ok(grid) => {
                let (col, row) = grid.cell_at(lon, lat);
                match grid.sample(col, row) {
                    Ok(code_at_point) if code_at_point != DIR_NODATA => {
                        debug!(region = code, "grid region located");
                        return Ok((region, grid));
                    }
                    Ok(_) => {
                        debug!(region = code, "point falls on grid no-data; trying next tile")
                    }
                    Err(e) => {
                        debug!(region = code, error = %e, "point outside grid extent; trying next tile")
                    }
                }
            }
            Err(e) => debug!(region = code, error = %e, "cannot open grid tile; trying next"),
        }

        rejected.push(code);
    }

    Err(DelineationError::GridRegionNotFound { lon, lat })
}
