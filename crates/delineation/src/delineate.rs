//! The delineation entry point
//!
//! Wires the components together for one request: locate the dataset
//! partitions, find the point's basin at the finest level, select the
//! strategy, run the hierarchical search and/or the grid flood fill, and
//! reconcile the boundary. The engine holds no state across requests;
//! every handle is scoped to this call.

use crate::basin_search::find_contributing_basins;
use crate::dataset::{BasinLayer, DrainageUnit, LookupRow, Region};
use crate::error::{DelineationError, Result};
use crate::flood_fill::flood_fill_catchment;
use crate::mode::{select_mode, DelineationMode};
use crate::reconcile::{reconcile, BUFFER_EPS, SIMPLIFY_TOLERANCE};
use crate::region::{locate_basin_region, locate_grid_region};
use geo::algorithm::BooleanOps;
use geo_types::{Geometry, MultiPolygon, Point};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Parameters of a delineation request
#[derive(Debug, Clone)]
pub struct DelineateParams {
    /// Finest basin subdivision level to search
    pub max_level: u8,
    /// Grid cell size in arc-seconds (selects the raster resolution)
    pub cell_size: u32,
    /// Exclude basins that never reach their main basin's outlet
    pub omit_sinks: bool,
    /// Douglas-Peucker tolerance for the flood-fill boundary, degrees
    pub simplify_tolerance: f64,
    /// Sliver-dissolve buffer epsilon, degrees
    pub buffer_eps: f64,
}

impl Default for DelineateParams {
    fn default() -> Self {
        Self {
            max_level: 7,
            cell_size: 15,
            omit_sinks: true,
            simplify_tolerance: SIMPLIFY_TOLERANCE,
            buffer_eps: BUFFER_EPS,
        }
    }
}

/// Delineate the catchment upstream of a point.
///
/// Returns the boundary as a `Polygon` when single-part, `MultiPolygon`
/// otherwise. All failure modes are typed; see `DelineationError`.
pub fn delineate(root: &Path, point: Point<f64>, params: &DelineateParams) -> Result<Geometry<f64>> {
    let basin_region = locate_basin_region(root, point, params.cell_size)?;
    let (grid_region, dir_grid) = locate_grid_region(root, point, params.cell_size)?;
    info!(
        basin_region = basin_region.code(),
        grid_region = grid_region.code(),
        "regions located"
    );

    let finest = basin_region.load_layer(params.max_level)?;
    let unit = finest
        .find_containing(point)
        .ok_or(DelineationError::BasinNotFound {
            lon: point.x(),
            lat: point.y(),
            level: params.max_level,
        })?;
    debug!(unit = unit.unit_id, "containing basin found");

    // The remnant: the point's own finest unit, which the hierarchical
    // search never includes by itself.
    let remnant = unit.geometry.clone();

    let acc_grid = grid_region.open_accumulation_grid()?;
    let mode = select_mode(&finest, unit, &acc_grid, point)?;
    info!(?mode, "delineation mode selected");

    let contributing = contributing_union(&basin_region, &finest, unit, params)?;

    let (basin_result, flood_result) = match mode {
        DelineationMode::Traditional => {
            (Some(join(contributing, remnant)), None)
        }
        DelineationMode::Hybrid => {
            let mask = Geometry::MultiPolygon(remnant.clone());
            match flood_fill_catchment(&dir_grid, point, Some(&mask)) {
                Some(flood) => (contributing, Some(flood)),
                None => {
                    // Soft failure: recorded, and the hierarchical
                    // composition stands in.
                    warn!("flood fill failed; falling back to hierarchical result");
                    (Some(join(contributing, remnant)), None)
                }
            }
        }
    };

    let merged = reconcile(
        basin_result.as_ref(),
        flood_result.as_ref(),
        params.simplify_tolerance,
        params.buffer_eps,
    )
    .ok_or(DelineationError::BasinNotFound {
        lon: point.x(),
        lat: point.y(),
        level: params.max_level,
    })?;

    let mut parts = merged.0;
    Ok(if parts.len() == 1 {
        Geometry::Polygon(parts.remove(0))
    } else {
        Geometry::MultiPolygon(MultiPolygon::new(parts))
    })
}

/// Delineate and wrap the boundary as GeoJSON.
///
/// `feature_type == "Feature"` yields a single Feature with an empty
/// properties object; any other value yields a FeatureCollection holding
/// exactly that feature.
pub fn delineate_feature(
    root: &Path,
    point: Point<f64>,
    params: &DelineateParams,
    feature_type: &str,
) -> Result<geojson::GeoJson> {
    let geometry = delineate(root, point, params)?;

    let feature = geojson::Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(&geometry))),
        id: None,
        properties: Some(geojson::JsonObject::new()),
        foreign_members: None,
    };

    Ok(if feature_type == "Feature" {
        geojson::GeoJson::Feature(feature)
    } else {
        geojson::GeoJson::FeatureCollection(geojson::FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        })
    })
}

/// Union of all contributing sub-basins across levels, or `None` when
/// nothing contributes (headwater points, missing lookup rows).
fn contributing_union(
    region: &Region,
    finest: &BasinLayer,
    unit: &DrainageUnit,
    params: &DelineateParams,
) -> Result<Option<MultiPolygon<f64>>> {
    let lookup = region.load_lookup()?;

    let Some(point_row) = resolve_lookup_row(&lookup, unit, params.max_level) else {
        debug!(unit = unit.unit_id, "no lookup row for unit; empty contribution");
        return Ok(None);
    };

    let mut layers: HashMap<u8, BasinLayer> = HashMap::new();
    for level in 2..params.max_level {
        layers.insert(level, region.load_layer(level)?);
    }
    // Reuse the already-loaded finest layer
    layers.insert(
        params.max_level,
        BasinLayer::new(params.max_level, finest.iter().cloned().collect()),
    );

    let contributions = find_contributing_basins(
        &lookup,
        &layers,
        point_row,
        params.max_level,
        params.omit_sinks,
    );

    Ok(contributions
        .into_iter()
        .flatten()
        .reduce(|acc, g| acc.union(&g)))
}

/// Resolve the point unit's level-0 lookup row: by unit id first, then by
/// code-and-main-basin equality at the finest level.
fn resolve_lookup_row<'a>(
    lookup: &'a [LookupRow],
    unit: &DrainageUnit,
    max_level: u8,
) -> Option<&'a LookupRow> {
    lookup
        .iter()
        .find(|row| row.unit_id == unit.unit_id)
        .or_else(|| {
            lookup.iter().find(|row| {
                row.code_at(max_level) == Some(unit.code) && row.main_basin == unit.main_basin
            })
        })
}

fn join(contributing: Option<MultiPolygon<f64>>, remnant: MultiPolygon<f64>) -> MultiPolygon<f64> {
    match contributing {
        Some(c) => c.union(&remnant),
        None => remnant,
    }
}
