//! Delineation mode selection
//!
//! Decides whether the hierarchical basin result stands alone
//! ("traditional") or gets refined by the grid flood fill ("hybrid"), by
//! comparing flow accumulation at the pour point against the maximum
//! accumulation inside the directly-contributing upstream units.

use crate::dataset::{BasinLayer, DrainageUnit};
use crate::error::Result;
use crate::grid::AccumulationGrid;
use geo::algorithm::{BooleanOps, BoundingRect, Contains};
use geo_types::{MultiPolygon, Point};
use tracing::debug;

/// Delineation strategy for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelineationMode {
    /// Trust the hierarchical basin boundary as-is
    Traditional,
    /// Refine the point's basin remnant with the grid flood fill
    Hybrid,
}

/// Units feeding directly into `unit` on the same outlet chain
pub fn direct_upstream<'a>(layer: &'a BasinLayer, unit: &DrainageUnit) -> Vec<&'a DrainageUnit> {
    layer
        .iter()
        .filter(|u| u.next_down == unit.unit_id && u.next_sink == unit.next_sink)
        .collect()
}

/// Select the delineation mode for a point inside `unit`.
///
/// A headwater unit (no direct upstream contributors) is already maximally
/// fine: traditional. Otherwise, when the upstream units hold a cell with
/// accumulation strictly above the point's own, the hierarchical boundary
/// cannot resolve the mismatch at this granularity and the coarse result is
/// trusted as-is; ties and smaller maxima go hybrid.
pub fn select_mode(
    layer: &BasinLayer,
    unit: &DrainageUnit,
    acc: &AccumulationGrid,
    point: Point<f64>,
) -> Result<DelineationMode> {
    let upstream = direct_upstream(layer, unit);
    if upstream.is_empty() {
        debug!(unit = unit.unit_id, "headwater unit; traditional mode");
        return Ok(DelineationMode::Traditional);
    }

    let (col, row) = acc.cell_at(point.x(), point.y());
    let point_acc = acc.sample(col, row)?;

    let merged = upstream
        .iter()
        .map(|u| u.geometry.clone())
        .reduce(|acc_geom, g| acc_geom.union(&g))
        .unwrap_or_else(|| MultiPolygon::new(vec![]));

    let max_up_acc = max_accumulation_within(acc, &merged);
    debug!(point_acc, max_up_acc, "accumulation comparison");

    if max_up_acc > point_acc {
        Ok(DelineationMode::Traditional)
    } else {
        Ok(DelineationMode::Hybrid)
    }
}

/// Maximum accumulation among cells whose centers fall inside the shape.
///
/// The shape is scanned over its bounding window at grid resolution;
/// cells outside the grid extent are ignored.
fn max_accumulation_within(acc: &AccumulationGrid, shape: &MultiPolygon<f64>) -> f64 {
    let Some(rect) = shape.bounding_rect() else {
        return 0.0;
    };

    let (col_min, row_max) = acc.cell_at(rect.min().x, rect.min().y);
    let (col_max, row_min) = acc.cell_at(rect.max().x, rect.max().y);

    let mut max_acc: f64 = 0.0;
    for row in row_min..=row_max {
        for col in col_min..=col_max {
            let (lon, lat) = acc.transform().cell_to_geo_center(col, row);
            if !shape.contains(&Point::new(lon, lat)) {
                continue;
            }
            if let Ok(value) = acc.sample(col, row) {
                max_acc = max_acc.max(value);
            }
        }
    }

    max_acc
}
