//! Dataset access: basin-vector layers, the level-0 lookup table, and
//! region-scoped paths.
//!
//! A `Region` bundles the dataset root with one continental partition code
//! and resolves the file layout:
//!
//! ```text
//! <root>/hydrosheds/{region}_dir_{cell}s.tif
//! <root>/hydrosheds/{region}_acc_{cell}s.tif
//! <root>/hydrobasins/hybas_{region}_lev{level:02}.geojson
//! <root>/hydrobasins/hybas_{region}_lookup.json
//! ```
//!
//! Everything loaded here is read-only for the engine; handles live for a
//! single delineation request.

use crate::error::Result;
use crate::grid::{AccumulationGrid, FlowGrid};
use cuencas_core::io::read_feature_collection;
use geo::algorithm::{BoundingRect, Contains};
use geo_types::{Geometry, MultiPolygon, Point};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Bounding-box slack when pre-filtering candidate basins around a point,
/// in degrees.
const CONTAINMENT_SLACK: f64 = 0.001;

/// One basin-vector record, immutable once loaded.
#[derive(Debug, Clone)]
pub struct DrainageUnit {
    /// Unique identifier (HYBAS_ID)
    pub unit_id: i64,
    /// Hierarchical (Pfafstetter) code at this layer's level
    pub code: i64,
    /// Immediately downstream unit at the same level; 0 is the terminal
    /// sentinel
    pub next_down: i64,
    /// Terminal (outlet/sink) unit reachable by following `next_down`
    pub next_sink: i64,
    /// Top-level basin this unit belongs to
    pub main_basin: i64,
    /// Basin polygon in geographic coordinates
    pub geometry: MultiPolygon<f64>,
}

/// One basin-vector layer at a single subdivision level.
#[derive(Debug)]
pub struct BasinLayer {
    pub level: u8,
    units: Vec<DrainageUnit>,
    by_id: HashMap<i64, usize>,
}

impl BasinLayer {
    pub fn new(level: u8, units: Vec<DrainageUnit>) -> Self {
        let by_id = units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.unit_id, i))
            .collect();
        Self {
            level,
            units,
            by_id,
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrainageUnit> {
        self.units.iter()
    }

    /// Look up a unit by its identifier
    pub fn get(&self, unit_id: i64) -> Option<&DrainageUnit> {
        self.by_id.get(&unit_id).map(|&i| &self.units[i])
    }

    /// The unit whose geometry contains the point.
    ///
    /// Uses a bounding-box pre-filter with a small slack before the exact
    /// containment test.
    pub fn find_containing(&self, point: Point<f64>) -> Option<&DrainageUnit> {
        self.units.iter().find(|unit| {
            let Some(rect) = unit.geometry.bounding_rect() else {
                return false;
            };
            if point.x() < rect.min().x - CONTAINMENT_SLACK
                || point.x() > rect.max().x + CONTAINMENT_SLACK
                || point.y() < rect.min().y - CONTAINMENT_SLACK
                || point.y() > rect.max().y + CONTAINMENT_SLACK
            {
                return false;
            }
            unit.geometry.contains(&point)
        })
    }
}

/// One row of the level-0 tabular lookup: a finest-subdivision record with
/// its hierarchical code at every level.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupRow {
    #[serde(rename = "HYBAS_ID")]
    pub unit_id: i64,
    #[serde(rename = "MAIN_BAS")]
    pub main_basin: i64,
    /// Codes for levels 1..=N; `codes[l - 1]` is the code at level `l`
    #[serde(rename = "PFAF")]
    pub codes: Vec<i64>,
}

impl LookupRow {
    /// Hierarchical code at a subdivision level (1-based)
    pub fn code_at(&self, level: u8) -> Option<i64> {
        if level == 0 {
            return None;
        }
        self.codes.get(level as usize - 1).copied()
    }
}

/// A continental dataset partition: region code plus file handles.
#[derive(Debug, Clone)]
pub struct Region {
    code: String,
    root: PathBuf,
    cell_size: u32,
}

impl Region {
    pub fn new(root: &Path, code: &str, cell_size: u32) -> Self {
        Self {
            code: code.to_string(),
            root: root.to_path_buf(),
            cell_size,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Path of the flow-direction grid
    pub fn dir_grid_path(&self) -> PathBuf {
        self.root
            .join("hydrosheds")
            .join(format!("{}_dir_{}s.tif", self.code, self.cell_size))
    }

    /// Path of the flow-accumulation grid
    pub fn acc_grid_path(&self) -> PathBuf {
        self.root
            .join("hydrosheds")
            .join(format!("{}_acc_{}s.tif", self.code, self.cell_size))
    }

    /// Path of a basin-vector layer
    pub fn layer_path(&self, level: u8) -> PathBuf {
        self.root
            .join("hydrobasins")
            .join(format!("hybas_{}_lev{:02}.geojson", self.code, level))
    }

    /// Path of the level-0 lookup table
    pub fn lookup_path(&self) -> PathBuf {
        self.root
            .join("hydrobasins")
            .join(format!("hybas_{}_lookup.json", self.code))
    }

    /// Open this region's flow-direction grid
    pub fn open_flow_grid(&self) -> Result<FlowGrid> {
        Ok(FlowGrid::open(self.dir_grid_path())?)
    }

    /// Open this region's flow-accumulation grid
    pub fn open_accumulation_grid(&self) -> Result<AccumulationGrid> {
        Ok(AccumulationGrid::open(self.acc_grid_path())?)
    }

    /// Load a basin-vector layer.
    ///
    /// Features missing required attributes or carrying non-areal geometry
    /// are skipped with a warning rather than failing the layer.
    pub fn load_layer(&self, level: u8) -> Result<BasinLayer> {
        let path = self.layer_path(level);
        let fc = read_feature_collection(&path)?;

        let mut units = Vec::with_capacity(fc.len());
        for feature in fc.iter() {
            let geometry = match &feature.geometry {
                Some(Geometry::Polygon(p)) => MultiPolygon::new(vec![p.clone()]),
                Some(Geometry::MultiPolygon(mp)) => mp.clone(),
                _ => {
                    warn!(layer = %path.display(), "skipping feature without areal geometry");
                    continue;
                }
            };

            let (Some(unit_id), Some(code), Some(next_down), Some(next_sink), Some(main_basin)) = (
                feature.int_property("HYBAS_ID"),
                feature.int_property("PFAF_ID"),
                feature.int_property("NEXT_DOWN"),
                feature.int_property("NEXT_SINK"),
                feature.int_property("MAIN_BAS"),
            ) else {
                warn!(layer = %path.display(), "skipping feature with missing basin attributes");
                continue;
            };

            units.push(DrainageUnit {
                unit_id,
                code,
                next_down,
                next_sink,
                main_basin,
                geometry,
            });
        }

        Ok(BasinLayer::new(level, units))
    }

    /// Load the level-0 lookup table
    pub fn load_lookup(&self) -> Result<Vec<LookupRow>> {
        let file = File::open(self.lookup_path()).map_err(cuencas_core::Error::Io)?;
        let rows: Vec<LookupRow> =
            serde_json::from_reader(BufReader::new(file)).map_err(cuencas_core::Error::Json)?;
        Ok(rows)
    }
}
