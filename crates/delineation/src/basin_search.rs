//! Hierarchical basin-network search
//!
//! Walks the linked basin records level by level to assemble every
//! sub-basin draining to the point's containing unit. At each level the
//! candidate set is an immutable snapshot of the level-0 lookup narrowed by
//! the previous level's code; each candidate's `next_down` chain is then
//! followed downslope until it reaches the point's basin (include the whole
//! chain), an already-included unit (ditto), or a dead end (drop it).

use crate::dataset::{BasinLayer, DrainageUnit, LookupRow};
use geo_types::MultiPolygon;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Geometries contributed by one subdivision level
pub type LevelContribution = Vec<MultiPolygon<f64>>;

/// Find all sub-basins contributing to the unit identified by `point_row`.
///
/// `lookup` is the full level-0 table for the region; `layers` maps each
/// subdivision level in `2..=max_level` to its basin-vector layer;
/// `point_row` carries the point unit's hierarchical code at every level.
///
/// With `omit_sinks`, units that never reach their main basin's outlet
/// (`main_basin != next_sink`) are excluded and their codes filtered from
/// deeper levels; chain stepping follows `next_down`. Without it, stepping
/// follows `next_sink` (the unverified legacy path; see DESIGN.md).
///
/// Returns one geometry set per level that contributed anything. A level
/// with no anchor unit or no included chains contributes nothing and the
/// search continues.
pub fn find_contributing_basins(
    lookup: &[LookupRow],
    layers: &HashMap<u8, BasinLayer>,
    point_row: &LookupRow,
    max_level: u8,
    omit_sinks: bool,
) -> Vec<LevelContribution> {
    let mut contributions = Vec::new();

    // Working subset of the lookup, narrowed as levels refine. Snapshot per
    // level rather than mutated in place.
    let mut working: Vec<&LookupRow> = lookup
        .iter()
        .filter(|row| row.main_basin == point_row.main_basin)
        .collect();

    for level in 2..=max_level {
        let parent_code = point_row.code_at(level - 1);
        working.retain(|row| row.code_at(level - 1) == parent_code);

        let candidate_codes: HashSet<i64> = working
            .iter()
            .filter_map(|row| row.code_at(level))
            .collect();

        let Some(layer) = layers.get(&level) else {
            debug!(level, "no basin layer loaded for level; skipping");
            continue;
        };

        let candidates: Vec<&DrainageUnit> = layer
            .iter()
            .filter(|unit| candidate_codes.contains(&unit.code))
            .collect();

        let this_code = point_row.code_at(level);
        let Some(this_basin) = candidates
            .iter()
            .find(|unit| Some(unit.code) == this_code)
        else {
            debug!(level, "point basin missing at level; skipping");
            continue;
        };
        let this_id = this_basin.unit_id;

        let by_id: HashMap<i64, &DrainageUnit> =
            candidates.iter().map(|u| (u.unit_id, *u)).collect();

        let mut included: HashSet<i64> = HashSet::new();
        let mut filtered_codes: HashSet<i64> = HashSet::new();

        for unit in &candidates {
            if omit_sinks && unit.main_basin != unit.next_sink {
                // Never reaches a basin outlet; drop it and everything that
                // would refine it at deeper levels.
                filtered_codes.insert(unit.code);
                continue;
            }

            if included.contains(&unit.unit_id) {
                continue;
            }

            let mut chain = vec![unit.unit_id];
            let mut code_chain = vec![unit.code];
            let mut walked: HashSet<i64> = HashSet::from([unit.unit_id]);

            let mut next = if omit_sinks {
                unit.next_down
            } else {
                unit.next_sink
            };

            while next != 0 {
                if next == this_id || included.contains(&next) {
                    included.extend(chain.iter().copied());
                    filtered_codes.extend(code_chain.iter().copied());
                    break;
                }

                // A broken downstream reference ends the walk without
                // including the chain.
                let Some(down) = by_id.get(&next) else {
                    break;
                };

                // Cycle guard; well-formed data never triggers it
                if !walked.insert(down.unit_id) {
                    break;
                }

                chain.push(down.unit_id);
                code_chain.push(down.code);
                next = if omit_sinks {
                    down.next_down
                } else {
                    down.next_sink
                };
            }
        }

        let geometries: LevelContribution = candidates
            .iter()
            .filter(|unit| included.contains(&unit.unit_id))
            .map(|unit| unit.geometry.clone())
            .collect();

        debug!(
            level,
            candidates = candidates.len(),
            included = geometries.len(),
            "level search complete"
        );

        if !geometries.is_empty() {
            contributions.push(geometries);
        }

        working.retain(|row| {
            row.code_at(level)
                .map_or(true, |code| !filtered_codes.contains(&code))
        });
    }

    contributions
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    fn unit(
        id: i64,
        code: i64,
        next_down: i64,
        next_sink: i64,
        main_basin: i64,
        x0: f64,
    ) -> DrainageUnit {
        DrainageUnit {
            unit_id: id,
            code,
            next_down,
            next_sink,
            main_basin,
            geometry: MultiPolygon::new(vec![polygon![
                (x: x0, y: 0.0),
                (x: x0 + 1.0, y: 0.0),
                (x: x0 + 1.0, y: 1.0),
                (x: x0, y: 1.0),
                (x: x0, y: 0.0),
            ]]),
        }
    }

    fn row(id: i64, main: i64, codes: &[i64]) -> LookupRow {
        LookupRow {
            unit_id: id,
            main_basin: main,
            codes: codes.to_vec(),
        }
    }

    /// Three-level hierarchy around point unit A (id 100, code 111 at
    /// level 3). B (code 112) reaches A after two hops through M (code
    /// 113). C (code 114) drains to a different outlet chain.
    fn three_level_fixture() -> (Vec<LookupRow>, HashMap<u8, BasinLayer>, LookupRow) {
        let point_row = row(100, 1, &[1, 11, 111]);
        let lookup = vec![
            point_row.clone(),
            row(101, 1, &[1, 11, 112]),
            row(102, 1, &[1, 11, 113]),
            row(103, 1, &[1, 11, 114]),
        ];

        // Main basin 1 is also the shared outlet id, so well-drained units
        // carry next_sink == main_basin and pass the sink filter.
        //
        // Level 2: a single unit covering the parent; its chain terminates
        // immediately, so level 2 contributes nothing.
        let level2 = BasinLayer::new(2, vec![unit(10, 11, 0, 1, 1, 0.0)]);

        // Level 3: A <- M <- B, C dangling
        let level3 = BasinLayer::new(
            3,
            vec![
                unit(100, 111, 0, 1, 1, 0.0),   // A: the point's unit
                unit(102, 113, 100, 1, 1, 1.0), // M -> A
                unit(101, 112, 102, 1, 1, 2.0), // B -> M -> A (2 hops)
                unit(103, 114, 999, 1, 1, 3.0), // C -> missing record
            ],
        );

        let mut layers = HashMap::new();
        layers.insert(2, level2);
        layers.insert(3, level3);

        (lookup, layers, point_row)
    }

    #[test]
    fn test_two_hop_contributor_included_other_outlet_excluded() {
        let (lookup, layers, point_row) = three_level_fixture();

        let result = find_contributing_basins(&lookup, &layers, &point_row, 3, true);

        // Only level 3 contributes: B and M
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 2);
    }

    #[test]
    fn test_sink_units_filtered() {
        let point_row = row(100, 1, &[1, 11]);
        let lookup = vec![point_row.clone(), row(101, 1, &[1, 12])];

        // Unit 12 is an inland sink: main basin differs from its sink
        let level2 = BasinLayer::new(
            2,
            vec![
                unit(100, 11, 0, 1, 1, 0.0),
                unit(101, 12, 100, 999, 1, 1.0),
            ],
        );
        let mut layers = HashMap::new();
        layers.insert(2, level2);

        let result = find_contributing_basins(&lookup, &layers, &point_row, 2, true);
        assert!(result.is_empty(), "sink unit must not contribute");
    }

    #[test]
    fn test_cycle_terminates() {
        let point_row = row(100, 1, &[1, 11]);
        let lookup = vec![
            point_row.clone(),
            row(101, 1, &[1, 12]),
            row(102, 1, &[1, 13]),
        ];

        // 101 -> 102 -> 101: a malformed cycle that never reaches 100
        let level2 = BasinLayer::new(
            2,
            vec![
                unit(100, 11, 0, 1, 1, 0.0),
                unit(101, 12, 102, 1, 1, 1.0),
                unit(102, 13, 101, 1, 1, 2.0),
            ],
        );
        let mut layers = HashMap::new();
        layers.insert(2, level2);

        // Must terminate and include nothing from the cycle
        let result = find_contributing_basins(&lookup, &layers, &point_row, 2, true);
        assert!(result.is_empty());
    }

    #[test]
    fn test_chain_joining_included_unit() {
        let point_row = row(100, 1, &[1, 11]);
        let lookup = vec![
            point_row.clone(),
            row(101, 1, &[1, 12]),
            row(102, 1, &[1, 13]),
        ];

        // 101 -> 100 directly; 102 -> 101, which is included by the time
        // (or before) 102 is walked, so 102 joins through it.
        let level2 = BasinLayer::new(
            2,
            vec![
                unit(100, 11, 0, 1, 1, 0.0),
                unit(101, 12, 100, 1, 1, 1.0),
                unit(102, 13, 101, 1, 1, 2.0),
            ],
        );
        let mut layers = HashMap::new();
        layers.insert(2, level2);

        let result = find_contributing_basins(&lookup, &layers, &point_row, 2, true);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 2);
    }
}
