//! Space-time-altitude hotspot analysis.
//!
//! Snapshots are taken at every time bucket in a range, projected onto an
//! equirectangular grid, and grouped into cells keyed by
//! `(bucket start, ix, iy, iz)`.

use crate::conflict::count_conflicts;
use crate::error::{CoreError, Result};
use crate::models::{AirportTable, EditSet, Flight};
use crate::rules::SeparationRules;
use crate::snapshot::{snapshot_with_stats, SnapshotEntry};
use crate::spatial::{project_km, Interpolation, NM_TO_KM};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Weight of an in-cell conflict relative to one unit of traffic.
pub const CONFLICT_SCORE_WEIGHT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotspotOptions {
    /// Horizontal cell edge in nautical miles
    pub cell_nm: f64,
    /// Altitude band height in feet
    pub cell_ft: f64,
    pub time_bucket_secs: i64,
    pub interpolation: Interpolation,
}

impl Default for HotspotOptions {
    fn default() -> Self {
        Self {
            cell_nm: 25.0,
            cell_ft: 2000.0,
            time_bucket_secs: 300,
            interpolation: Interpolation::default(),
        }
    }
}

impl HotspotOptions {
    pub fn validate(&self) -> Result<()> {
        if self.time_bucket_secs <= 0 {
            return Err(CoreError::InvalidOptions(format!(
                "time_bucket_secs must be positive, got {}",
                self.time_bucket_secs
            )));
        }
        if !(self.cell_nm > 0.0 && self.cell_ft > 0.0) {
            return Err(CoreError::InvalidOptions(format!(
                "cell sizes must be positive, got {} nm x {} ft",
                self.cell_nm, self.cell_ft
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellKey {
    /// Start of the time bucket (Unix seconds)
    pub time: i64,
    pub ix: i64,
    pub iy: i64,
    pub iz: i64,
}

impl CellKey {
    fn spatial(&self) -> (i64, i64, i64) {
        (self.ix, self.iy, self.iz)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotCell {
    pub key: CellKey,
    /// Distinct ACIDs in the cell, in snapshot order
    pub flights: Vec<String>,
    pub traffic_count: usize,
    pub conflict_count: usize,
    /// Distinct departure->arrival pairs
    pub flow_count: usize,
    pub score: usize,
    /// Share of all cells that sit at the same (ix, iy, iz) with at least
    /// this much traffic. A recurrence measure, not a statistical confidence.
    pub confidence: f64,
}

/// Bucket starts `t_start, t_start + step, ...` up to and including `t_end`.
pub fn time_buckets(t_start: i64, t_end: i64, step: i64) -> impl Iterator<Item = i64> {
    let step = step.max(1);
    std::iter::successors(Some(t_start), move |t| t.checked_add(step))
        .take_while(move |t| *t <= t_end)
}

/// Cell indices for a snapshot entry.
fn cell_of(entry: &SnapshotEntry<'_>, options: &HotspotOptions) -> (i64, i64, i64) {
    let cell_km = options.cell_nm * NM_TO_KM;
    let (x, y) = project_km(entry.position);
    (
        (x / cell_km).floor() as i64,
        (y / cell_km).floor() as i64,
        (entry.altitude_ft / options.cell_ft).floor() as i64,
    )
}

/// Hotspot cells between `t_start` and `t_end`, highest score first.
///
/// Edits are applied to every internal snapshot. Equal scores keep their
/// first-seen order.
pub fn compute_hotspots(
    flights: &[Flight],
    t_start: i64,
    t_end: i64,
    options: &HotspotOptions,
    airports: &AirportTable,
    edits: &EditSet,
) -> Result<Vec<HotspotCell>> {
    options.validate()?;

    let mut index: HashMap<CellKey, usize> = HashMap::new();
    let mut buckets: Vec<(CellKey, Vec<SnapshotEntry<'_>>)> = Vec::new();

    for t in time_buckets(t_start, t_end, options.time_bucket_secs) {
        let snap = snapshot_with_stats(flights, t, edits, airports, options.interpolation);
        for entry in snap.entries {
            let (ix, iy, iz) = cell_of(&entry, options);
            let key = CellKey { time: t, ix, iy, iz };
            let slot = *index.entry(key).or_insert_with(|| {
                buckets.push((key, Vec::new()));
                buckets.len() - 1
            });
            buckets[slot].1.push(entry);
        }
    }

    // traffic per spatial cell across all buckets, sorted for ">=" counting
    let mut recurrence: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    for (key, entries) in &buckets {
        recurrence
            .entry(key.spatial())
            .or_default()
            .push(entries.len());
    }
    for counts in recurrence.values_mut() {
        counts.sort_unstable();
    }
    let total_cells = buckets.len();

    let in_cell_rules = SeparationRules::default();
    let mut cells: Vec<HotspotCell> = buckets
        .iter()
        .map(|(key, entries)| {
            let traffic_count = entries.len();
            let conflict_count = count_conflicts(entries, &in_cell_rules);

            let mut seen = HashSet::new();
            let flights: Vec<String> = entries
                .iter()
                .filter(|e| seen.insert(e.acid()))
                .map(|e| e.acid().to_string())
                .collect();
            let flow_count = entries
                .iter()
                .map(|e| {
                    (
                        e.flight.departure_airport.as_str(),
                        e.flight.arrival_airport.as_str(),
                    )
                })
                .collect::<HashSet<_>>()
                .len();

            let repeats = recurrence
                .get(&key.spatial())
                .map(|counts| counts.len() - counts.partition_point(|&c| c < traffic_count))
                .unwrap_or(0);

            HotspotCell {
                key: *key,
                flights,
                traffic_count,
                conflict_count,
                flow_count,
                score: traffic_count + CONFLICT_SCORE_WEIGHT * conflict_count,
                confidence: repeats as f64 / total_cells as f64,
            }
        })
        .collect();

    cells.sort_by(|a, b| b.score.cmp(&a.score));

    tracing::debug!(
        cells = cells.len(),
        top_score = cells.first().map(|c| c.score).unwrap_or(0),
        "hotspots computed"
    );
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Edit, LatLon};

    fn airports() -> AirportTable {
        [
            ("CYYZ", LatLon::new(43.68, -79.63)),
            ("CYUL", LatLon::new(45.47, -73.74)),
            ("CYOW", LatLon::new(45.32, -75.67)),
            // co-located with CYUL so a second flow shares the same path
            ("CYHU", LatLon::new(45.47, -73.74)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn time_buckets_include_last_bucket_not_past_end() {
        assert_eq!(time_buckets(0, 900, 300).collect::<Vec<_>>(), vec![0, 300, 600, 900]);
        assert_eq!(time_buckets(0, 899, 300).collect::<Vec<_>>(), vec![0, 300, 600]);
        assert!(time_buckets(10, 0, 300).next().is_none());
    }

    #[test]
    fn rejects_zero_bucket_width() {
        let options = HotspotOptions {
            time_bucket_secs: 0,
            ..HotspotOptions::default()
        };
        let err = compute_hotspots(&[], 0, 100, &options, &airports(), &EditSet::new());
        assert!(matches!(err, Err(CoreError::InvalidOptions(_))));
    }

    #[test]
    fn stacked_flights_score_conflicts() {
        let flights = vec![
            Flight::new("A", "CYYZ", "CYUL", 0, 450.0, 35000.0),
            Flight::new("B", "CYYZ", "CYUL", 0, 450.0, 35000.0),
            Flight::new("C", "CYYZ", "CYHU", 0, 450.0, 35500.0),
        ];
        let options = HotspotOptions::default();
        let cells =
            compute_hotspots(&flights, 600, 600, &options, &airports(), &EditSet::new()).unwrap();

        let top = &cells[0];
        assert_eq!(top.key.time, 600);
        assert_eq!(top.key.iz, 17);
        assert_eq!(top.flights, vec!["A", "B", "C"]);
        assert_eq!(top.traffic_count, 3);
        assert_eq!(top.conflict_count, 3);
        assert_eq!(top.flow_count, 2);
        assert_eq!(top.score, 12);
        assert_eq!(top.confidence, 1.0);
    }

    #[test]
    fn edits_reach_internal_snapshots() {
        let flights = vec![
            Flight::new("A", "CYYZ", "CYUL", 0, 450.0, 35000.0),
            Flight::new("B", "CYYZ", "CYUL", 0, 450.0, 35000.0),
        ];
        let mut edits = EditSet::new();
        edits.set("B", Edit::altitude(4000.0));

        let cells =
            compute_hotspots(&flights, 600, 600, &HotspotOptions::default(), &airports(), &edits)
                .unwrap();
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(|c| c.conflict_count == 0 && c.traffic_count == 1));
    }

    #[test]
    fn results_sorted_and_confidence_counts_recurrence() {
        let flights: Vec<Flight> = (0..5)
            .map(|i| {
                let level = 30000.0 + i as f64 * 700.0;
                Flight::new(format!("F{i}"), "CYYZ", "CYUL", i * 120, 450.0, level)
            })
            .collect();
        let cells = compute_hotspots(
            &flights,
            0,
            3600,
            &HotspotOptions::default(),
            &airports(),
            &EditSet::new(),
        )
        .unwrap();

        assert!(!cells.is_empty());
        assert!(cells.windows(2).all(|w| w[0].score >= w[1].score));
        for cell in &cells {
            assert!(cell.confidence > 0.0 && cell.confidence <= 1.0);
            let same_place = cells
                .iter()
                .filter(|c| {
                    c.key.spatial() == cell.key.spatial() && c.traffic_count >= cell.traffic_count
                })
                .count();
            assert_eq!(cell.confidence, same_place as f64 / cells.len() as f64);
        }
    }
}
