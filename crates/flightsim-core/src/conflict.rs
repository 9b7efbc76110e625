//! Loss-of-separation detection over a snapshot.
//!
//! The scan is all-pairs in snapshot order, so output order follows the
//! input order of flights.

use crate::models::{AirportTable, LatLon};
use crate::rules::SeparationRules;
use crate::snapshot::SnapshotEntry;
use crate::spatial::distance_nm;
use serde::Serialize;

/// Two aircraft violating both separation minima at the same instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict<'a> {
    pub a: SnapshotEntry<'a>,
    pub b: SnapshotEntry<'a>,
    /// Horizontal separation in nautical miles
    pub h_nm: f64,
    /// Vertical separation in feet
    pub v_ft: f64,
    pub time: i64,
}

impl Conflict<'_> {
    /// The two ACIDs in lexical order.
    pub fn pair(&self) -> (&str, &str) {
        let (a, b) = (self.a.acid(), self.b.acid());
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// Returns (horizontal_nm, vertical_ft) between two snapshot entries.
pub fn separation(a: &SnapshotEntry<'_>, b: &SnapshotEntry<'_>) -> (f64, f64) {
    (
        distance_nm(a.position, b.position),
        (a.altitude_ft - b.altitude_ft).abs(),
    )
}

/// All pairs `i < j` with horizontal < `h_sep_nm` and vertical < `v_sep_ft`.
pub fn detect_conflicts<'a>(
    entries: &[SnapshotEntry<'a>],
    h_sep_nm: f64,
    v_sep_ft: f64,
) -> Vec<Conflict<'a>> {
    ConflictDetector::new(SeparationRules {
        horizontal_nm: h_sep_nm,
        vertical_ft: v_sep_ft,
        airport_exclusion_radius_nm: None,
    })
    .detect(entries)
}

/// Number of conflicting pairs, without building the records.
pub fn count_conflicts(entries: &[SnapshotEntry<'_>], rules: &SeparationRules) -> usize {
    let mut count = 0;
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            let (h, v) = separation(&entries[i], &entries[j]);
            if rules.is_loss(h, v) {
                count += 1;
            }
        }
    }
    count
}

/// Conflict detector with configurable minima and optional terminal-area
/// exclusion.
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    rules: SeparationRules,
    exclusion_points: Vec<LatLon>,
}

impl ConflictDetector {
    /// Detector without airport exclusion, whatever the rules' radius says.
    pub fn new(rules: SeparationRules) -> Self {
        Self {
            rules,
            exclusion_points: Vec::new(),
        }
    }

    /// Detector that honours `rules.airport_exclusion_radius_nm` against
    /// the airports in `airports`.
    pub fn with_airports(rules: SeparationRules, airports: &AirportTable) -> Self {
        let exclusion_points = if rules.airport_exclusion_radius_nm.is_some() {
            airports.positions().collect()
        } else {
            Vec::new()
        };
        Self {
            rules,
            exclusion_points,
        }
    }

    pub fn rules(&self) -> &SeparationRules {
        &self.rules
    }

    /// Within the exclusion radius (inclusive) of any known airport.
    pub fn near_airport(&self, position: LatLon) -> bool {
        let Some(radius_nm) = self.rules.airport_exclusion_radius_nm else {
            return false;
        };
        self.exclusion_points
            .iter()
            .any(|airport| distance_nm(position, *airport) <= radius_nm)
    }

    pub fn detect<'a>(&self, entries: &[SnapshotEntry<'a>]) -> Vec<Conflict<'a>> {
        let near: Vec<bool> = entries
            .iter()
            .map(|entry| self.near_airport(entry.position))
            .collect();

        let mut conflicts = Vec::new();
        for i in 0..entries.len() {
            if near[i] {
                continue;
            }
            for j in (i + 1)..entries.len() {
                if near[j] {
                    continue;
                }
                let (a, b) = (&entries[i], &entries[j]);
                let (h_nm, v_ft) = separation(a, b);
                if !self.rules.is_loss(h_nm, v_ft) {
                    continue;
                }
                conflicts.push(Conflict {
                    a: a.clone(),
                    b: b.clone(),
                    h_nm,
                    v_ft,
                    time: a.time,
                });
            }
        }
        conflicts
    }
}
