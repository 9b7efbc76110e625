//! Positions of every active flight at a single instant.

use crate::models::{AirportTable, EditSet, Flight, LatLon};
use crate::spatial::Interpolation;
use crate::trajectory::Trajectory;
use serde::Serialize;

/// One active flight at the query time, after edits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry<'a> {
    pub flight: &'a Flight,
    pub position: LatLon,
    /// Effective altitude (baseline plus edit delta)
    pub altitude_ft: f64,
    /// Effective departure time, after any delay
    pub departure_time: i64,
    /// Effective speed in knots
    pub speed_knots: f64,
    pub time: i64,
}

impl SnapshotEntry<'_> {
    pub fn acid(&self) -> &str {
        &self.flight.acid
    }
}

/// Why flights were left out of a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotStats {
    pub active: usize,
    /// Unknown airport or malformed route
    pub unresolved: usize,
    /// Not yet departed or already arrived
    pub inactive: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<'a> {
    pub time: i64,
    pub entries: Vec<SnapshotEntry<'a>>,
    pub stats: SnapshotStats,
}

/// Evaluate every flight at `query_time` with great-circle interpolation.
///
/// Unresolvable and inactive flights are omitted. Inputs are never mutated.
pub fn snapshot<'a>(
    flights: &'a [Flight],
    query_time: i64,
    edits: &EditSet,
    airports: &AirportTable,
) -> Vec<SnapshotEntry<'a>> {
    snapshot_with_stats(flights, query_time, edits, airports, Interpolation::default()).entries
}

/// Like [`snapshot`], also reporting how many flights were skipped and why.
pub fn snapshot_with_stats<'a>(
    flights: &'a [Flight],
    query_time: i64,
    edits: &EditSet,
    airports: &AirportTable,
    interpolation: Interpolation,
) -> Snapshot<'a> {
    let mut entries = Vec::with_capacity(flights.len());
    let mut stats = SnapshotStats::default();

    for flight in flights {
        let trajectory = match Trajectory::resolve(flight, edits.get(&flight.acid), airports) {
            Ok(trajectory) => trajectory,
            Err(err) => {
                tracing::trace!(acid = %flight.acid, %err, "flight excluded");
                stats.unresolved += 1;
                continue;
            }
        };

        let Some(position) = trajectory.position(query_time, interpolation) else {
            stats.inactive += 1;
            continue;
        };

        entries.push(SnapshotEntry {
            flight,
            position,
            altitude_ft: trajectory.altitude_ft,
            departure_time: trajectory.departure_time,
            speed_knots: trajectory.speed_knots,
            time: query_time,
        });
    }

    stats.active = entries.len();
    if stats.unresolved > 0 {
        tracing::debug!(
            time = query_time,
            unresolved = stats.unresolved,
            "skipped unresolvable flights"
        );
    }

    Snapshot {
        time: query_time,
        entries,
        stats,
    }
}
