//! Loading flight records and airport tables from JSON files.

use anyhow::{Context, Result};
use flightsim_core::{AirportTable, Flight, LatLon};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Major Canadian airports, `(code, lat, lon)`.
pub const CANADIAN_AIRPORTS: [(&str, f64, f64); 12] = [
    ("CYYZ", 43.68, -79.63),
    ("CYVR", 49.19, -123.18),
    ("CYUL", 45.47, -73.74),
    ("CYYC", 51.11, -114.02),
    ("CYOW", 45.32, -75.67),
    ("CYWG", 49.91, -97.24),
    ("CYHZ", 44.88, -63.51),
    ("CYEG", 53.31, -113.58),
    ("CYQB", 46.79, -71.39),
    ("CYYJ", 48.65, -123.43),
    ("CYYT", 47.62, -52.75),
    ("CYXE", 52.17, -106.7),
];

pub fn builtin_airports() -> AirportTable {
    CANADIAN_AIRPORTS
        .iter()
        .map(|(code, lat, lon)| (*code, LatLon::new(*lat, *lon)))
        .collect()
}

/// Read a JSON array of flight records.
pub fn load_flights(path: &Path) -> Result<Vec<Flight>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open flight dataset {}", path.display()))?;
    let flights: Vec<Flight> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse flight dataset {}", path.display()))?;
    tracing::info!(count = flights.len(), path = %path.display(), "loaded flights");
    Ok(flights)
}

/// Read a JSON object of `"CODE": [lat, lon]`, or the built-in table when
/// no path is given.
pub fn load_airports(path: Option<&Path>) -> Result<AirportTable> {
    let Some(path) = path else {
        return Ok(builtin_airports());
    };
    let file = File::open(path)
        .with_context(|| format!("failed to open airport table {}", path.display()))?;
    let airports: AirportTable = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse airport table {}", path.display()))?;
    tracing::info!(count = airports.len(), path = %path.display(), "loaded airports");
    Ok(airports)
}

/// Airport codes used by `flights` that `airports` does not know.
pub fn missing_airports(flights: &[Flight], airports: &AirportTable) -> BTreeSet<String> {
    flights
        .iter()
        .flat_map(|f| [&f.departure_airport, &f.arrival_airport])
        .filter(|code| !airports.contains(code))
        .cloned()
        .collect()
}

/// Earliest departure and latest scheduled arrival.
pub fn time_bounds(flights: &[Flight]) -> Option<(i64, i64)> {
    let start = flights.iter().map(|f| f.departure_time).min()?;
    let end = flights.iter().map(Flight::scheduled_arrival).max()?;
    Some((start, end))
}
