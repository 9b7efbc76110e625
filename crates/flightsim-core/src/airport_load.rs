//! Windowed departure/arrival counts per airport.

use crate::error::{CoreError, Result};
use crate::models::Flight;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_WINDOW_SECS: i64 = 900;
/// Percentile of all window operation counts that marks a window busy.
pub const BUSY_PERCENTILE: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadWindow {
    pub window_start: i64,
    pub deps: u32,
    pub arrs: u32,
    pub ops: u32,
    pub busy: bool,
}

impl LoadWindow {
    fn empty(window_start: i64) -> Self {
        Self {
            window_start,
            deps: 0,
            arrs: 0,
            ops: 0,
            busy: false,
        }
    }
}

/// Airport code to its windows, in window order.
pub type AirportLoad = BTreeMap<String, Vec<LoadWindow>>;

/// Count departures and arrivals per airport in fixed windows covering
/// `[t_start, t_end)`.
///
/// Every airport named by any flight gets a full row of windows, even if
/// none of its movements fall in range. Flights without an arrival time
/// arrive one hour after departure.
pub fn compute_airport_load(
    flights: &[Flight],
    t_start: i64,
    t_end: i64,
    window_secs: i64,
) -> Result<AirportLoad> {
    if window_secs <= 0 {
        return Err(CoreError::InvalidOptions(format!(
            "window_secs must be positive, got {window_secs}"
        )));
    }

    let starts: Vec<i64> = std::iter::successors(Some(t_start), |s| s.checked_add(window_secs))
        .take_while(|s| *s < t_end)
        .collect();

    let mut load = AirportLoad::new();
    for flight in flights {
        for code in [&flight.departure_airport, &flight.arrival_airport] {
            if code.is_empty() || load.contains_key(code.as_str()) {
                continue;
            }
            load.insert(
                code.clone(),
                starts.iter().map(|s| LoadWindow::empty(*s)).collect(),
            );
        }
    }

    let slot = |time: i64| -> Option<usize> {
        if time < t_start || time >= t_end {
            return None;
        }
        let idx = ((time - t_start) / window_secs) as usize;
        (idx < starts.len()).then_some(idx)
    };

    for flight in flights {
        if let Some(idx) = slot(flight.departure_time) {
            if let Some(window) = load
                .get_mut(flight.departure_airport.as_str())
                .and_then(|row| row.get_mut(idx))
            {
                window.deps += 1;
                window.ops = window.deps + window.arrs;
            }
        }
        if let Some(idx) = slot(flight.scheduled_arrival()) {
            if let Some(window) = load
                .get_mut(flight.arrival_airport.as_str())
                .and_then(|row| row.get_mut(idx))
            {
                window.arrs += 1;
                window.ops = window.deps + window.arrs;
            }
        }
    }

    if let Some(threshold) = busy_threshold(&load) {
        for window in load.values_mut().flat_map(|row| row.iter_mut()) {
            window.busy = window.ops >= threshold && window.ops > 0;
        }
    }

    Ok(load)
}

/// 95th percentile of all window operation counts, `None` without windows.
pub fn busy_threshold(load: &AirportLoad) -> Option<u32> {
    let mut all_ops: Vec<u32> = load.values().flatten().map(|w| w.ops).collect();
    if all_ops.is_empty() {
        return None;
    }
    all_ops.sort_unstable();
    let idx = ((all_ops.len() as f64 * BUSY_PERCENTILE).floor() as usize).saturating_sub(1);
    Some(all_ops[idx])
}

/// One airport window, flattened for ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AirportWindow {
    pub airport: String,
    pub window: LoadWindow,
}

/// The `n` windows with the most operations, busiest first.
pub fn busiest_windows(load: &AirportLoad, n: usize) -> Vec<AirportWindow> {
    let mut rows: Vec<AirportWindow> = load
        .iter()
        .flat_map(|(airport, windows)| {
            windows.iter().map(move |window| AirportWindow {
                airport: airport.clone(),
                window: *window,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.window.ops.cmp(&a.window.ops));
    rows.truncate(n);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_flight_single_window() {
        let flights = vec![Flight::new("A", "CYYZ", "CYUL", 100, 450.0, 35000.0)];
        let load = compute_airport_load(&flights, 0, 900, 900).unwrap();

        let yyz = &load["CYYZ"];
        assert_eq!(yyz.len(), 1);
        assert_eq!(yyz[0].deps, 1);
        assert_eq!(yyz[0].ops, 1);
        // sorted ops [0, 1], threshold index max(0, floor(1.9) - 1) = 0 -> 0
        assert!(yyz[0].busy);

        let yul = &load["CYUL"];
        assert_eq!(yul[0].ops, 0);
        assert!(!yul[0].busy);
    }

    #[test]
    fn counts_by_window_and_defaults_arrival() {
        let flights = vec![
            Flight::new("A", "CYYZ", "CYUL", 0, 450.0, 35000.0),
            Flight::new("B", "CYYZ", "CYUL", 950, 450.0, 35000.0).with_arrival_time(2000),
            Flight::new("C", "CYUL", "CYYZ", 3000, 450.0, 35000.0),
        ];
        let load = compute_airport_load(&flights, 0, 3600, 900).unwrap();

        let yyz = &load["CYYZ"];
        let starts: Vec<_> = yyz.iter().map(|w| w.window_start).collect();
        assert_eq!(starts, vec![0, 900, 1800, 2700]);
        assert_eq!(yyz.iter().map(|w| w.deps).collect::<Vec<_>>(), vec![1, 1, 0, 0]);

        let yul = &load["CYUL"];
        assert_eq!(yul.iter().map(|w| w.deps).collect::<Vec<_>>(), vec![0, 0, 0, 1]);
        // A arrives at 3600 (out of range), B at 2000
        assert_eq!(yul.iter().map(|w| w.arrs).collect::<Vec<_>>(), vec![0, 0, 1, 0]);
    }

    #[test]
    fn deps_sum_to_flights_departing_in_range() {
        let flights: Vec<Flight> = (0..40)
            .map(|i| Flight::new(format!("F{i}"), "CYYZ", "CYUL", i * 173 - 500, 450.0, 35000.0))
            .collect();
        let (t_start, t_end) = (0, 4000);
        let load = compute_airport_load(&flights, t_start, t_end, 900).unwrap();

        let expected_deps = flights
            .iter()
            .filter(|f| f.departure_time >= t_start && f.departure_time < t_end)
            .count() as u32;
        let expected_arrs = flights
            .iter()
            .filter(|f| f.scheduled_arrival() >= t_start && f.scheduled_arrival() < t_end)
            .count() as u32;

        assert_eq!(load["CYYZ"].iter().map(|w| w.deps).sum::<u32>(), expected_deps);
        assert_eq!(load["CYUL"].iter().map(|w| w.arrs).sum::<u32>(), expected_arrs);
        assert!(load.values().flatten().all(|w| w.ops == w.deps + w.arrs));
    }

    #[test]
    fn busiest_windows_ranked_by_ops() {
        let flights = vec![
            Flight::new("A", "CYYZ", "CYUL", 0, 450.0, 35000.0),
            Flight::new("B", "CYYZ", "CYUL", 10, 450.0, 35000.0),
            Flight::new("C", "CYOW", "CYUL", 1000, 450.0, 35000.0),
        ];
        let load = compute_airport_load(&flights, 0, 1800, 900).unwrap();
        let top = busiest_windows(&load, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].airport, "CYYZ");
        assert_eq!(top[0].window.ops, 2);
        assert_eq!(top[1].window.ops, 1);
        assert!(top[0].window.busy);
    }

    #[test]
    fn rejects_non_positive_window() {
        assert!(compute_airport_load(&[], 0, 100, 0).is_err());
    }
}
