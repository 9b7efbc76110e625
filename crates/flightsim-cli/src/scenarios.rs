//! Pre-defined and synthetic flight scenarios.

use flightsim_core::trajectory::{build_waypoints, route_length_nm};
use flightsim_core::{interpolate, AirportTable, Flight, LatLon};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::builtin_airports;

/// A named schedule.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub flights: Vec<Flight>,
}

/// Format a point as a route token, e.g. `44.50N/076.20W`.
pub fn format_waypoint(p: LatLon) -> String {
    format!(
        "{:.2}{}/{:06.2}{}",
        p.lat.abs(),
        if p.lat >= 0.0 { 'N' } else { 'S' },
        p.lon.abs(),
        if p.lon >= 0.0 { 'E' } else { 'W' },
    )
}

/// Fill in the arrival time from route length and speed.
fn with_block_time(flight: Flight, airports: &AirportTable) -> Flight {
    let Ok(points) = build_waypoints(&flight, airports) else {
        return flight;
    };
    if flight.speed_knots <= 0.0 {
        return flight;
    }
    let block_secs = (route_length_nm(&points) / flight.speed_knots * 3600.0).round() as i64;
    let arrival = flight.departure_time + block_secs;
    flight.with_arrival_time(arrival)
}

/// Two flights head-on on the Toronto-Montreal airway at the same level.
pub fn create_head_on_scenario(t0: i64) -> Scenario {
    let airports = builtin_airports();
    Scenario {
        name: "head-on".to_string(),
        flights: vec![
            with_block_time(Flight::new("ACA401", "CYYZ", "CYUL", t0, 450.0, 35000.0), &airports),
            with_block_time(Flight::new("ACA402", "CYUL", "CYYZ", t0, 450.0, 35000.0), &airports),
        ],
    }
}

/// Same route and time, 2000 ft apart. Separated throughout.
pub fn create_stacked_scenario(t0: i64) -> Scenario {
    let airports = builtin_airports();
    Scenario {
        name: "stacked".to_string(),
        flights: vec![
            with_block_time(Flight::new("WJA101", "CYYZ", "CYOW", t0, 420.0, 33000.0), &airports),
            with_block_time(Flight::new("WJA102", "CYYZ", "CYOW", t0, 420.0, 35000.0), &airports),
        ],
    }
}

/// Four flights timed to arrive over Montreal together.
pub fn create_converging_scenario(t0: i64) -> Scenario {
    let airports = builtin_airports();
    let origins = ["CYYZ", "CYOW", "CYQB", "CYHZ"];
    let speed = 450.0;

    let flights = origins
        .iter()
        .enumerate()
        .filter_map(|(i, origin)| {
            let from = airports.get(origin)?;
            let to = airports.get("CYUL")?;
            let block_secs = flightsim_core::distance_nm(from, to) / speed * 3600.0;
            // everyone lands at t0 + 2h
            let departure = t0 + 7200 - block_secs.round() as i64;
            Some(with_block_time(
                Flight::new(format!("CNV{:03}", i + 1), *origin, "CYUL", departure, speed, 24000.0),
                &airports,
            ))
        })
        .collect();

    Scenario {
        name: "converging".to_string(),
        flights,
    }
}

/// Seeded random traffic between `codes`, departing within `span_secs` of
/// `t0`. Roughly a third of flights file an intermediate waypoint.
pub fn generate_traffic(
    seed: u64,
    codes: &[&str],
    count: usize,
    t0: i64,
    span_secs: i64,
) -> Scenario {
    let airports = builtin_airports();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut flights = Vec::with_capacity(count);

    if codes.len() < 2 {
        return Scenario {
            name: format!("traffic-{seed}"),
            flights,
        };
    }

    for i in 0..count {
        let dep = codes[rng.random_range(0..codes.len())];
        let arr = loop {
            let candidate = codes[rng.random_range(0..codes.len())];
            if candidate != dep {
                break candidate;
            }
        };
        let departure = t0 + rng.random_range(0..span_secs.max(1));
        let speed = rng.random_range(380.0..520.0f64).round();
        let level = rng.random_range(24..=39) as f64 * 1000.0;
        let prefix = if rng.random_bool(0.15) { "CGO" } else { "ACA" };

        let acid = format!("{prefix}{:03}", i + 1);
        let mut flight = Flight::new(acid, dep, arr, departure, speed, level);
        if prefix == "CGO" {
            flight = flight.cargo();
        }
        if let (Some(a), Some(b)) = (airports.get(dep), airports.get(arr)) {
            if rng.random_bool(0.33) {
                let mid = interpolate(a, b, 0.5);
                let jitter = LatLon::new(
                    mid.lat + rng.random_range(-0.3..0.3),
                    mid.lon + rng.random_range(-0.3..0.3),
                );
                flight = flight.with_route(format_waypoint(jitter));
            }
        }
        flights.push(with_block_time(flight, &airports));
    }

    Scenario {
        name: format!("traffic-{seed}"),
        flights,
    }
}

/// Busy morning departure bank on the Toronto-Montreal-Ottawa corridor.
pub fn create_corridor_push(seed: u64, t0: i64) -> Scenario {
    let mut scenario = generate_traffic(seed, &["CYYZ", "CYUL", "CYOW"], 24, t0, 1800);
    // a guaranteed loss of separation: a second section right behind the first
    if let Some(lead) = scenario.flights.first().cloned() {
        let mut trail = lead;
        trail.acid = "ACA999".to_string();
        scenario.flights.push(trail);
    }
    scenario.name = "corridor-push".to_string();
    scenario
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightsim_core::{detect_conflicts, snapshot, EditSet};

    #[test]
    fn waypoint_format_round_trips_through_route_parser() {
        let token = format_waypoint(LatLon::new(44.5, -76.2));
        assert_eq!(token, "44.50N/076.20W");
        let parsed = flightsim_core::parse_route(&token).unwrap();
        assert!((parsed[0].lat - 44.5).abs() < 1e-9);
        assert!((parsed[0].lon + 76.2).abs() < 1e-9);
    }

    #[test]
    fn generated_traffic_is_reproducible() {
        let a = generate_traffic(7, &["CYYZ", "CYUL", "CYOW"], 20, 0, 3600);
        let b = generate_traffic(7, &["CYYZ", "CYUL", "CYOW"], 20, 0, 3600);
        assert_eq!(a.flights, b.flights);
        assert_eq!(a.flights.len(), 20);
        assert!(a
            .flights
            .iter()
            .all(|f| f.departure_airport != f.arrival_airport && f.arrival_time.is_some()));
    }

    #[test]
    fn head_on_pair_meets_midway() {
        let scenario = create_head_on_scenario(0);
        let airports = builtin_airports();
        let arrival = scenario.flights[0].scheduled_arrival();
        let found = (0..arrival).step_by(10).any(|t| {
            let entries = snapshot(&scenario.flights, t, &EditSet::new(), &airports);
            !detect_conflicts(&entries, 5.0, 2000.0).is_empty()
        });
        assert!(found);
    }

    #[test]
    fn stacked_pair_never_conflicts() {
        let scenario = create_stacked_scenario(0);
        let airports = builtin_airports();
        for t in (0..7200).step_by(60) {
            let entries = snapshot(&scenario.flights, t, &EditSet::new(), &airports);
            assert!(detect_conflicts(&entries, 5.0, 2000.0).is_empty());
        }
    }

    #[test]
    fn converging_flights_share_arrival() {
        let scenario = create_converging_scenario(0);
        assert_eq!(scenario.flights.len(), 4);
        for flight in &scenario.flights {
            assert!((flight.scheduled_arrival() - 7200).abs() <= 1);
        }
    }

    #[test]
    fn corridor_push_has_a_trailing_twin() {
        let scenario = create_corridor_push(42, 0);
        assert_eq!(scenario.flights.len(), 25);
        let lead = &scenario.flights[0];
        let trail = scenario.flights.last().unwrap();
        assert_eq!(trail.acid, "ACA999");
        assert_eq!(trail.departure_time, lead.departure_time);
    }
}
