//! Waypoint construction and position-along-route evaluation.

use crate::error::TrajectoryError;
use crate::models::{AirportTable, Edit, Flight, LatLon};
use crate::spatial::{distance_nm, Interpolation};

/// Parse a signed-direction coordinate such as `43.68N` or `79.63W`.
pub fn parse_coord(token: &str) -> Result<f64, TrajectoryError> {
    let malformed = || TrajectoryError::MalformedCoordinate(token.to_string());

    let trimmed = token.trim();
    let mut chars = trimmed.chars();
    let direction = chars.next_back().ok_or_else(malformed)?;
    let magnitude: f64 = chars.as_str().parse().map_err(|_| malformed())?;
    if !magnitude.is_finite() {
        return Err(malformed());
    }

    match direction.to_ascii_uppercase() {
        'N' | 'E' => Ok(magnitude),
        'S' | 'W' => Ok(-magnitude),
        _ => Err(malformed()),
    }
}

/// Parse a route string of whitespace separated `lat/lon` tokens.
pub fn parse_route(route: &str) -> Result<Vec<LatLon>, TrajectoryError> {
    route
        .split_whitespace()
        .map(|token| {
            let (lat, lon) = token
                .split_once('/')
                .ok_or_else(|| TrajectoryError::MalformedRouteToken(token.to_string()))?;
            Ok(LatLon::new(parse_coord(lat)?, parse_coord(lon)?))
        })
        .collect()
}

/// Departure airport, parsed route midpoints, arrival airport.
pub fn build_waypoints(
    flight: &Flight,
    airports: &AirportTable,
) -> Result<Vec<LatLon>, TrajectoryError> {
    waypoints_via(flight, flight.route.as_deref(), airports)
}

fn waypoints_via(
    flight: &Flight,
    route: Option<&str>,
    airports: &AirportTable,
) -> Result<Vec<LatLon>, TrajectoryError> {
    let departure = airports
        .get(&flight.departure_airport)
        .ok_or_else(|| TrajectoryError::UnknownAirport(flight.departure_airport.clone()))?;
    let arrival = airports
        .get(&flight.arrival_airport)
        .ok_or_else(|| TrajectoryError::UnknownAirport(flight.arrival_airport.clone()))?;

    let midpoints = match route {
        Some(route) => parse_route(route)?,
        None => Vec::new(),
    };

    let mut points = Vec::with_capacity(midpoints.len() + 2);
    points.push(departure);
    points.extend(midpoints);
    points.push(arrival);
    Ok(points)
}

/// Total length of a waypoint sequence in nautical miles.
pub fn route_length_nm(points: &[LatLon]) -> f64 {
    points
        .windows(2)
        .map(|leg| distance_nm(leg[0], leg[1]))
        .sum()
}

/// Position at `query_time` for a flight departing at `departure_time`.
///
/// Returns `None` before departure and once the distance flown reaches the
/// route length; arrived flights are not clamped to their destination.
/// A non-positive speed keeps the aircraft at its departure point.
pub fn position_at(
    points: &[LatLon],
    departure_time: i64,
    speed_knots: f64,
    query_time: i64,
    interpolation: Interpolation,
) -> Option<LatLon> {
    let elapsed = query_time - departure_time;
    if elapsed < 0 {
        return None;
    }

    let mut remaining = (elapsed as f64 * (speed_knots / 3600.0)).max(0.0);
    let total = route_length_nm(points);
    if remaining >= total {
        return None;
    }

    for leg in points.windows(2) {
        let leg_nm = distance_nm(leg[0], leg[1]);
        if leg_nm <= 0.0 {
            continue;
        }
        if remaining <= leg_nm {
            return Some(interpolation.apply(leg[0], leg[1], remaining / leg_nm));
        }
        remaining -= leg_nm;
    }
    None
}

/// A flight's path with edits already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub waypoints: Vec<LatLon>,
    pub departure_time: i64,
    pub speed_knots: f64,
    pub altitude_ft: f64,
}

impl Trajectory {
    /// Resolve a flight's trajectory, applying `edit` when present.
    pub fn resolve(
        flight: &Flight,
        edit: Option<&Edit>,
        airports: &AirportTable,
    ) -> Result<Self, TrajectoryError> {
        let route = edit
            .and_then(|e| e.route_override.as_deref())
            .or(flight.route.as_deref());
        let waypoints = waypoints_via(flight, route, airports)?;

        let (delay, altitude_delta, speed_delta) = edit
            .map(|e| (e.delay_secs(), e.altitude_change_ft(), e.speed_change_kts()))
            .unwrap_or((0, 0.0, 0.0));

        Ok(Self {
            waypoints,
            departure_time: flight.departure_time + delay,
            speed_knots: flight.speed_knots + speed_delta,
            altitude_ft: flight.altitude_ft + altitude_delta,
        })
    }

    pub fn position(&self, query_time: i64, interpolation: Interpolation) -> Option<LatLon> {
        position_at(
            &self.waypoints,
            self.departure_time,
            self.speed_knots,
            query_time,
            interpolation,
        )
    }
}
