//! Core data models for schedule analytics.
//!
//! Field names on [`Flight`] follow the flight dataset format, so a dataset
//! file deserializes straight into `Vec<Flight>`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Block time assumed when a flight carries no arrival time.
pub const DEFAULT_BLOCK_TIME_SECS: i64 = 3600;

/// A point in geodetic degrees.
///
/// Serialized as a `[lat, lon]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<[f64; 2]> for LatLon {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

impl From<LatLon> for [f64; 2] {
    fn from(p: LatLon) -> Self {
        [p.lat, p.lon]
    }
}

/// Airport code to coordinates. Read-only for the lifetime of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AirportTable(BTreeMap<String, LatLon>);

impl AirportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, position: LatLon) {
        self.0.insert(code.into(), position);
    }

    pub fn get(&self, code: &str) -> Option<LatLon> {
        self.0.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, LatLon)> {
        self.0.iter().map(|(code, p)| (code.as_str(), *p))
    }

    pub fn positions(&self) -> impl Iterator<Item = LatLon> + '_ {
        self.0.values().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, LatLon)> for AirportTable {
    fn from_iter<I: IntoIterator<Item = (S, LatLon)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(code, p)| (code.into(), p)).collect())
    }
}

/// A scheduled flight as loaded from the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    #[serde(rename = "ACID")]
    pub acid: String,
    #[serde(rename = "departure airport")]
    pub departure_airport: String,
    #[serde(rename = "arrival airport")]
    pub arrival_airport: String,
    /// Unix seconds
    #[serde(rename = "departure time")]
    pub departure_time: i64,
    /// Unix seconds
    #[serde(rename = "arrival time", default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<i64>,
    /// Cruise speed in knots, constant for the whole flight
    #[serde(rename = "aircraft speed")]
    pub speed_knots: f64,
    /// Cruise altitude in feet
    #[serde(rename = "altitude", default)]
    pub altitude_ft: f64,
    /// Intermediate waypoints as whitespace separated `lat/lon` tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default)]
    pub is_cargo: bool,
}

impl Flight {
    pub fn new(
        acid: impl Into<String>,
        departure_airport: impl Into<String>,
        arrival_airport: impl Into<String>,
        departure_time: i64,
        speed_knots: f64,
        altitude_ft: f64,
    ) -> Self {
        Self {
            acid: acid.into(),
            departure_airport: departure_airport.into(),
            arrival_airport: arrival_airport.into(),
            departure_time,
            arrival_time: None,
            speed_knots,
            altitude_ft,
            route: None,
            is_cargo: false,
        }
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_arrival_time(mut self, arrival_time: i64) -> Self {
        self.arrival_time = Some(arrival_time);
        self
    }

    pub fn cargo(mut self) -> Self {
        self.is_cargo = true;
        self
    }

    /// Arrival time from the schedule, or departure plus the default block time.
    pub fn scheduled_arrival(&self) -> i64 {
        self.arrival_time
            .unwrap_or(self.departure_time + DEFAULT_BLOCK_TIME_SECS)
    }

    /// `DEP->ARR` flow label.
    pub fn flow(&self) -> String {
        format!("{}->{}", self.departure_airport, self.arrival_airport)
    }
}

/// Non-destructive per-flight override applied at evaluation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    /// Seconds added to the departure time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time_delta: Option<i64>,
    /// Feet added to the cruise altitude
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_delta_ft: Option<f64>,
    /// Knots added to the cruise speed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_delta_kts: Option<f64>,
    /// Replacement route string
    #[serde(
        rename = "route_modification",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub route_override: Option<String>,
}

impl Edit {
    pub fn delay(secs: i64) -> Self {
        Self {
            departure_time_delta: Some(secs),
            ..Self::default()
        }
    }

    pub fn altitude(delta_ft: f64) -> Self {
        Self {
            altitude_delta_ft: Some(delta_ft),
            ..Self::default()
        }
    }

    pub fn speed(delta_kts: f64) -> Self {
        Self {
            speed_delta_kts: Some(delta_kts),
            ..Self::default()
        }
    }

    pub fn route(route: impl Into<String>) -> Self {
        Self {
            route_override: Some(route.into()),
            ..Self::default()
        }
    }

    /// Copy every field set on `other` over this edit. Unset fields are kept.
    pub fn overlay(&mut self, other: &Edit) {
        if other.departure_time_delta.is_some() {
            self.departure_time_delta = other.departure_time_delta;
        }
        if other.altitude_delta_ft.is_some() {
            self.altitude_delta_ft = other.altitude_delta_ft;
        }
        if other.speed_delta_kts.is_some() {
            self.speed_delta_kts = other.speed_delta_kts;
        }
        if other.route_override.is_some() {
            self.route_override = other.route_override.clone();
        }
    }

    pub fn delay_secs(&self) -> i64 {
        self.departure_time_delta.unwrap_or(0)
    }

    pub fn altitude_change_ft(&self) -> f64 {
        self.altitude_delta_ft.unwrap_or(0.0)
    }

    pub fn speed_change_kts(&self) -> f64 {
        self.speed_delta_kts.unwrap_or(0.0)
    }
}

/// Sparse set of edits keyed by ACID. A missing key means no change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditSet(BTreeMap<String, Edit>);

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, acid: &str) -> Option<&Edit> {
        self.0.get(acid)
    }

    /// Replace the whole edit for a flight.
    pub fn set(&mut self, acid: impl Into<String>, edit: Edit) {
        self.0.insert(acid.into(), edit);
    }

    /// Overlay `edit` onto the flight's existing edit, field by field.
    pub fn overlay(&mut self, acid: &str, edit: &Edit) {
        self.0.entry(acid.to_string()).or_default().overlay(edit);
    }

    pub fn remove(&mut self, acid: &str) -> Option<Edit> {
        self.0.remove(acid)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Take every flight's edit from `other`, replacing what is there.
    pub fn merge(&mut self, other: EditSet) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Edit)> {
        self.0.iter().map(|(acid, edit)| (acid.as_str(), edit))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Signed sum of departure delays, in minutes.
    pub fn total_delay_minutes(&self) -> f64 {
        self.0
            .values()
            .map(|edit| edit.delay_secs() as f64 / 60.0)
            .sum()
    }

    /// Sum of absolute altitude changes, in feet.
    pub fn total_altitude_change_ft(&self) -> f64 {
        self.0
            .values()
            .map(|edit| edit.altitude_change_ft().abs())
            .sum()
    }
}

impl<S: Into<String>> FromIterator<(S, Edit)> for EditSet {
    fn from_iter<I: IntoIterator<Item = (S, Edit)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(acid, edit)| (acid.into(), edit)).collect())
    }
}
