//! Remedy suggestions for a single conflict.
//!
//! Providers are pluggable; [`RuleBasedProvider`] is the built-in fallback
//! and needs nothing beyond the conflict record itself.

use crate::conflict::Conflict;
use crate::error::{CoreError, Result};
use crate::models::{Edit, Flight};
use crate::rules::SeparationRules;
use crate::snapshot::SnapshotEntry;
use crate::trajectory::parse_coord;
use serde::{Deserialize, Serialize};

/// Offset applied to the first route waypoint by [`offset_route`], in degrees.
pub const ROUTE_OFFSET_DEG: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Altitude,
    Speed,
    Route,
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Impact {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    /// ACID of the flight to change
    pub target: String,
    pub action: String,
    pub description: String,
    /// 0..=1
    pub confidence: f64,
    pub impact: Impact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_altitude_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_speed_kts: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_departure_time: Option<i64>,
    /// Name of the provider that produced it
    #[serde(default)]
    pub source: String,
}

impl Suggestion {
    /// Express the suggestion as an edit against the unedited `flight`.
    ///
    /// Absolute targets become deltas from the flight's scheduled values,
    /// so a target built from an already edited entry keeps that edit.
    pub fn to_edit(&self, flight: &Flight) -> Result<Edit> {
        let incomplete = || CoreError::IncompleteSuggestion {
            kind: format!("{:?}", self.kind).to_lowercase(),
            target: self.target.clone(),
        };
        let edit = match self.kind {
            SuggestionKind::Altitude => {
                Edit::altitude(self.new_altitude_ft.ok_or_else(incomplete)? - flight.altitude_ft)
            }
            SuggestionKind::Speed => {
                Edit::speed(self.new_speed_kts.ok_or_else(incomplete)? - flight.speed_knots)
            }
            SuggestionKind::Time => Edit::delay(
                self.new_departure_time.ok_or_else(incomplete)? - flight.departure_time,
            ),
            SuggestionKind::Route => Edit::route(self.new_route.clone().ok_or_else(incomplete)?),
        };
        Ok(edit)
    }
}

/// Source of ranked remedies for a conflict.
pub trait SuggestionProvider {
    fn name(&self) -> &str;

    /// Suggestions for `conflict`, in any order. Empty when the provider has
    /// nothing to offer.
    fn suggest(&self, conflict: &Conflict<'_>) -> Vec<Suggestion>;
}

/// Shift the first route waypoint north-east by [`ROUTE_OFFSET_DEG`].
///
/// Returns `None` for an empty route or an unreadable first waypoint.
pub fn offset_route(route: &str) -> Option<String> {
    let mut tokens: Vec<String> = route.split_whitespace().map(str::to_string).collect();
    let first = tokens.first_mut()?;
    let (lat, lon) = first.split_once('/')?;
    let lat = parse_coord(lat).ok()? + ROUTE_OFFSET_DEG;
    let lon = parse_coord(lon).ok()? + ROUTE_OFFSET_DEG;
    *first = format!(
        "{:.2}{}/{:.2}{}",
        lat.abs(),
        if lat >= 0.0 { 'N' } else { 'S' },
        lon.abs(),
        if lon >= 0.0 { 'E' } else { 'W' },
    );
    Some(tokens.join(" "))
}

/// Fixed-rule remedies: climb, slow down, offset laterally, or delay.
#[derive(Debug, Clone)]
pub struct RuleBasedProvider {
    pub rules: SeparationRules,
    /// A flight is early in its trip while airborne for less than this
    pub early_stage_secs: i64,
    /// Knots taken off a flight for a speed suggestion
    pub speed_reduction_kts: f64,
    pub delay_secs: i64,
}

impl Default for RuleBasedProvider {
    fn default() -> Self {
        Self {
            rules: SeparationRules::default(),
            early_stage_secs: 3600,
            speed_reduction_kts: 20.0,
            delay_secs: 300,
        }
    }
}

impl RuleBasedProvider {
    fn is_early(&self, entry: &SnapshotEntry<'_>) -> bool {
        entry.time - entry.departure_time < self.early_stage_secs
    }

    fn suggestion(&self, kind: SuggestionKind, target: &str, impact: Impact) -> Suggestion {
        Suggestion {
            kind,
            target: target.to_string(),
            action: String::new(),
            description: String::new(),
            confidence: 0.0,
            impact,
            new_altitude_ft: None,
            new_speed_kts: None,
            new_route: None,
            new_departure_time: None,
            source: self.name().to_string(),
        }
    }
}

impl SuggestionProvider for RuleBasedProvider {
    fn name(&self) -> &str {
        "rules"
    }

    fn suggest(&self, conflict: &Conflict<'_>) -> Vec<Suggestion> {
        let (a, b) = (&conflict.a, &conflict.b);
        let mut out = Vec::new();

        if conflict.v_ft < self.rules.vertical_ft {
            let (higher, lower) = if a.altitude_ft > b.altitude_ft { (a, b) } else { (b, a) };
            let needed = self.rules.vertical_ft - conflict.v_ft;

            for (entry, confidence, description) in [
                (lower, 0.85, "for vertical separation"),
                (higher, 0.75, "for additional safety margin"),
            ] {
                let acid = entry.acid();
                let new_altitude = entry.altitude_ft + needed + 1000.0;
                out.push(Suggestion {
                    action: format!("Increase {acid} altitude by {needed:.0} ft"),
                    description: format!("Climb {acid} to {new_altitude:.0} ft {description}"),
                    confidence,
                    new_altitude_ft: Some(new_altitude),
                    ..self.suggestion(SuggestionKind::Altitude, acid, Impact::Low)
                });
            }
        }

        if conflict.h_nm < self.rules.horizontal_nm {
            let slow = if a.flight.is_cargo { a } else { b };
            let acid = slow.acid();
            out.push(Suggestion {
                action: format!("Reduce {acid} speed by {:.0} knots", self.speed_reduction_kts),
                description: format!("Slow {acid} to create temporal separation"),
                confidence: 0.70,
                new_speed_kts: Some(slow.speed_knots - self.speed_reduction_kts),
                ..self.suggestion(SuggestionKind::Speed, acid, Impact::Medium)
            });
        }

        if conflict.h_nm < self.rules.horizontal_nm && conflict.v_ft >= self.rules.vertical_ft {
            if let Some(new_route) = a.flight.route.as_deref().and_then(offset_route) {
                let acid = a.acid();
                out.push(Suggestion {
                    action: format!("Add minor waypoint offset for {acid}"),
                    description: "Small lateral deviation of 5-10 NM for horizontal separation"
                        .to_string(),
                    confidence: 0.65,
                    new_route: Some(new_route),
                    ..self.suggestion(SuggestionKind::Route, acid, Impact::Medium)
                });
            }
        }

        let any_cargo = a.flight.is_cargo || b.flight.is_cargo;
        if any_cargo && (self.is_early(a) || self.is_early(b)) {
            let held = if a.flight.is_cargo { a } else { b };
            let acid = held.acid();
            out.push(Suggestion {
                action: format!("Delay {acid} by {} minutes", self.delay_secs / 60),
                description: format!("Delay {acid} departure to avoid temporal overlap"),
                confidence: 0.90,
                new_departure_time: Some(held.departure_time + self.delay_secs),
                ..self.suggestion(SuggestionKind::Time, acid, Impact::High)
            });
        }

        out
    }
}

/// Providers queried in order; the first non-empty answer wins.
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Box<dyn SuggestionProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl SuggestionProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Suggestions ranked by confidence, highest first.
    pub fn suggest(&self, conflict: &Conflict<'_>) -> Vec<Suggestion> {
        for provider in &self.providers {
            let mut found = provider.suggest(conflict);
            if found.is_empty() {
                tracing::debug!(provider = provider.name(), "no suggestions");
                continue;
            }
            found.sort_by(|x, y| y.confidence.total_cmp(&x.confidence));
            return found;
        }
        Vec::new()
    }
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LatLon;

    fn entry(flight: &Flight, lat: f64, altitude_ft: f64, time: i64) -> SnapshotEntry<'_> {
        SnapshotEntry {
            flight,
            position: LatLon::new(lat, -75.0),
            altitude_ft,
            departure_time: flight.departure_time,
            speed_knots: flight.speed_knots,
            time,
        }
    }

    fn conflict<'a>(a: SnapshotEntry<'a>, b: SnapshotEntry<'a>, h_nm: f64) -> Conflict<'a> {
        let v_ft = (a.altitude_ft - b.altitude_ft).abs();
        let time = a.time;
        Conflict { a, b, h_nm, v_ft, time }
    }

    struct Silent;

    impl SuggestionProvider for Silent {
        fn name(&self) -> &str {
            "silent"
        }
        fn suggest(&self, _: &Conflict<'_>) -> Vec<Suggestion> {
            Vec::new()
        }
    }

    #[test]
    fn offset_route_shifts_first_waypoint() {
        assert_eq!(
            offset_route("44.50N/76.20W 45.00N/75.00W").as_deref(),
            Some("44.60N/76.10W 45.00N/75.00W")
        );
        assert_eq!(offset_route("0.05S/0.05W").as_deref(), Some("0.05N/0.05E"));
        assert_eq!(offset_route("   "), None);
        assert_eq!(offset_route("garbage"), None);
    }

    #[test]
    fn passenger_pair_gets_climbs_and_speed() {
        let a = Flight::new("ACA1", "CYYZ", "CYUL", 0, 450.0, 35000.0);
        let b = Flight::new("ACA2", "CYYZ", "CYUL", 0, 460.0, 34000.0);
        let c = conflict(entry(&a, 45.0, 35000.0, 600), entry(&b, 45.01, 34000.0, 600), 0.6);

        let found = RuleBasedProvider::default().suggest(&c);
        let kinds: Vec<_> = found.iter().map(|s| (s.kind, s.target.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (SuggestionKind::Altitude, "ACA2"),
                (SuggestionKind::Altitude, "ACA1"),
                (SuggestionKind::Speed, "ACA2"),
            ]
        );
        // lower flight climbs 1000 ft to close the gap plus a 1000 ft margin
        assert_eq!(found[0].new_altitude_ft, Some(36000.0));
        assert_eq!(found[2].new_speed_kts, Some(440.0));
        assert!(found.iter().all(|s| s.source == "rules"));
    }

    #[test]
    fn early_cargo_flight_is_delayed_and_slowed() {
        let a = Flight::new("CGO1", "CYYZ", "CYUL", 0, 400.0, 30000.0).cargo();
        let b = Flight::new("ACA2", "CYYZ", "CYUL", 0, 450.0, 30000.0);
        let c = conflict(entry(&a, 45.0, 30000.0, 900), entry(&b, 45.0, 30000.0, 900), 0.0);

        let found = RuleBasedProvider::default().suggest(&c);
        let speed = found.iter().find(|s| s.kind == SuggestionKind::Speed).unwrap();
        assert_eq!(speed.target, "CGO1");
        let delay = found.iter().find(|s| s.kind == SuggestionKind::Time).unwrap();
        assert_eq!(delay.target, "CGO1");
        assert_eq!(delay.new_departure_time, Some(300));
        assert_eq!(delay.impact, Impact::High);
    }

    #[test]
    fn route_offset_only_when_vertically_separated() {
        let a = Flight::new("ACA1", "CYYZ", "CYUL", 0, 450.0, 35000.0).with_route("44.50N/76.20W");
        let b = Flight::new("ACA2", "CYYZ", "CYUL", 0, 450.0, 33000.0);
        let c = conflict(entry(&a, 45.0, 35000.0, 600), entry(&b, 45.0, 33000.0, 600), 1.0);

        let found = RuleBasedProvider::default().suggest(&c);
        let route = found.iter().find(|s| s.kind == SuggestionKind::Route).unwrap();
        assert_eq!(route.target, "ACA1");
        assert_eq!(route.new_route.as_deref(), Some("44.60N/76.10W"));
        assert!(found.iter().all(|s| s.kind != SuggestionKind::Altitude));
    }

    #[test]
    fn to_edit_uses_deltas_from_schedule() {
        let flight = Flight::new("ACA1", "CYYZ", "CYUL", 1000, 450.0, 35000.0);
        let base =
            RuleBasedProvider::default().suggestion(SuggestionKind::Altitude, "ACA1", Impact::Low);

        let climb = Suggestion {
            new_altitude_ft: Some(37000.0),
            ..base.clone()
        };
        assert_eq!(climb.to_edit(&flight).unwrap(), Edit::altitude(2000.0));

        let delay = Suggestion {
            kind: SuggestionKind::Time,
            new_departure_time: Some(1300),
            ..base.clone()
        };
        assert_eq!(delay.to_edit(&flight).unwrap(), Edit::delay(300));

        let missing = Suggestion {
            kind: SuggestionKind::Speed,
            ..base
        };
        assert!(matches!(
            missing.to_edit(&flight),
            Err(CoreError::IncompleteSuggestion { .. })
        ));
    }

    #[test]
    fn chain_falls_through_and_ranks_by_confidence() {
        let a = Flight::new("CGO1", "CYYZ", "CYUL", 0, 400.0, 30000.0).cargo();
        let b = Flight::new("ACA2", "CYYZ", "CYUL", 0, 450.0, 30000.0);
        let c = conflict(entry(&a, 45.0, 30000.0, 900), entry(&b, 45.0, 30000.0, 900), 0.0);

        assert!(ProviderChain::new().suggest(&c).is_empty());
        assert!(ProviderChain::new().with(Silent).suggest(&c).is_empty());

        let chain = ProviderChain::new().with(Silent).with(RuleBasedProvider::default());
        let ranked = chain.suggest(&c);
        assert!(!ranked.is_empty());
        assert_eq!(ranked[0].kind, SuggestionKind::Time);
        assert!(ranked.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }
}
