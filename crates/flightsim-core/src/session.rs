//! A loaded schedule plus the edits accepted so far.

use crate::airport_load::{compute_airport_load, AirportLoad};
use crate::conflict::{Conflict, ConflictDetector};
use crate::error::{CoreError, Result};
use crate::hotspot::{compute_hotspots, HotspotCell, HotspotOptions};
use crate::models::{AirportTable, Edit, EditSet, Flight};
use crate::optimizer::{compute_metrics, optimize_from, OptimizationResult, OptimizerConfig};
use crate::rules::SeparationRules;
use crate::scoring::ScenarioMetrics;
use crate::snapshot::{snapshot_with_stats, Snapshot};
use crate::spatial::Interpolation;
use crate::suggestions::Suggestion;

/// Flights and airports are fixed once loaded; only the edit set changes.
#[derive(Debug, Clone)]
pub struct Session {
    airports: AirportTable,
    flights: Vec<Flight>,
    edits: EditSet,
    detector: ConflictDetector,
    interpolation: Interpolation,
}

impl Session {
    pub fn new(flights: Vec<Flight>, airports: AirportTable) -> Self {
        let detector = ConflictDetector::new(SeparationRules::default());
        Self {
            airports,
            flights,
            edits: EditSet::new(),
            detector,
            interpolation: Interpolation::default(),
        }
    }

    /// Replace the separation rules used by [`Session::conflicts`].
    pub fn with_rules(mut self, rules: SeparationRules) -> Self {
        self.detector = ConflictDetector::with_airports(rules, &self.airports);
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn airports(&self) -> &AirportTable {
        &self.airports
    }

    pub fn edits(&self) -> &EditSet {
        &self.edits
    }

    pub fn rules(&self) -> &SeparationRules {
        self.detector.rules()
    }

    pub fn flight(&self, acid: &str) -> Option<&Flight> {
        self.flights.iter().find(|f| f.acid == acid)
    }

    pub fn snapshot(&self, time: i64) -> Snapshot<'_> {
        snapshot_with_stats(&self.flights, time, &self.edits, &self.airports, self.interpolation)
    }

    pub fn conflicts(&self, time: i64) -> Vec<Conflict<'_>> {
        self.detector.detect(&self.snapshot(time).entries)
    }

    /// Hotspots under the accepted edits. The session's interpolation
    /// replaces `options.interpolation`.
    pub fn hotspots(
        &self,
        t_start: i64,
        t_end: i64,
        options: &HotspotOptions,
    ) -> Result<Vec<HotspotCell>> {
        let options = HotspotOptions {
            interpolation: self.interpolation,
            ..options.clone()
        };
        compute_hotspots(&self.flights, t_start, t_end, &options, &self.airports, &self.edits)
    }

    /// Load windows for the baseline schedule. Edits do not move movements
    /// between windows.
    pub fn airport_load(&self, t_start: i64, t_end: i64, window_secs: i64) -> Result<AirportLoad> {
        compute_airport_load(&self.flights, t_start, t_end, window_secs)
    }

    /// Metrics of the schedule under the accepted edits.
    pub fn metrics(&self, config: &OptimizerConfig) -> Result<ScenarioMetrics> {
        compute_metrics(&self.flights, &self.airports, &self.edits, &self.optimizer_config(config))
    }

    fn optimizer_config(&self, config: &OptimizerConfig) -> OptimizerConfig {
        OptimizerConfig {
            interpolation: self.interpolation,
            ..config.clone()
        }
    }

    /// Overlay `edit` onto the flight's accepted edit.
    pub fn apply_edit(&mut self, acid: &str, edit: &Edit) -> Result<()> {
        if self.flight(acid).is_none() {
            return Err(CoreError::UnknownFlight(acid.to_string()));
        }
        self.edits.overlay(acid, edit);
        tracing::debug!(acid, edits = self.edits.len(), "edit applied");
        Ok(())
    }

    /// Turn a suggestion into an edit and apply it. Returns the edit used.
    pub fn apply_suggestion(&mut self, suggestion: &Suggestion) -> Result<Edit> {
        let flight = self
            .flight(&suggestion.target)
            .ok_or_else(|| CoreError::UnknownFlight(suggestion.target.clone()))?;
        let edit = suggestion.to_edit(flight)?;
        self.edits.overlay(&suggestion.target, &edit);
        tracing::debug!(acid = %suggestion.target, kind = ?suggestion.kind, "suggestion applied");
        Ok(edit)
    }

    pub fn undo_edit(&mut self, acid: &str) -> Option<Edit> {
        self.edits.remove(acid)
    }

    pub fn reset_edits(&mut self) {
        self.edits.clear();
    }

    /// Optimize starting from the accepted edits. The result is only a
    /// proposal until passed to [`Session::adopt`].
    pub fn optimize(&self, config: &OptimizerConfig) -> Result<OptimizationResult> {
        optimize_from(&self.flights, &self.airports, &self.edits, &self.optimizer_config(config))
    }

    /// Accept proposed edits, replacing any existing edit per flight.
    pub fn adopt(&mut self, edits: EditSet) {
        self.edits.merge(edits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LatLon;
    use crate::suggestions::{RuleBasedProvider, SuggestionKind, SuggestionProvider};

    fn session() -> Session {
        let airports: AirportTable = [
            ("CYYZ", LatLon::new(43.68, -79.63)),
            ("CYUL", LatLon::new(45.47, -73.74)),
        ]
        .into_iter()
        .collect();
        Session::new(
            vec![
                Flight::new("A", "CYYZ", "CYUL", 0, 450.0, 35000.0),
                Flight::new("B", "CYYZ", "CYUL", 0, 450.0, 35000.0),
            ],
            airports,
        )
    }

    #[test]
    fn edits_change_conflicts_and_undo_restores() {
        let mut session = session();
        assert_eq!(session.conflicts(600).len(), 1);

        session.apply_edit("B", &Edit::altitude(2000.0)).unwrap();
        assert!(session.conflicts(600).is_empty());

        assert_eq!(session.undo_edit("B"), Some(Edit::altitude(2000.0)));
        assert_eq!(session.conflicts(600).len(), 1);

        assert!(matches!(
            session.apply_edit("ZZZ", &Edit::delay(60)),
            Err(CoreError::UnknownFlight(_))
        ));
    }

    #[test]
    fn applying_top_suggestion_resolves_conflict() {
        let mut session = session();
        let suggestion = {
            let conflicts = session.conflicts(600);
            RuleBasedProvider::default().suggest(&conflicts[0]).remove(0)
        };
        assert_eq!(suggestion.kind, SuggestionKind::Altitude);

        let edit = session.apply_suggestion(&suggestion).unwrap();
        assert_eq!(edit.altitude_delta_ft, Some(3000.0));
        assert!(session.conflicts(600).is_empty());
    }

    #[test]
    fn suggestions_stack_on_accepted_edits() {
        let mut session = Session::new(
            vec![
                Flight::new("CGO1", "CYYZ", "CYUL", 0, 400.0, 30000.0).cargo(),
                Flight::new("ACA2", "CYYZ", "CYUL", 0, 400.0, 30000.0),
            ],
            session().airports().clone(),
        );
        session.apply_edit("CGO1", &Edit::delay(600)).unwrap();
        session.apply_edit("CGO1", &Edit::speed(-20.0)).unwrap();
        session.apply_edit("ACA2", &Edit::delay(600)).unwrap();
        session.apply_edit("ACA2", &Edit::speed(-20.0)).unwrap();

        let found = {
            let conflicts = session.conflicts(1200);
            assert_eq!(conflicts.len(), 1);
            RuleBasedProvider::default().suggest(&conflicts[0])
        };
        let delay = found.iter().find(|s| s.kind == SuggestionKind::Time).unwrap();
        assert_eq!(delay.target, "CGO1");
        assert_eq!(delay.new_departure_time, Some(900));
        let slow = found.iter().find(|s| s.kind == SuggestionKind::Speed).unwrap();
        assert_eq!(slow.new_speed_kts, Some(360.0));

        assert_eq!(session.apply_suggestion(delay).unwrap(), Edit::delay(900));
        assert_eq!(session.apply_suggestion(slow).unwrap(), Edit::speed(-40.0));
        let edit = session.edits().get("CGO1").unwrap();
        assert_eq!(edit.departure_time_delta, Some(900));
        assert_eq!(edit.speed_delta_kts, Some(-40.0));
    }

    #[test]
    fn optimize_proposes_and_adopt_applies() {
        let mut session = session();
        let config = OptimizerConfig::default();
        let result = session.optimize(&config).unwrap();
        assert!(session.edits().is_empty());
        assert!(!result.edits.is_empty());

        session.adopt(result.edits.clone());
        assert_eq!(session.edits(), &result.edits);
        assert_eq!(session.metrics(&config).unwrap(), result.final_metrics);

        session.reset_edits();
        assert!(session.edits().is_empty());
    }

    #[test]
    fn optimize_starts_from_accepted_edits() {
        let mut session = session();
        session.apply_edit("B", &Edit::altitude(2000.0)).unwrap();

        let config = OptimizerConfig::default();
        let result = session.optimize(&config).unwrap();
        assert_eq!(result.base_metrics, session.metrics(&config).unwrap());
        assert_eq!(result.base_metrics.conflicts, 0);
        assert_eq!(result.edits.get("B"), Some(&Edit::altitude(2000.0)));
    }

    #[test]
    fn interpolation_reaches_every_analytic() {
        let session = session().with_interpolation(Interpolation::Linear);
        let config = OptimizerConfig::default();
        let linear = OptimizerConfig {
            interpolation: Interpolation::Linear,
            ..config.clone()
        };
        assert_eq!(
            session.metrics(&config).unwrap(),
            compute_metrics(session.flights(), session.airports(), session.edits(), &linear)
                .unwrap()
        );

        let cells = session.hotspots(600, 600, &HotspotOptions::default()).unwrap();
        let expected = compute_hotspots(
            session.flights(),
            600,
            600,
            &HotspotOptions {
                interpolation: Interpolation::Linear,
                ..HotspotOptions::default()
            },
            session.airports(),
            session.edits(),
        )
        .unwrap();
        assert_eq!(cells, expected);
    }

    #[test]
    fn airport_load_covers_both_ends() {
        let load = session().airport_load(0, 3600, 900).unwrap();
        assert_eq!(load["CYYZ"][0].deps, 2);
        assert_eq!(load["CYUL"].iter().map(|w| w.arrs).sum::<u32>(), 0);
    }
}
