//! Greedy local search over departure delays and altitude changes.
//!
//! Each round looks at the worst hotspot under the accepted edits, tries a
//! fixed menu of single-field edits on its flights, and keeps the one trial
//! that lowers the scenario score the most.

use crate::conflict::count_conflicts;
use crate::error::{CoreError, Result};
use crate::hotspot::{compute_hotspots, time_buckets, HotspotOptions};
use crate::models::{AirportTable, Edit, EditSet, Flight};
use crate::rules::SeparationRules;
use crate::scoring::{score_scenario, ScenarioMetrics, ScoreWeights};
use crate::snapshot::snapshot_with_stats;
use crate::spatial::Interpolation;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub max_iterations: usize,
    /// Defaults to the earliest departure
    pub time_start: Option<i64>,
    /// Defaults to the latest scheduled arrival
    pub time_end: Option<i64>,
    pub time_bucket_secs: i64,
    pub cell_nm: f64,
    pub cell_ft: f64,
    /// Flights taken from the worst hotspot each round
    pub max_candidate_flights: usize,
    /// A bucket counts as a hotspot when more flights than this are airborne
    pub busy_bucket_threshold: usize,
    pub weights: ScoreWeights,
    pub time_deltas_min: Vec<i64>,
    pub altitude_deltas_ft: Vec<f64>,
    pub interpolation: Interpolation,
    /// Wall-clock budget, checked between rounds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Duration>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            time_start: None,
            time_end: None,
            time_bucket_secs: 300,
            cell_nm: 25.0,
            cell_ft: 2000.0,
            max_candidate_flights: 8,
            busy_bucket_threshold: 6,
            weights: ScoreWeights::default(),
            time_deltas_min: vec![5, 10, 15],
            altitude_deltas_ft: vec![2000.0, -2000.0],
            interpolation: Interpolation::default(),
            deadline: None,
        }
    }
}

impl OptimizerConfig {
    pub fn hotspot_options(&self) -> HotspotOptions {
        HotspotOptions {
            cell_nm: self.cell_nm,
            cell_ft: self.cell_ft,
            time_bucket_secs: self.time_bucket_secs,
            interpolation: self.interpolation,
        }
    }

    /// Analysis range: configured bounds, else the span of the schedule.
    /// `None` when there is nothing to bound it by.
    pub fn time_range(&self, flights: &[Flight]) -> Option<(i64, i64)> {
        let start = self
            .time_start
            .or_else(|| flights.iter().map(|f| f.departure_time).min())?;
        let end = self
            .time_end
            .or_else(|| flights.iter().map(Flight::scheduled_arrival).max())?;
        Some((start, end))
    }

    /// Candidate edits in trial order: delays first, then altitude changes.
    pub fn candidate_edits(&self) -> Vec<Edit> {
        self.time_deltas_min
            .iter()
            .map(|mins| Edit::delay(mins * 60))
            .chain(self.altitude_deltas_ft.iter().map(|ft| Edit::altitude(*ft)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No hotspot left to work on
    Converged,
    /// No candidate lowered the score
    NoImprovement,
    IterationLimit,
    Deadline,
    NoFlights,
}

/// One accepted move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedChange {
    pub acid: String,
    pub change: Edit,
    /// Scenario score after accepting this change
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub edits: EditSet,
    pub base_metrics: ScenarioMetrics,
    pub final_metrics: ScenarioMetrics,
    /// Rounds that accepted a change
    pub iterations: usize,
    pub stop_reason: StopReason,
    pub history: Vec<AcceptedChange>,
}

impl OptimizationResult {
    fn empty(initial: &EditSet, stop_reason: StopReason) -> Self {
        Self {
            edits: initial.clone(),
            base_metrics: ScenarioMetrics::default(),
            final_metrics: ScenarioMetrics::default(),
            iterations: 0,
            stop_reason,
            history: Vec::new(),
        }
    }
}

/// Aggregate metrics for one edit set over the configured range.
///
/// Conflicts are summed over every time bucket with default separation
/// minima; hotspots are buckets with more than `busy_bucket_threshold`
/// airborne flights.
pub fn compute_metrics(
    flights: &[Flight],
    airports: &AirportTable,
    edits: &EditSet,
    config: &OptimizerConfig,
) -> Result<ScenarioMetrics> {
    if config.time_bucket_secs <= 0 {
        return Err(CoreError::InvalidOptions(format!(
            "time_bucket_secs must be positive, got {}",
            config.time_bucket_secs
        )));
    }

    let mut metrics = ScenarioMetrics {
        total_delay_minutes: edits.total_delay_minutes(),
        alt_change_ft: edits.total_altitude_change_ft(),
        ..ScenarioMetrics::default()
    };
    let Some((start, end)) = config.time_range(flights) else {
        return Ok(metrics);
    };

    let rules = SeparationRules::default();
    for t in time_buckets(start, end, config.time_bucket_secs) {
        let snap = snapshot_with_stats(flights, t, edits, airports, config.interpolation);
        metrics.conflicts += count_conflicts(&snap.entries, &rules);
        if snap.entries.len() > config.busy_bucket_threshold {
            metrics.hotspots += 1;
        }
    }
    Ok(metrics)
}

struct Trial {
    score: f64,
    acid: String,
    change: Edit,
    edits: EditSet,
}

/// Run the greedy search. The returned edits are a proposal; nothing is
/// applied to `flights`.
pub fn optimize_schedule(
    flights: &[Flight],
    airports: &AirportTable,
    config: &OptimizerConfig,
) -> Result<OptimizationResult> {
    optimize_from(flights, airports, &EditSet::new(), config)
}

/// Greedy search starting from `initial` edits instead of the bare
/// schedule. Base metrics and the returned edit set include `initial`.
pub fn optimize_from(
    flights: &[Flight],
    airports: &AirportTable,
    initial: &EditSet,
    config: &OptimizerConfig,
) -> Result<OptimizationResult> {
    let hotspot_options = config.hotspot_options();
    hotspot_options.validate()?;

    if flights.is_empty() {
        return Ok(OptimizationResult::empty(initial, StopReason::NoFlights));
    }
    let Some((start, end)) = config.time_range(flights) else {
        return Ok(OptimizationResult::empty(initial, StopReason::NoFlights));
    };

    let started = Instant::now();
    let candidates = config.candidate_edits();

    let base_metrics = compute_metrics(flights, airports, initial, config)?;
    let mut best_score = score_scenario(&base_metrics, &config.weights);
    let mut edits = initial.clone();
    let mut history = Vec::new();
    let mut stop_reason = StopReason::IterationLimit;

    for round in 0..config.max_iterations {
        if config.deadline.is_some_and(|limit| started.elapsed() >= limit) {
            stop_reason = StopReason::Deadline;
            break;
        }

        let hotspots = compute_hotspots(flights, start, end, &hotspot_options, airports, &edits)?;
        let Some(worst) = hotspots.first() else {
            stop_reason = StopReason::Converged;
            break;
        };

        let mut best: Option<Trial> = None;
        for acid in worst.flights.iter().take(config.max_candidate_flights) {
            for change in &candidates {
                let mut trial = edits.clone();
                trial.overlay(acid, change);
                let metrics = compute_metrics(flights, airports, &trial, config)?;
                let score = score_scenario(&metrics, &config.weights);
                if score < best_score && best.as_ref().map_or(true, |b| score < b.score) {
                    best = Some(Trial {
                        score,
                        acid: acid.clone(),
                        change: change.clone(),
                        edits: trial,
                    });
                }
            }
        }

        let Some(accepted) = best else {
            stop_reason = StopReason::NoImprovement;
            break;
        };
        tracing::debug!(
            round,
            acid = %accepted.acid,
            score = accepted.score,
            previous = best_score,
            "accepted candidate edit"
        );
        best_score = accepted.score;
        edits = accepted.edits;
        history.push(AcceptedChange {
            acid: accepted.acid,
            change: accepted.change,
            score: accepted.score,
        });
    }

    let final_metrics = compute_metrics(flights, airports, &edits, config)?;
    tracing::info!(
        iterations = history.len(),
        ?stop_reason,
        base_conflicts = base_metrics.conflicts,
        final_conflicts = final_metrics.conflicts,
        score = best_score,
        "optimization finished"
    );

    Ok(OptimizationResult {
        edits,
        base_metrics,
        final_metrics,
        iterations: history.len(),
        stop_reason,
        history,
    })
}
