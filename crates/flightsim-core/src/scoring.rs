//! Weighted scenario scoring. Lower is better.

use serde::{Deserialize, Serialize};

/// Aggregate measures of one scenario (flights plus an edit set).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    pub conflicts: usize,
    /// Time buckets with more active flights than the busy threshold
    pub hotspots: usize,
    pub total_delay_minutes: f64,
    /// Sum of absolute altitude changes
    pub alt_change_ft: f64,
}

/// Weights for [`score_scenario`].
///
/// Keys missing from a serialized form keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    #[serde(rename = "A")]
    pub conflicts: f64,
    #[serde(rename = "B")]
    pub hotspots: f64,
    #[serde(rename = "C")]
    pub delay_minutes: f64,
    #[serde(rename = "D")]
    pub altitude_change: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            conflicts: 1000.0,
            hotspots: 50.0,
            delay_minutes: 1.0,
            altitude_change: 0.1,
        }
    }
}

pub fn score_scenario(metrics: &ScenarioMetrics, weights: &ScoreWeights) -> f64 {
    weights.conflicts * metrics.conflicts as f64
        + weights.hotspots * metrics.hotspots as f64
        + weights.delay_minutes * metrics.total_delay_minutes
        + weights.altitude_change * metrics.alt_change_ft.abs()
}
