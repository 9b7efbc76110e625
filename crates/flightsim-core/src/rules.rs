//! Separation minima and thresholds.

use serde::{Deserialize, Serialize};

pub const DEFAULT_HORIZONTAL_SEPARATION_NM: f64 = 5.0;
pub const DEFAULT_VERTICAL_SEPARATION_FT: f64 = 2000.0;
/// Radius around airports inside which terminal clustering is ignored.
pub const TERMINAL_EXCLUSION_RADIUS_NM: f64 = 15.0;

/// Configuration for loss-of-separation checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparationRules {
    /// Minimum horizontal separation in nautical miles
    pub horizontal_nm: f64,
    /// Minimum vertical separation in feet
    pub vertical_ft: f64,
    /// Skip pairs where either aircraft is this close to any airport
    #[serde(default)]
    pub airport_exclusion_radius_nm: Option<f64>,
}

impl Default for SeparationRules {
    fn default() -> Self {
        Self {
            horizontal_nm: DEFAULT_HORIZONTAL_SEPARATION_NM,
            vertical_ft: DEFAULT_VERTICAL_SEPARATION_FT,
            airport_exclusion_radius_nm: None,
        }
    }
}

impl SeparationRules {
    /// Default minima, ignoring pairs near airports.
    pub fn terminal_filtered() -> Self {
        Self {
            airport_exclusion_radius_nm: Some(TERMINAL_EXCLUSION_RADIUS_NM),
            ..Self::default()
        }
    }

    /// Both minima violated at once (strict on each axis).
    pub fn is_loss(&self, h_nm: f64, v_ft: f64) -> bool {
        h_nm < self.horizontal_nm && v_ft < self.vertical_ft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_requires_both_minima_strictly() {
        let rules = SeparationRules::default();
        assert!(rules.is_loss(4.9, 1999.0));
        assert!(!rules.is_loss(5.0, 0.0));
        assert!(!rules.is_loss(0.0, 2000.0));
    }

    #[test]
    fn partial_config_keeps_exclusion_disabled() {
        let rules: SeparationRules =
            serde_json::from_str(r#"{"horizontal_nm": 3.0, "vertical_ft": 1000.0}"#).unwrap();
        assert_eq!(rules.airport_exclusion_radius_nm, None);
        assert_eq!(
            SeparationRules::terminal_filtered().airport_exclusion_radius_nm,
            Some(15.0)
        );
    }
}
