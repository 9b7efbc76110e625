//! Tool configuration from environment.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_LOG_FILTER: &str = "flightsim=info";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub flights_path: Option<PathBuf>,
    /// Falls back to the built-in Canadian airport table
    pub airports_path: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flights_path: None,
            airports_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str| lookup(key).filter(|s| !s.trim().is_empty()).map(PathBuf::from);
        Self {
            flights_path: path("FLIGHTSIM_FLIGHTS"),
            airports_path: path("FLIGHTSIM_AIRPORTS"),
            log_filter: lookup("FLIGHTSIM_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}
