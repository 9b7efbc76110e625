//! flightsim CLI - dataset loading and scenario tooling.
//!
//! Binaries:
//! - flightsim: snapshot, conflict, hotspot, load and optimizer reports
//! - demo_scenario: narrated walkthrough over synthetic corridor traffic

pub mod config;
pub mod dataset;
pub mod scenarios;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use config::Config;

/// Install the fmt subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()?;
    Ok(())
}

/// Unix seconds as `YYYY-MM-DD HH:MM:SSZ`, or the raw number if out of range.
pub fn format_time(t: i64) -> String {
    DateTime::<Utc>::from_timestamp(t, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%SZ").to_string())
        .unwrap_or_else(|| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_unix_seconds_in_utc() {
        assert_eq!(format_time(1_700_000_000), "2023-11-14 22:13:20Z");
    }
}
