//! Schedule analytics from the command line.
//!
//! Usage:
//!   flightsim --flights flights.json conflicts --time 1700003600
//!   flightsim --flights flights.json optimize --iterations 10 --save edits.json
//!   flightsim --flights flights.json --edits edits.json hotspots --top 5

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use flightsim_cli::{dataset, format_time, init_tracing, Config};
use flightsim_core::{
    busiest_windows, EditSet, HotspotOptions, OptimizerConfig, ProviderChain, RuleBasedProvider,
    ScoreWeights, SeparationRules, Session,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Conflict, hotspot and airport load analytics")]
struct Args {
    /// Flight dataset (JSON array of flight records)
    #[arg(long, global = true)]
    flights: Option<PathBuf>,

    /// Airport table (JSON object of CODE: [lat, lon]); built-in table if omitted
    #[arg(long, global = true)]
    airports: Option<PathBuf>,

    /// Previously saved edits to apply before analysis
    #[arg(long, global = true)]
    edits: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Positions of all airborne flights at one instant
    Snapshot {
        #[arg(long)]
        time: i64,
    },
    /// Loss-of-separation pairs at one instant
    Conflicts {
        #[arg(long)]
        time: i64,
        /// Ignore pairs within this radius of any airport
        #[arg(long)]
        airport_radius_nm: Option<f64>,
    },
    /// Busiest space-time-altitude cells
    Hotspots {
        #[arg(long)]
        start: Option<i64>,
        #[arg(long)]
        end: Option<i64>,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long, default_value_t = 25.0)]
        cell_nm: f64,
        #[arg(long, default_value_t = 2000.0)]
        cell_ft: f64,
        #[arg(long, default_value_t = 300)]
        bucket_secs: i64,
    },
    /// Departures and arrivals per airport window
    Load {
        #[arg(long)]
        start: Option<i64>,
        #[arg(long)]
        end: Option<i64>,
        #[arg(long, default_value_t = 900)]
        window: i64,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Greedy search for delays and level changes that reduce conflicts
    Optimize {
        #[arg(long, default_value_t = 30)]
        iterations: usize,
        /// Score weights as JSON, e.g. '{"A": 500, "C": 2}'
        #[arg(long)]
        weights: Option<String>,
        /// Stop after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
        /// Write the proposed edits here, loaded edits included
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Rule-based remedies for every conflict at one instant
    Suggest {
        #[arg(long)]
        time: i64,
    },
}

fn main() -> Result<()> {
    let config = Config::from_env();
    init_tracing(&config.log_filter)?;

    let args = Args::parse();
    let flights_path = args
        .flights
        .clone()
        .or(config.flights_path.clone())
        .context("no flight dataset: pass --flights or set FLIGHTSIM_FLIGHTS")?;
    let airports_path = args.airports.clone().or(config.airports_path.clone());

    let flights = dataset::load_flights(&flights_path)?;
    let airports = dataset::load_airports(airports_path.as_deref())?;
    let missing = dataset::missing_airports(&flights, &airports);
    if !missing.is_empty() {
        tracing::warn!(?missing, "flights with unknown airports are skipped");
    }
    let mut session = Session::new(flights, airports);
    if let Some(path) = &args.edits {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read edits {}", path.display()))?;
        let edits: EditSet = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse edits {}", path.display()))?;
        session.adopt(edits);
    }

    let bounds = dataset::time_bounds(session.flights());
    let range = |start: Option<i64>, end: Option<i64>| -> Result<(i64, i64)> {
        match (start.or(bounds.map(|b| b.0)), end.or(bounds.map(|b| b.1))) {
            (Some(s), Some(e)) => Ok((s, e)),
            _ => bail!("empty dataset: pass --start and --end"),
        }
    };

    match args.command {
        Command::Snapshot { time } => {
            let snap = session.snapshot(time);
            if args.json {
                return print_json(&snap);
            }
            println!(
                "{} - {} airborne, {} on ground, {} unresolved",
                format_time(time),
                snap.stats.active,
                snap.stats.inactive,
                snap.stats.unresolved
            );
            for entry in &snap.entries {
                println!(
                    "  {:<8} {:>8.4} {:>9.4} {:>6.0} ft  {}",
                    entry.acid(),
                    entry.position.lat,
                    entry.position.lon,
                    entry.altitude_ft,
                    entry.flight.flow()
                );
            }
        }
        Command::Conflicts {
            time,
            airport_radius_nm,
        } => {
            let rules = SeparationRules {
                airport_exclusion_radius_nm: airport_radius_nm,
                ..SeparationRules::default()
            };
            let session = session.with_rules(rules);
            let conflicts = session.conflicts(time);
            if args.json {
                return print_json(&conflicts);
            }
            println!("{} - {} conflicts", format_time(time), conflicts.len());
            for c in &conflicts {
                let (a, b) = c.pair();
                println!("  {a:<8} {b:<8} {:>5.2} nm {:>5.0} ft", c.h_nm, c.v_ft);
            }
        }
        Command::Hotspots {
            start,
            end,
            top,
            cell_nm,
            cell_ft,
            bucket_secs,
        } => {
            let (start, end) = range(start, end)?;
            let options = HotspotOptions {
                cell_nm,
                cell_ft,
                time_bucket_secs: bucket_secs,
                ..HotspotOptions::default()
            };
            let mut cells = session.hotspots(start, end, &options)?;
            cells.truncate(top);
            if args.json {
                return print_json(&cells);
            }
            for cell in &cells {
                println!(
                    "{}  score {:>3}  traffic {:>2}  conflicts {:>2}  flows {:>2}  conf {:.2} [{}]",
                    format_time(cell.key.time),
                    cell.score,
                    cell.traffic_count,
                    cell.conflict_count,
                    cell.flow_count,
                    cell.confidence,
                    cell.flights.join(" ")
                );
            }
        }
        Command::Load {
            start,
            end,
            window,
            top,
        } => {
            let (start, end) = range(start, end)?;
            let load = session.airport_load(start, end, window)?;
            let rows = busiest_windows(&load, top);
            if args.json {
                return print_json(&rows);
            }
            for row in &rows {
                println!(
                    "{:<6} {}  deps {:>3}  arrs {:>3}  ops {:>3}{}",
                    row.airport,
                    format_time(row.window.window_start),
                    row.window.deps,
                    row.window.arrs,
                    row.window.ops,
                    if row.window.busy { "  BUSY" } else { "" }
                );
            }
        }
        Command::Optimize {
            iterations,
            weights,
            deadline_secs,
            save,
        } => {
            let weights: ScoreWeights = match weights {
                Some(raw) => serde_json::from_str(&raw).context("invalid --weights")?,
                None => ScoreWeights::default(),
            };
            let config = OptimizerConfig {
                max_iterations: iterations,
                weights,
                deadline: deadline_secs.map(Duration::from_secs),
                ..OptimizerConfig::default()
            };
            let result = session.optimize(&config)?;
            if let Some(path) = &save {
                let body = serde_json::to_string_pretty(&result.edits)?;
                std::fs::write(path, body)
                    .with_context(|| format!("failed to write edits {}", path.display()))?;
            }
            if args.json {
                return print_json(&result);
            }
            println!(
                "stopped: {:?} after {} accepted edits",
                result.stop_reason, result.iterations
            );
            println!(
                "conflicts {} -> {}, busy buckets {} -> {}, delay {:.0} min, levels {:.0} ft",
                result.base_metrics.conflicts,
                result.final_metrics.conflicts,
                result.base_metrics.hotspots,
                result.final_metrics.hotspots,
                result.final_metrics.total_delay_minutes,
                result.final_metrics.alt_change_ft
            );
            for step in &result.history {
                println!("  {:<8} {:?}  score {:.1}", step.acid, step.change, step.score);
            }
        }
        Command::Suggest { time } => {
            let chain = ProviderChain::new().with(RuleBasedProvider::default());
            let conflicts = session.conflicts(time);
            let report: Vec<_> = conflicts
                .iter()
                .map(|c| {
                    let (a, b) = c.pair();
                    (format!("{a}/{b}"), chain.suggest(c))
                })
                .collect();
            if args.json {
                return print_json(&report);
            }
            for (pair, suggestions) in &report {
                println!("{pair}");
                for s in suggestions {
                    println!(
                        "  [{:?} {:.0}%] {} - {}",
                        s.impact,
                        s.confidence * 100.0,
                        s.action,
                        s.description
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
