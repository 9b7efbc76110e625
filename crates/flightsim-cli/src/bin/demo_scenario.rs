//! Corridor Demo Scenario - a busy morning push and how to untangle it.
//!
//! 1. SCENARIO: seeded departures on the Toronto-Montreal-Ottawa corridor
//! 2. SCAN: sweep the morning minute by minute for losses of separation
//! 3. HOTSPOTS: worst space-time-altitude cells and busiest airport windows
//! 4. FIX: delay the first conflicted flight by 5 minutes and rescan
//! 5. OPTIMIZE: let the greedy optimizer propose a schedule
//!
//! Usage:
//!   cargo run -p flightsim-cli --bin demo_scenario -- --seed 42

use anyhow::Result;
use clap::Parser;
use flightsim_cli::scenarios::create_corridor_push;
use flightsim_cli::{dataset, format_time, init_tracing, Config};
use flightsim_core::{
    Edit, HotspotOptions, OptimizerConfig, ProviderChain, RuleBasedProvider, Session,
};
use flightsim_core::airport_load::DEFAULT_WINDOW_SECS;
use std::collections::BTreeSet;

/// 2025-06-02 11:00:00Z, 07:00 local in Toronto
const PUSH_START: i64 = 1_748_862_000;
const SCAN_STEP_SECS: usize = 60;
const FIX_DELAY_SECS: i64 = 300;

#[derive(Parser, Debug)]
#[command(author, version, about = "Corridor demo: detect, explain and resolve conflicts")]
struct Args {
    /// Seed for the synthetic schedule
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Optimizer round limit
    #[arg(long, default_value_t = 10)]
    iterations: usize,
}

/// Conflict count per scan step and distinct pairs over the whole sweep.
fn sweep(session: &Session, start: i64, end: i64) -> (usize, BTreeSet<(String, String)>) {
    let mut events = 0;
    let mut pairs = BTreeSet::new();
    for t in (start..=end).step_by(SCAN_STEP_SECS) {
        for conflict in session.conflicts(t) {
            let (a, b) = conflict.pair();
            pairs.insert((a.to_string(), b.to_string()));
            events += 1;
        }
    }
    (events, pairs)
}

fn main() -> Result<()> {
    let config = Config::from_env();
    init_tracing(&config.log_filter)?;
    let args = Args::parse();

    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║    FLIGHTSIM: CORRIDOR MORNING PUSH                           ║");
    println!("║    Schedule → Conflicts → Hotspots → Fix → Optimize           ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");
    println!();

    let scenario = create_corridor_push(args.seed, PUSH_START);
    let session = Session::new(scenario.flights, dataset::builtin_airports());
    let Some((start, end)) = dataset::time_bounds(session.flights()) else {
        println!("[SCENARIO] no flights generated");
        return Ok(());
    };

    println!("[SCENARIO] {} (seed {})", scenario.name, args.seed);
    println!("  • {} flights between CYYZ, CYUL and CYOW", session.flights().len());
    println!("  • first departure {}", format_time(start));
    println!("  • last arrival    {}", format_time(end));
    println!();

    println!("[SCAN] sweeping every {SCAN_STEP_SECS} s...");
    let (events, pairs) = sweep(&session, start, end);
    println!("[SCAN] {events} conflict samples across {} pairs", pairs.len());
    for (a, b) in pairs.iter().take(5) {
        println!("  ✗ {a} / {b}");
    }
    println!();

    let hotspots = session.hotspots(start, end, &HotspotOptions::default())?;
    println!("[HOTSPOTS] {} occupied cells, worst three:", hotspots.len());
    for cell in hotspots.iter().take(3) {
        println!(
            "  {}  score {:>2}  {} aircraft, {} conflicts  [{}]",
            format_time(cell.key.time),
            cell.score,
            cell.traffic_count,
            cell.conflict_count,
            cell.flights.join(" ")
        );
    }
    let load = session.airport_load(start, end, DEFAULT_WINDOW_SECS)?;
    for row in flightsim_core::busiest_windows(&load, 3) {
        println!(
            "  {} {}  {} movements{}",
            row.airport,
            format_time(row.window.window_start),
            row.window.ops,
            if row.window.busy { " (busy)" } else { "" }
        );
    }
    println!();

    let first_conflict = (start..=end)
        .step_by(SCAN_STEP_SECS)
        .find_map(|t| session.conflicts(t).into_iter().next().map(|c| (t, c)));
    let Some((when, conflict)) = first_conflict else {
        println!("[FIX] nothing to fix, the corridor is clean");
        return Ok(());
    };

    let chain = ProviderChain::new().with(RuleBasedProvider::default());
    let target = conflict.a.acid().to_string();
    println!(
        "[FIX] first conflict at {}: {} / {} ({:.2} nm, {:.0} ft)",
        format_time(when),
        conflict.a.acid(),
        conflict.b.acid(),
        conflict.h_nm,
        conflict.v_ft
    );
    for s in chain.suggest(&conflict).iter().take(3) {
        println!("  ? {} ({:.0}%)", s.action, s.confidence * 100.0);
    }

    let mut fixed = session.clone();
    fixed.apply_edit(&target, &Edit::delay(FIX_DELAY_SECS))?;
    let (fixed_events, fixed_pairs) = sweep(&fixed, start, end);
    println!(
        "[FIX] delayed {target} by {} min: {} → {} samples, {} → {} pairs",
        FIX_DELAY_SECS / 60,
        events,
        fixed_events,
        pairs.len(),
        fixed_pairs.len()
    );
    println!();

    println!("[OPTIMIZE] up to {} rounds...", args.iterations);
    let result = session.optimize(&OptimizerConfig {
        max_iterations: args.iterations,
        ..OptimizerConfig::default()
    })?;
    for step in &result.history {
        println!("  ✓ {:<8} {:?} → score {:.1}", step.acid, step.change, step.score);
    }
    let mut optimized = session.clone();
    optimized.adopt(result.edits.clone());
    let (opt_events, opt_pairs) = sweep(&optimized, start, end);

    println!();
    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║  DEMO COMPLETE                                                ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");
    println!("  stop reason      {:?}", result.stop_reason);
    println!(
        "  bucket conflicts {} → {}",
        result.base_metrics.conflicts, result.final_metrics.conflicts
    );
    println!(
        "  minute sweep     {events} → {opt_events} samples, {} → {} pairs",
        pairs.len(),
        opt_pairs.len()
    );
    println!("  delay added      {:.0} min", result.final_metrics.total_delay_minutes);
    println!("  level changes    {:.0} ft", result.final_metrics.alt_change_ft);
    Ok(())
}
