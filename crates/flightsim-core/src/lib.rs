pub mod airport_load;
pub mod conflict;
pub mod error;
pub mod hotspot;
pub mod models;
pub mod optimizer;
pub mod rules;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod spatial;
pub mod suggestions;
pub mod trajectory;

pub use airport_load::{
    busiest_windows, compute_airport_load, AirportLoad, AirportWindow, LoadWindow,
};
pub use conflict::{count_conflicts, detect_conflicts, Conflict, ConflictDetector};
pub use error::{CoreError, Result, TrajectoryError};
pub use hotspot::{compute_hotspots, CellKey, HotspotCell, HotspotOptions};
pub use models::{AirportTable, Edit, EditSet, Flight, LatLon};
pub use optimizer::{
    compute_metrics, optimize_from, optimize_schedule, AcceptedChange, OptimizationResult,
    OptimizerConfig, StopReason,
};
pub use rules::SeparationRules;
pub use scoring::{score_scenario, ScenarioMetrics, ScoreWeights};
pub use session::Session;
pub use snapshot::{snapshot, snapshot_with_stats, Snapshot, SnapshotEntry, SnapshotStats};
pub use spatial::{distance_nm, interpolate, interpolate_great_circle, Interpolation};
pub use suggestions::{
    offset_route, Impact, ProviderChain, RuleBasedProvider, Suggestion, SuggestionKind,
    SuggestionProvider,
};
pub use trajectory::{build_waypoints, parse_coord, parse_route, position_at, Trajectory};
