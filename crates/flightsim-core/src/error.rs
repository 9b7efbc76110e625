//! Error types for the analytics core.

use thiserror::Error;

/// Reasons a flight cannot be turned into a trajectory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrajectoryError {
    #[error("unknown airport code {0:?}")]
    UnknownAirport(String),
    #[error("malformed coordinate {0:?}")]
    MalformedCoordinate(String),
    #[error("malformed route token {0:?}")]
    MalformedRouteToken(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("flight {0} not found")]
    UnknownFlight(String),
    #[error("{kind} suggestion for {target} is missing its target value")]
    IncompleteSuggestion { kind: String, target: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
