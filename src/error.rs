// src/error.rs

use std::fmt;
use thiserror::Error;

pub type PolicyResult<T> = Result<T, PolicyError>;

/// Where a computation was when its deadline ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPoint {
    /// Backward induction, while working on this period.
    Period(usize),
    /// Monte-Carlo evaluation, before starting this run.
    SimulationRun(usize),
}

impl fmt::Display for TimeoutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutPoint::Period(t) => write!(f, "period {}", t),
            TimeoutPoint::SimulationRun(run) => write!(f, "simulation run {}", run),
        }
    }
}

/// Every failure the solver, simulator and request layer can report.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The downward scan reached the bottom of the grid without the
    /// no-order cost ever rising more than `K` above its running minimum.
    #[error("Policy infeasible: scan for period {period} reached level {level} without stopping")]
    PolicyInfeasible { period: usize, level: i64 },

    #[error("Computation timed out at {at} ({elapsed_ms} ms elapsed)")]
    ComputationTimeout { at: TimeoutPoint, elapsed_ms: u128 },

    #[error("State space too large: {levels} levels exceeds the limit of {limit}")]
    StateSpaceTooLarge { levels: u64, limit: u64 },

    #[error("Distribution error: {0}")]
    Distribution(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
