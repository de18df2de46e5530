// src/simulation/config.rs

use crate::error::{PolicyError, PolicyResult, TimeoutPoint};
use std::time::{Duration, Instant};
use tracing::warn;

/// Truncation quantile used for both the state space and per-period demand.
pub const DEFAULT_QUANTILE: f64 = 0.999;

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub quantile: f64,
    /// Largest number of inventory levels the solver will allocate.
    pub max_levels: u64,
    /// Wall-clock budget, checked inside the per-period level loops.
    pub timeout: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            quantile: DEFAULT_QUANTILE,
            max_levels: 2_000_001,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub runs: usize,
    /// Fixed seed for reproducible runs; `None` draws from entropy.
    pub seed: Option<u64>,
    pub initial_inventory: i64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            runs: 10_000,
            seed: None,
            initial_inventory: 0,
        }
    }
}

/// A wall-clock budget that starts running when it is created.
///
/// Long loops call [`Deadline::check`] at regular intervals; an unbounded
/// deadline never expires.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    pub fn start(budget: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn unbounded() -> Self {
        Self::start(None)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn check(&self, at: TimeoutPoint) -> PolicyResult<()> {
        let Some(budget) = self.budget else {
            return Ok(());
        };
        let elapsed = self.started.elapsed();
        if elapsed >= budget {
            warn!(%at, elapsed_ms = elapsed.as_millis() as u64, "deadline exceeded");
            return Err(PolicyError::ComputationTimeout {
                at,
                elapsed_ms: elapsed.as_millis(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_is_already_spent() {
        let err = Deadline::start(Some(Duration::ZERO))
            .check(TimeoutPoint::Period(4))
            .unwrap_err();
        assert!(matches!(
            err,
            PolicyError::ComputationTimeout {
                at: TimeoutPoint::Period(4),
                ..
            }
        ));
    }

    #[test]
    fn unbounded_never_expires() {
        assert!(Deadline::unbounded().check(TimeoutPoint::Period(0)).is_ok());
        assert!(Deadline::start(Some(Duration::from_secs(3600)))
            .check(TimeoutPoint::SimulationRun(0))
            .is_ok());
    }
}
