// src/strategy/traits.rs

use crate::error::{PolicyResult, TimeoutPoint};
use crate::model::instance::ProblemInstance;
use crate::simulation::config::Deadline;
use serde::Serialize;
use std::fmt::Debug;

/// Per-period `(s, S)` thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    /// Reorder point per period. The ordering region includes it: order
    /// when inventory is at or below `s`, so `s = S - 1` is base stock.
    #[serde(rename = "s")]
    pub reorder_points: Vec<i64>,
    /// Order-up-to level per period.
    #[serde(rename = "S")]
    pub order_up_to: Vec<i64>,
}

impl Thresholds {
    pub fn horizon(&self) -> usize {
        self.reorder_points.len()
    }
}

/// Anything that can produce reorder thresholds for a problem instance.
///
/// The simulated-cost request path is written against this trait so that
/// any solver satisfying it can be plugged in.
pub trait ReorderPointSolver: Debug + Send + Sync {
    fn reorder_points(&self, instance: &ProblemInstance) -> PolicyResult<Thresholds>;

    /// Like [`reorder_points`](Self::reorder_points) but bounded by `deadline`.
    ///
    /// The default only checks once the solver returns; solvers that can stop
    /// part way should override it.
    fn reorder_points_until(
        &self,
        instance: &ProblemInstance,
        deadline: &Deadline,
    ) -> PolicyResult<Thresholds> {
        let thresholds = self.reorder_points(instance)?;
        deadline.check(TimeoutPoint::Period(0))?;
        Ok(thresholds)
    }
}

/// Decides how much to order at the start of a period.
///
/// We require `Send` + `Sync` so policies can be shared across simulation runs.
pub trait ReplenishmentPolicy: Debug + Send + Sync {
    /// # Arguments
    /// * `period` - Zero-based period index.
    /// * `inventory` - Net inventory before ordering (negative when backordered).
    fn order_quantity(&self, period: usize, inventory: i64) -> u64;
}
