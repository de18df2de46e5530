// src/model/state_space.rs

use crate::error::{PolicyError, PolicyResult};
use crate::model::demand::truncation_bound;
use serde::Serialize;

/// The integer inventory levels `[min_level, max_level]` the recursion
/// works over. Always symmetric around zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InventoryStateSpace {
    min_level: i64,
    max_level: i64,
}

impl InventoryStateSpace {
    /// Grid with `max_level = max(0, bound)` and `min_level = -max_level`.
    pub fn symmetric(bound: i64) -> Self {
        let max_level = bound.max(0);
        Self {
            min_level: -max_level,
            max_level,
        }
    }

    /// Sizes the grid so aggregate horizon demand is captured at `quantile`.
    ///
    /// Fails with `StateSpaceTooLarge` before allocating anything when the
    /// grid would hold more than `limit` levels.
    pub fn for_total_demand(total_mean: f64, quantile: f64, limit: u64) -> PolicyResult<Self> {
        // For q >= 1/2 the quantile is at least floor(mean) - 1, which lets us
        // refuse absurd horizons without walking the CDF.
        if quantile >= 0.5 && total_mean.is_finite() {
            let floor = (total_mean.floor() - 1.0).max(0.0);
            let estimate = 2.0 * floor + 1.0;
            if estimate > limit as f64 {
                return Err(PolicyError::StateSpaceTooLarge {
                    levels: estimate as u64,
                    limit,
                });
            }
        }

        let bound = truncation_bound(total_mean, quantile)?;
        let levels = bound.saturating_mul(2).saturating_add(1);
        if levels > limit || bound > i64::MAX as u64 / 2 {
            return Err(PolicyError::StateSpaceTooLarge { levels, limit });
        }
        Ok(Self::symmetric(bound as i64))
    }

    pub fn min_level(&self) -> i64 {
        self.min_level
    }

    pub fn max_level(&self) -> i64 {
        self.max_level
    }

    /// Number of levels in the grid.
    pub fn len(&self) -> usize {
        (self.max_level - self.min_level + 1) as usize
    }

    pub fn contains(&self, level: i64) -> bool {
        (self.min_level..=self.max_level).contains(&level)
    }

    /// Zero-based array slot of `level`.
    pub fn index(&self, level: i64) -> usize {
        debug_assert!(self.contains(level), "level {} outside grid", level);
        (level - self.min_level) as usize
    }

    pub fn levels(&self) -> impl DoubleEndedIterator<Item = i64> {
        self.min_level..=self.max_level
    }
}

/// A cost per inventory level over a state space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueFunction {
    space: InventoryStateSpace,
    values: Vec<f64>,
}

impl ValueFunction {
    pub fn zeros(space: InventoryStateSpace) -> Self {
        Self {
            space,
            values: vec![0.0; space.len()],
        }
    }

    pub fn space(&self) -> InventoryStateSpace {
        self.space
    }

    /// Value at `level`; levels outside the grid have no value.
    pub fn get(&self, level: i64) -> Option<f64> {
        if self.space.contains(level) {
            Some(self.values[self.space.index(level)])
        } else {
            None
        }
    }

    /// Value at `level`, which must lie on the grid.
    pub fn at(&self, level: i64) -> f64 {
        self.values[self.space.index(level)]
    }

    pub fn set(&mut self, level: i64, value: f64) {
        let idx = self.space.index(level);
        self.values[idx] = value;
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `(level, value)` pairs from `min_level` up.
    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.space.levels().zip(self.values.iter().copied())
    }

    pub fn copy_from(&mut self, other: &ValueFunction) {
        self.values.copy_from_slice(&other.values);
    }
}
