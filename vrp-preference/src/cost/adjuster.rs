#[cfg(test)]
#[path = "../../tests/unit/cost/adjuster_test.rs"]
mod adjuster_test;

use super::{InsertionCandidate, InsertionCost};
use crate::models::TimeBreakdown;
use crate::models::common::Cost;
use crate::store::DynamicPreferenceStore;
use crate::utils::{PreferenceError, PreferenceResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Specifies how strongly rider weights may change a baseline cost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostAdjustmentConfig {
    /// Whether adjustment is applied at all.
    pub enabled: bool,
    /// Maximum relative change of the baseline cost.
    pub max_adjustment: f64,
    /// Utility magnitude which maps to the maximum adjustment.
    pub utility_scale: f64,
}

impl Default for CostAdjustmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_adjustment: 0.2, // ±20% of the baseline cost
            utility_scale: 500., // typical utility magnitude of a trip
        }
    }
}

impl CostAdjustmentConfig {
    /// Checks that adjustment envelope and utility scale are usable.
    pub fn validate(&self) -> PreferenceResult<()> {
        if !(0. ..1.).contains(&self.max_adjustment) {
            return Err(PreferenceError::InvalidConfig(format!(
                "max adjustment must be in [0, 1), got {}",
                self.max_adjustment
            )));
        }

        if self.utility_scale.is_nan() || self.utility_scale <= 0. {
            return Err(PreferenceError::InvalidConfig(format!(
                "utility scale must be positive, got {}",
                self.utility_scale
            )));
        }

        Ok(())
    }
}

/// Counters of cost evaluations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CostAdjustmentStats {
    /// Total amount of evaluations.
    pub evaluations: usize,
    /// Evaluations which changed the baseline cost.
    pub adjusted: usize,
    /// Evaluations without data to adjust: disabled, no breakdown or unknown rider.
    pub passthrough: usize,
    /// Evaluations which failed and returned the baseline cost.
    pub fallbacks: usize,
}

#[derive(Default)]
struct Counters {
    evaluations: AtomicUsize,
    adjusted: AtomicUsize,
    passthrough: AtomicUsize,
    fallbacks: AtomicUsize,
}

/// Wraps a baseline insertion cost and scales it by rider preferences.
///
/// Rider utility of the candidate trip is normalized to `[-1, 1]` and mapped to a multiplicative
/// factor within `[1 - max_adjustment, 1 + max_adjustment]`: trips with high utility get cheaper,
/// trips with low utility get more expensive. Adjustment never fails, any problem results in the
/// unmodified baseline cost.
pub struct CostAdjuster<C> {
    baseline: Arc<dyn InsertionCost<C> + Send + Sync>,
    store: Arc<DynamicPreferenceStore>,
    config: CostAdjustmentConfig,
    counters: Counters,
}

impl<C> CostAdjuster<C> {
    /// Creates a new instance of `CostAdjuster`.
    pub fn new(
        baseline: Arc<dyn InsertionCost<C> + Send + Sync>,
        store: Arc<DynamicPreferenceStore>,
        config: CostAdjustmentConfig,
    ) -> Self {
        Self { baseline, store, config, counters: Counters::default() }
    }

    /// Returns true if adjustment is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Adjusts baseline cost for a rider. Returns the baseline cost unchanged when adjustment is
    /// disabled, breakdown is missing, rider is unknown or the adjustment cannot be computed.
    pub fn adjust(&self, baseline_cost: Cost, rider_id: &str, breakdown: Option<&TimeBreakdown>) -> Cost {
        self.counters.evaluations.fetch_add(1, Ordering::Relaxed);

        match self.adjustment_factor(baseline_cost, rider_id, breakdown) {
            Ok(Some(factor)) => {
                self.counters.adjusted.fetch_add(1, Ordering::Relaxed);
                baseline_cost * factor
            }
            Ok(None) => {
                self.counters.passthrough.fetch_add(1, Ordering::Relaxed);
                baseline_cost
            }
            Err(err) => {
                log::warn!("cannot adjust cost {baseline_cost} of rider '{rider_id}', using baseline: {err}");
                self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
                baseline_cost
            }
        }
    }

    /// Like [`CostAdjuster::adjust`], but reports computation failures instead of falling back.
    pub fn try_adjust(
        &self,
        baseline_cost: Cost,
        rider_id: &str,
        breakdown: Option<&TimeBreakdown>,
    ) -> PreferenceResult<Cost> {
        Ok(self.adjustment_factor(baseline_cost, rider_id, breakdown)?.map_or(baseline_cost, |f| baseline_cost * f))
    }

    /// Returns current evaluation counters.
    pub fn statistics(&self) -> CostAdjustmentStats {
        CostAdjustmentStats {
            evaluations: self.counters.evaluations.load(Ordering::Relaxed),
            adjusted: self.counters.adjusted.load(Ordering::Relaxed),
            passthrough: self.counters.passthrough.load(Ordering::Relaxed),
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
        }
    }

    /// Returns `None` when there is nothing to adjust.
    fn adjustment_factor(
        &self,
        baseline_cost: Cost,
        rider_id: &str,
        breakdown: Option<&TimeBreakdown>,
    ) -> PreferenceResult<Option<f64>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let Some(breakdown) = breakdown else {
            return Ok(None);
        };

        let Some(weights) = self.store.get(rider_id) else {
            return Ok(None);
        };

        if !baseline_cost.is_finite() {
            return Err(PreferenceError::Computation(format!("baseline cost is not finite: {baseline_cost}")));
        }

        breakdown.validate()?;
        self.config.validate()?;

        let utility = weights.utility(breakdown);
        if !utility.is_finite() {
            return Err(PreferenceError::Computation(format!("utility is not finite: {utility}")));
        }

        let max_adjustment = self.config.max_adjustment;
        let normalized = (utility / self.config.utility_scale).max(-1.).min(1.);
        let factor = (1. - normalized * max_adjustment).max(1. - max_adjustment).min(1. + max_adjustment);

        if !factor.is_finite() {
            return Err(PreferenceError::Computation(format!("adjustment factor is not finite: {factor}")));
        }

        Ok(Some(factor))
    }
}

impl<C: InsertionCandidate> CostAdjuster<C> {
    /// Calculates baseline cost of the candidate and adjusts it by rider preferences.
    pub fn calculate(&self, candidate: &C) -> Cost {
        let baseline_cost = self.baseline.cost(candidate);
        let breakdown = candidate.time_breakdown();

        self.adjust(baseline_cost, candidate.rider_id(), breakdown.as_ref())
    }
}

impl<C: InsertionCandidate> InsertionCost<C> for CostAdjuster<C> {
    fn cost(&self, candidate: &C) -> Cost {
        self.calculate(candidate)
    }
}
