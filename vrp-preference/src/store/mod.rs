//! Provides per-rider storage of preference weights.
//!
//! [`PreferenceStore`] is a plain map used to seed a run, while [`DynamicPreferenceStore`] is the
//! thread-safe store owned by a running simulation: it applies bounded deltas, keeps update history
//! and persists snapshots at iteration boundaries.

mod dynamic_store;
pub use self::dynamic_store::DynamicPreferenceStore;

mod history;
pub use self::history::UpdateHistory;

mod persistence;

mod preference_store;
pub use self::preference_store::PreferenceStore;

use crate::models::{PreferenceWeights, WeightDelta};
use crate::utils::{PreferenceError, PreferenceResult};
use serde::{Deserialize, Serialize};

/// Specifies hard bounds which every weight write has to respect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Minimum allowed weight value.
    pub min_weight: f64,
    /// Maximum allowed weight value.
    pub max_weight: f64,
    /// Maximum absolute change of a single weight per update.
    pub max_weight_change: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { min_weight: -2., max_weight: 2., max_weight_change: 0.1 }
    }
}

impl StoreConfig {
    /// Limits a single delta component by step size and so that the resulting weight stays within bounds.
    pub fn constrain_delta(&self, delta: f64, current: f64) -> f64 {
        let delta = if delta.is_finite() { delta.max(-self.max_weight_change).min(self.max_weight_change) } else { 0. };

        let value = current + delta;
        if value < self.min_weight {
            self.min_weight - current
        } else if value > self.max_weight {
            self.max_weight - current
        } else {
            delta
        }
    }

    /// Limits weight value to allowed bounds.
    pub fn constrain_weight(&self, weight: f64) -> f64 {
        weight.max(self.min_weight).min(self.max_weight)
    }

    /// Returns new weights with a bounded delta applied.
    pub fn apply(&self, weights: &PreferenceWeights, delta: &WeightDelta) -> PreferenceWeights {
        let current = weights.as_array();
        let delta = delta.as_array();

        let values = std::array::from_fn(|idx| {
            self.constrain_weight(current[idx] + self.constrain_delta(delta[idx], current[idx]))
        });

        PreferenceWeights::from_array(weights.rider_id.clone(), values)
    }

    /// Returns weights with every component clamped to allowed bounds.
    pub fn clamp(&self, weights: PreferenceWeights) -> PreferenceWeights {
        let values = weights.as_array().map(|weight| self.constrain_weight(weight));
        PreferenceWeights::from_array(weights.rider_id, values)
    }

    /// Checks that bounds form a valid range and the step size is positive.
    pub fn validate(&self) -> PreferenceResult<()> {
        if self.min_weight.is_nan() || self.max_weight.is_nan() || self.min_weight >= self.max_weight {
            return Err(PreferenceError::InvalidConfig(format!(
                "min weight {} must be less than max weight {}",
                self.min_weight, self.max_weight
            )));
        }

        if self.max_weight_change.is_nan() || self.max_weight_change <= 0. {
            return Err(PreferenceError::InvalidConfig(format!(
                "max weight change must be positive, got {}",
                self.max_weight_change
            )));
        }

        Ok(())
    }
}
