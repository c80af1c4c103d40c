#[cfg(test)]
#[path = "../../tests/unit/learning/config_test.rs"]
mod config_test;

use crate::utils::{PreferenceError, PreferenceResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Hyper parameters of the policy gradient learner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearningConfig {
    /// Learning rate at iteration zero.
    pub initial_learning_rate: f64,
    /// Multiplicative decay of the learning rate per iteration.
    pub learning_rate_decay: f64,
    /// Lower bound of the learning rate.
    pub min_learning_rate: f64,
    /// Maximum L2 norm of the momentum used for a single step.
    pub gradient_clip_threshold: f64,
    /// Momentum coefficient, 0 disables momentum.
    pub momentum: f64,
    /// Amount of buffered experiences which triggers a batch update.
    pub batch_size: usize,
    /// Whether averaged batch gradients are z-score normalized.
    pub use_batch_normalization: bool,
    /// Exploration rate at iteration zero.
    pub exploration_rate: f64,
    /// Multiplicative decay of the exploration rate per iteration.
    pub exploration_decay: f64,
    /// Lower bound of the exploration rate.
    pub min_exploration_rate: f64,
    /// Whether gaussian exploration noise is added to deltas.
    pub use_exploration: bool,
    /// Scale of exploration noise relative to the exploration rate.
    pub exploration_noise_scale: f64,
    /// Multiplier of acceptance rewards.
    pub acceptance_reward_scale: f64,
    /// Multiplier of rejection penalties.
    pub rejection_penalty_scale: f64,
    /// Multiplier of completion rewards.
    pub completion_reward_scale: f64,
    /// L2 regularization strength pulling weights towards zero.
    pub l2_regularization: f64,
    /// Maximum sum of absolute delta components of a single step.
    pub max_total_change: f64,
    /// Temperature of the logistic acceptance probability.
    pub temperature: f64,
    /// Seed of the exploration noise generator.
    pub seed: u64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            initial_learning_rate: 0.005,
            learning_rate_decay: 0.001,
            min_learning_rate: 0.0001,
            gradient_clip_threshold: 1.0,
            momentum: 0.9,
            batch_size: 16,
            use_batch_normalization: false,
            exploration_rate: 0.1,
            exploration_decay: 0.002,
            min_exploration_rate: 0.01,
            use_exploration: true,
            exploration_noise_scale: 0.01,
            acceptance_reward_scale: 1.0,
            rejection_penalty_scale: 1.0,
            completion_reward_scale: 1.5, // completed trips are the strongest signal
            l2_regularization: 0.001,
            max_total_change: 0.3,
            temperature: 100.0,
            seed: 42,
        }
    }
}

impl LearningConfig {
    /// Returns configuration with small, stable steps.
    pub fn conservative() -> Self {
        Self { initial_learning_rate: 0.001, momentum: 0.9, exploration_rate: 0.05, ..Self::default() }
    }

    /// Returns configuration which adapts quickly.
    pub fn aggressive() -> Self {
        Self {
            initial_learning_rate: 0.01,
            momentum: 0.95,
            exploration_rate: 0.2,
            batch_size: 32,
            ..Self::default()
        }
    }

    /// Sets initial learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.initial_learning_rate = learning_rate;
        self
    }

    /// Sets momentum coefficient.
    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    /// Sets batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enables or disables batch normalization.
    pub fn with_batch_normalization(mut self, enabled: bool) -> Self {
        self.use_batch_normalization = enabled;
        self
    }

    /// Sets initial exploration rate.
    pub fn with_exploration_rate(mut self, exploration_rate: f64) -> Self {
        self.exploration_rate = exploration_rate;
        self
    }

    /// Enables or disables exploration noise.
    pub fn with_exploration(mut self, enabled: bool) -> Self {
        self.use_exploration = enabled;
        self
    }

    /// Sets L2 regularization strength.
    pub fn with_l2_regularization(mut self, l2_regularization: f64) -> Self {
        self.l2_regularization = l2_regularization;
        self
    }

    /// Sets seed of exploration noise.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns learning rate at given iteration: `max(min, lr0 × (1 - decay)^iteration)`.
    pub fn current_learning_rate(&self, iteration: usize) -> f64 {
        decayed(self.initial_learning_rate, self.learning_rate_decay, self.min_learning_rate, iteration)
    }

    /// Returns exploration rate at given iteration: `max(min, rate0 × (1 - decay)^iteration)`.
    pub fn current_exploration_rate(&self, iteration: usize) -> f64 {
        decayed(self.exploration_rate, self.exploration_decay, self.min_exploration_rate, iteration)
    }

    /// Checks that parameters are usable.
    pub fn validate(&self) -> PreferenceResult<()> {
        let error = |message: String| Err(PreferenceError::InvalidConfig(message));

        if self.initial_learning_rate.is_nan() || self.initial_learning_rate <= 0. {
            return error(format!("learning rate must be positive, got {}", self.initial_learning_rate));
        }

        if self.batch_size == 0 {
            return error("batch size must be positive".to_string());
        }

        if !(0. ..=1.).contains(&self.momentum) {
            return error(format!("momentum must be in [0, 1], got {}", self.momentum));
        }

        if self.temperature.is_nan() || self.temperature <= 0. {
            return error(format!("temperature must be positive, got {}", self.temperature));
        }

        Ok(())
    }
}

impl Display for LearningConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lr={}, decay={}, momentum={}, batch={}, exploration={}, l2={}",
            self.initial_learning_rate,
            self.learning_rate_decay,
            self.momentum,
            self.batch_size,
            self.exploration_rate,
            self.l2_regularization
        )
    }
}

fn decayed(initial: f64, decay: f64, min: f64, iteration: usize) -> f64 {
    let exponent = i32::try_from(iteration).unwrap_or(i32::MAX);
    (initial * (1. - decay).powi(exponent)).max(min)
}
