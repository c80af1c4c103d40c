#[cfg(test)]
#[path = "../../tests/unit/reward/reward_model_test.rs"]
mod reward_model_test;

use crate::models::common::Duration;
use crate::models::{PreferenceWeights, TimeBreakdown};
use serde::{Deserialize, Serialize};

/// Specifies reward shaping and time estimates used when actual trip times are not known.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardConfig {
    /// Reward of an accepted request with zero wait.
    pub acceptance_base: f64,
    /// Reward of a rejected request, expected to be negative.
    pub rejection_base: f64,
    /// Reward of a completed trip.
    pub completion_base: f64,
    /// Wait time at which acceptance reward decays to its minimum.
    pub max_wait_for_reward: Duration,
    /// Lower bound of acceptance reward.
    pub min_acceptance_reward: f64,
    /// Wait time below which completion gets a bonus.
    pub quick_service_wait: Duration,
    /// Multiplier of completion reward for quick service.
    pub quick_service_bonus: f64,
    /// Wait time above which completion gets a penalty.
    pub long_wait: Duration,
    /// Multiplier of completion reward for long waits.
    pub long_wait_penalty: f64,
    /// Estimated access time of a scheduled or completed trip.
    pub access_estimate: Duration,
    /// Estimated egress time of a scheduled or completed trip.
    pub egress_estimate: Duration,
    /// Assumed trip times of a rejected request.
    pub rejection_estimate: TimeBreakdown,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            acceptance_base: 1.0,
            rejection_base: -0.5,
            completion_base: 1.5,
            max_wait_for_reward: 1800., // 30 min
            min_acceptance_reward: 0.1,
            quick_service_wait: 300., // 5 min
            quick_service_bonus: 1.2,
            long_wait: 900., // 15 min
            long_wait_penalty: 0.8,
            access_estimate: 300.,
            egress_estimate: 180.,
            rejection_estimate: TimeBreakdown { access: 600., wait: 1200., in_vehicle: 1800., egress: 300. },
        }
    }
}

/// Calculates rewards of trip outcomes.
#[derive(Clone, Debug, Default)]
pub struct RewardModel {
    config: RewardConfig,
}

impl RewardModel {
    /// Creates a new instance of `RewardModel`.
    pub fn new(config: RewardConfig) -> Self {
        Self { config }
    }

    /// Returns reward configuration.
    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Returns reward of a scheduled request, linearly decaying with wait time down to a minimum.
    pub fn scheduling_reward(&self, wait: Duration) -> f64 {
        let wait = wait.max(0.);
        let reward = self.config.acceptance_base * (1. - wait / self.config.max_wait_for_reward);

        reward.max(self.config.min_acceptance_reward)
    }

    /// Returns fixed penalty of a rejected request.
    pub fn rejection_penalty(&self) -> f64 {
        self.config.rejection_base
    }

    /// Returns reward of a completed trip with a bonus for quick service and a penalty for long waits.
    pub fn completion_reward(&self, wait: Duration) -> f64 {
        let base = self.config.completion_base;

        if wait < self.config.quick_service_wait {
            base * self.config.quick_service_bonus
        } else if wait > self.config.long_wait {
            base * self.config.long_wait_penalty
        } else {
            base
        }
    }

    /// Returns reward which favors riders with strong preferences when served well: `0.1 × Σ|w| × level`.
    pub fn fairness_reward(&self, weights: &PreferenceWeights, service_level: f64) -> f64 {
        let sensitivity: f64 = weights.as_array().iter().map(|weight| weight.abs()).sum();

        0.1 * sensitivity * service_level
    }

    /// Returns system level reward: `10 × service_rate - max(0, avg_wait - 300) / 60 + 5 × utilization`.
    pub fn system_performance_reward(&self, service_rate: f64, avg_wait: Duration, utilization: f64) -> f64 {
        let wait_penalty = (avg_wait - self.config.quick_service_wait).max(0.) / 60.;

        10. * service_rate - wait_penalty + 5. * utilization
    }

    /// Returns estimated trip times of a scheduled request.
    pub fn acceptance_breakdown(&self, wait: Duration, in_vehicle: Duration) -> TimeBreakdown {
        self.estimate(wait, in_vehicle)
    }

    /// Returns assumed trip times of a rejected request.
    pub fn rejection_breakdown(&self) -> TimeBreakdown {
        self.config.rejection_estimate
    }

    /// Returns trip times of a completed trip with estimated walking parts.
    pub fn completion_breakdown(&self, wait: Duration, in_vehicle: Duration) -> TimeBreakdown {
        self.estimate(wait, in_vehicle)
    }

    fn estimate(&self, wait: Duration, in_vehicle: Duration) -> TimeBreakdown {
        TimeBreakdown {
            access: self.config.access_estimate,
            wait: wait.max(0.),
            in_vehicle: in_vehicle.max(0.),
            egress: self.config.egress_estimate,
        }
    }
}
