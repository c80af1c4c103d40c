use super::LearningConfig;
use crate::models::common::Timestamp;
use crate::models::{RiderId, TimeBreakdown};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Kind of an observed outcome which produces a learning signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A trip request was accepted and scheduled.
    Acceptance,
    /// A trip request was rejected.
    Rejection,
    /// A trip was completed.
    Completion,
}

impl EventKind {
    /// Scales a raw reward according to event kind. Rejection always yields a non-positive reward.
    pub fn scale_reward(&self, reward: f64, config: &LearningConfig) -> f64 {
        match self {
            EventKind::Acceptance => reward * config.acceptance_reward_scale,
            EventKind::Rejection => -reward.abs() * config.rejection_penalty_scale,
            EventKind::Completion => reward * config.completion_reward_scale,
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EventKind::Acceptance => "acceptance",
            EventKind::Rejection => "rejection",
            EventKind::Completion => "completion",
        })
    }
}

/// A single observation buffered for batch learning.
#[derive(Clone, Debug, PartialEq)]
pub struct LearningExperience {
    /// Rider who produced the observation.
    pub rider_id: RiderId,
    /// Observed or estimated trip times.
    pub breakdown: TimeBreakdown,
    /// Raw, unscaled reward.
    pub reward: f64,
    /// Kind of the outcome.
    pub kind: EventKind,
    /// Simulation time of the observation.
    pub time: Timestamp,
}

impl LearningExperience {
    /// Creates a new instance of `LearningExperience`.
    pub fn new(
        rider_id: impl Into<RiderId>,
        breakdown: TimeBreakdown,
        reward: f64,
        kind: EventKind,
        time: Timestamp,
    ) -> Self {
        Self { rider_id: rider_id.into(), breakdown, reward, kind, time }
    }
}
