#[cfg(test)]
#[path = "../../tests/unit/events/update_event_test.rs"]
mod update_event_test;

use crate::learning::EventKind;
use crate::models::common::Timestamp;
use crate::models::{PreferenceWeights, RiderId, WeightDelta};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A reason of a preference update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateReason {
    /// Update learned from an accepted request.
    RequestAccepted,
    /// Update learned from a rejected request.
    RequestRejected,
    /// Update learned from a completed trip.
    TripCompleted,
}

impl UpdateReason {
    /// Returns reason name as written to update logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateReason::RequestAccepted => "request_accepted",
            UpdateReason::RequestRejected => "request_rejected",
            UpdateReason::TripCompleted => "trip_completed",
        }
    }
}

impl From<EventKind> for UpdateReason {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Acceptance => UpdateReason::RequestAccepted,
            EventKind::Rejection => UpdateReason::RequestRejected,
            EventKind::Completion => UpdateReason::TripCompleted,
        }
    }
}

impl Display for UpdateReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes a single applied change of rider weights.
#[derive(Clone, Debug, PartialEq)]
pub struct PreferenceUpdateEvent {
    /// Simulation time of the update.
    pub time: Timestamp,
    /// Weights before the update.
    pub old_weights: PreferenceWeights,
    /// Weights after the update.
    pub new_weights: PreferenceWeights,
    /// Outcome which triggered the update.
    pub reason: UpdateReason,
    /// Raw reward of the outcome.
    pub reward: f64,
}

impl PreferenceUpdateEvent {
    /// Creates a new instance of `PreferenceUpdateEvent`.
    pub fn new(
        time: Timestamp,
        old_weights: PreferenceWeights,
        new_weights: PreferenceWeights,
        reason: UpdateReason,
        reward: f64,
    ) -> Self {
        Self { time, old_weights, new_weights, reason, reward }
    }

    /// Returns updated rider.
    pub fn rider_id(&self) -> &RiderId {
        &self.new_weights.rider_id
    }

    /// Returns actually applied change.
    pub fn deltas(&self) -> WeightDelta {
        let old = self.old_weights.as_array();
        let new = self.new_weights.as_array();

        WeightDelta::from_array(std::array::from_fn(|idx| new[idx] - old[idx]))
    }

    /// Returns sum of absolute weight changes.
    pub fn magnitude(&self) -> f64 {
        self.deltas().l1_norm()
    }
}
