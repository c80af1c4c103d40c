#[cfg(test)]
#[path = "../../tests/unit/models/preference_test.rs"]
mod preference_test;

use super::common::{Duration, WEIGHT_DIMENSIONS};
use crate::utils::{PreferenceError, PreferenceResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// An opaque rider identifier.
///
/// Cloning is cheap, so identifiers can be freely copied into weights, events and records which
/// are created on the hot path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RiderId(Arc<str>);

impl RiderId {
    /// Creates a new instance of `RiderId`.
    pub fn new(id: &str) -> Self {
        Self(Arc::from(id))
    }

    /// Returns identifier as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RiderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RiderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RiderId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl Borrow<str> for RiderId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for RiderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RiderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(RiderId::from)
    }
}

/// Linear utility weights of a single rider.
///
/// Weights are disutility coefficients of trip time components: the utility of a trip is the
/// weighted sum of its [`TimeBreakdown`]. The value is immutable, updates produce a new instance.
#[derive(Clone, Debug, PartialEq)]
pub struct PreferenceWeights {
    /// Rider who owns the weights.
    pub rider_id: RiderId,
    /// Weight of the access (walk to pickup) time.
    pub access: f64,
    /// Weight of the wait time.
    pub wait: f64,
    /// Weight of the in-vehicle time.
    pub ivt: f64,
    /// Weight of the egress (walk from dropoff) time.
    pub egress: f64,
}

impl PreferenceWeights {
    /// Creates a new instance of `PreferenceWeights`.
    pub fn new(rider_id: impl Into<RiderId>, access: f64, wait: f64, ivt: f64, egress: f64) -> Self {
        Self { rider_id: rider_id.into(), access, wait, ivt, egress }
    }

    /// Creates weights from array in `[access, wait, ivt, egress]` order.
    pub fn from_array(rider_id: RiderId, values: [f64; WEIGHT_DIMENSIONS]) -> Self {
        let [access, wait, ivt, egress] = values;
        Self { rider_id, access, wait, ivt, egress }
    }

    /// Returns weights as array in `[access, wait, ivt, egress]` order.
    pub fn as_array(&self) -> [f64; WEIGHT_DIMENSIONS] {
        [self.access, self.wait, self.ivt, self.egress]
    }

    /// Calculates utility of given time breakdown: `Σ weight_i × time_i`.
    pub fn utility(&self, breakdown: &TimeBreakdown) -> f64 {
        self.as_array().iter().zip(breakdown.as_array().iter()).map(|(weight, time)| weight * time).sum()
    }

    /// Returns true if all weights are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.as_array().iter().all(|weight| weight.is_finite())
    }
}

impl Display for PreferenceWeights {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: access={:.3}, wait={:.3}, ivt={:.3}, egress={:.3}",
            self.rider_id, self.access, self.wait, self.ivt, self.egress
        )
    }
}

/// Time components of a specific candidate insertion or of an observed trip, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBreakdown {
    /// Walking time from origin to pickup point.
    pub access: Duration,
    /// Waiting time until pickup.
    pub wait: Duration,
    /// Time spent in the vehicle.
    pub in_vehicle: Duration,
    /// Walking time from dropoff point to destination.
    pub egress: Duration,
}

impl TimeBreakdown {
    /// Creates a new validated instance of `TimeBreakdown`.
    /// Returns [`PreferenceError::InvalidInput`] if any component is negative or not finite.
    pub fn new(access: Duration, wait: Duration, in_vehicle: Duration, egress: Duration) -> PreferenceResult<Self> {
        let breakdown = Self { access, wait, in_vehicle, egress };
        breakdown.validate()?;

        Ok(breakdown)
    }

    /// Checks that all components are finite and non-negative.
    pub fn validate(&self) -> PreferenceResult<()> {
        const NAMES: [&str; WEIGHT_DIMENSIONS] = ["access", "wait", "in-vehicle", "egress"];

        NAMES.iter().zip(self.as_array().iter()).try_for_each(|(name, value)| {
            if value.is_finite() && *value >= 0. {
                Ok(())
            } else {
                Err(PreferenceError::InvalidInput(format!("{name} time must be finite and non-negative, got {value}")))
            }
        })
    }

    /// Returns components as array in `[access, wait, in_vehicle, egress]` order.
    pub fn as_array(&self) -> [Duration; WEIGHT_DIMENSIONS] {
        [self.access, self.wait, self.in_vehicle, self.egress]
    }

    /// Returns total time of all components.
    pub fn total(&self) -> Duration {
        self.as_array().iter().sum()
    }

    /// Returns components scaled to sum up to one. All-zero breakdown stays all-zero.
    pub fn normalized(&self) -> [f64; WEIGHT_DIMENSIONS] {
        let total = self.total();
        if total > 0. { self.as_array().map(|value| value / total) } else { self.as_array() }
    }
}

/// A transient change of rider weights produced by the learner and consumed by the store.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WeightDelta {
    /// Change of the access weight.
    pub access: f64,
    /// Change of the wait weight.
    pub wait: f64,
    /// Change of the in-vehicle time weight.
    pub ivt: f64,
    /// Change of the egress weight.
    pub egress: f64,
}

impl WeightDelta {
    /// Creates a new instance of `WeightDelta`.
    pub fn new(access: f64, wait: f64, ivt: f64, egress: f64) -> Self {
        Self { access, wait, ivt, egress }
    }

    /// Returns delta which does not change anything.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Creates delta from array in `[access, wait, ivt, egress]` order.
    pub fn from_array(values: [f64; WEIGHT_DIMENSIONS]) -> Self {
        let [access, wait, ivt, egress] = values;
        Self { access, wait, ivt, egress }
    }

    /// Returns delta as array in `[access, wait, ivt, egress]` order.
    pub fn as_array(&self) -> [f64; WEIGHT_DIMENSIONS] {
        [self.access, self.wait, self.ivt, self.egress]
    }

    /// Returns sum of absolute component values.
    pub fn l1_norm(&self) -> f64 {
        self.as_array().iter().map(|value| value.abs()).sum()
    }

    /// Returns euclidean norm of the delta.
    pub fn l2_norm(&self) -> f64 {
        self.as_array().iter().map(|value| value * value).sum::<f64>().sqrt()
    }

    /// Returns true if all components are exactly zero.
    pub fn is_zero(&self) -> bool {
        self.as_array().iter().all(|value| *value == 0.)
    }

    /// Returns delta multiplied by given factor.
    pub fn scale(&self, factor: f64) -> Self {
        Self::from_array(self.as_array().map(|value| value * factor))
    }
}
