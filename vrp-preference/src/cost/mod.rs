//! Preference-aware correction of insertion costs.

mod adjuster;
pub use self::adjuster::{CostAdjuster, CostAdjustmentConfig, CostAdjustmentStats};

use crate::models::common::Cost;
use crate::models::{RiderId, TimeBreakdown};

/// Calculates a baseline cost of a candidate insertion.
pub trait InsertionCost<C> {
    /// Returns cost of the candidate.
    fn cost(&self, candidate: &C) -> Cost;
}

impl<C, F> InsertionCost<C> for F
where
    F: Fn(&C) -> Cost,
{
    fn cost(&self, candidate: &C) -> Cost {
        (self)(candidate)
    }
}

/// Exposes rider related data of a candidate insertion.
pub trait InsertionCandidate {
    /// Returns id of the rider to be inserted.
    fn rider_id(&self) -> &str;

    /// Returns estimated time components of the trip, if they can be estimated.
    fn time_breakdown(&self) -> Option<TimeBreakdown>;
}

impl InsertionCandidate for (RiderId, TimeBreakdown) {
    fn rider_id(&self) -> &str {
        self.0.as_str()
    }

    fn time_breakdown(&self) -> Option<TimeBreakdown> {
        Some(self.1)
    }
}

impl InsertionCandidate for (RiderId, Option<TimeBreakdown>) {
    fn rider_id(&self) -> &str {
        self.0.as_str()
    }

    fn time_breakdown(&self) -> Option<TimeBreakdown> {
        self.1
    }
}
