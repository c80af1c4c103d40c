//! Connects a host simulation to the learning loop.
//!
//! The host reports trip outcomes through the [`OutcomeHandler`] trait. [`PreferenceLearningHandler`]
//! turns them into rewards, learns weight deltas, applies them to the store and records every
//! applied change as a [`PreferenceUpdateEvent`].

use crate::models::RiderId;
use crate::models::common::Timestamp;
use crate::state::ZoneId;
use crate::utils::PreferenceResult;

mod learning_handler;
pub use self::learning_handler::{LearningCounters, PreferenceLearningHandler};

mod update_event;
pub use self::update_event::{PreferenceUpdateEvent, UpdateReason};

mod update_tracker;
pub use self::update_tracker::{PreferenceLearningStats, PreferenceUpdateTracker};

/// Receives trip lifecycle events from a host simulation.
pub trait OutcomeHandler: Send + Sync {
    /// Called when a rider submits a trip request.
    fn on_submitted(&self, rider_id: &RiderId, origin_zone: Option<ZoneId>, time: Timestamp);

    /// Called when a request is scheduled with expected pickup and dropoff times.
    fn on_accepted(&self, rider_id: &RiderId, pickup_time: Timestamp, dropoff_time: Timestamp, time: Timestamp);

    /// Called when a request is rejected.
    fn on_rejected(&self, rider_id: &RiderId, time: Timestamp);

    /// Called when a rider arrives. Departure time is the time the rider boarded the vehicle.
    fn on_completed(&self, rider_id: &RiderId, departure_time: Timestamp, dest_zone: Option<ZoneId>, time: Timestamp);

    /// Called once at the end of every iteration.
    fn on_iteration_end(&self, iteration: usize) -> PreferenceResult<()>;
}
