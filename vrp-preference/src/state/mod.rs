//! Rolling summary of system load used as learning context and for diagnostics.
//!
//! The summary is exported alongside learning outcomes, but the learner does not condition its
//! gradient on it.

mod state_tracker;
pub use self::state_tracker::{StateAction, StateActionRecord, StateTracker, StateTrackerConfig, SystemMetrics};

mod system_state;
pub use self::system_state::{FEATURE_NAMES, SystemState, ZoneId};
