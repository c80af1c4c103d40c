//! A crate for personalizing insertion costs of a demand-responsive transit (DRT) dispatcher.
//!
//! Each rider owns a small linear utility model over four trip time components (access, wait,
//! in-vehicle and egress time). The crate keeps these weights in a thread-safe store, learns them
//! online from acceptance, rejection and completion outcomes with a REINFORCE-style policy gradient
//! and turns them into a bounded multiplicative correction of a baseline insertion cost computed by
//! an external optimizer.
//!
//! # Key points
//!
//! - [`store::DynamicPreferenceStore`] is the single owner of rider weights during a run. It can be
//!   read concurrently from many threads, while writes are serialized per rider and always bounded.
//! - [`learning::PolicyGradientLearner`] converts `(rider, time breakdown, reward)` tuples into
//!   bounded weight deltas. It never writes to the store itself.
//! - [`cost::CostAdjuster`] wraps a baseline cost function and never fails: missing data or any
//!   numeric problem results in the unmodified baseline cost.
//! - [`events::PreferenceLearningHandler`] glues everything together behind a narrow
//!   [`events::OutcomeHandler`] trait which a host simulation calls on its events.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vrp_preference::prelude::*;
//!
//! let store = Arc::new(DynamicPreferenceStore::new(StoreConfig::default()));
//! store.insert(PreferenceWeights::new("rider1", 0.5, -0.3, 0.8, -0.2));
//!
//! let baseline: Arc<dyn InsertionCost<(RiderId, TimeBreakdown)> + Send + Sync> =
//!     Arc::new(|_: &(RiderId, TimeBreakdown)| 100.);
//! let adjuster = CostAdjuster::new(baseline, store.clone(), CostAdjustmentConfig::default());
//!
//! let breakdown = TimeBreakdown::new(300., 120., 600., 180.).unwrap();
//! let cost = adjuster.adjust(100., "rider1", Some(&breakdown));
//! assert!((80. ..=120.).contains(&cost));
//! ```

#![warn(missing_docs)]

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[macro_use]
pub mod helpers;

#[cfg(test)]
#[path = "../tests/features/mod.rs"]
mod features;

pub mod config;
pub mod cost;
pub mod events;
pub mod learning;
pub mod models;
pub mod reward;
pub mod state;
pub mod store;
pub mod utils;

/// Reexports commonly used types.
pub mod prelude {
    pub use crate::config::{PersonalizationConfig, read_config, read_config_file};
    pub use crate::cost::{CostAdjuster, CostAdjustmentConfig, InsertionCandidate, InsertionCost};
    pub use crate::events::{
        OutcomeHandler, PreferenceLearningHandler, PreferenceUpdateEvent, PreferenceUpdateTracker, UpdateReason,
    };
    pub use crate::learning::{EventKind, LearningConfig, LearningExperience, PolicyGradientLearner};
    pub use crate::models::common::{Cost, Duration, Timestamp};
    pub use crate::models::{PreferenceWeights, RiderId, TimeBreakdown, WeightDelta};
    pub use crate::reward::{RewardConfig, RewardModel};
    pub use crate::state::{StateTracker, StateTrackerConfig, SystemState, ZoneId};
    pub use crate::store::{DynamicPreferenceStore, PreferenceStore, StoreConfig, UpdateHistory};
    pub use crate::utils::{PreferenceError, PreferenceResult};
}
