//! Shared builders of test data.

macro_rules! assert_close {
    ($left:expr, $right:expr) => {
        assert_close!($left, $right, 1E-9)
    };
    ($left:expr, $right:expr, $eps:expr) => {{
        let (left, right): (f64, f64) = ($left, $right);
        assert!((left - right).abs() < $eps, "expected {} to be close to {} (eps {})", left, right, $eps);
    }};
}

use crate::learning::{LearningConfig, PolicyGradientLearner};
use crate::models::{PreferenceWeights, TimeBreakdown};
use crate::store::{DynamicPreferenceStore, StoreConfig};
use std::sync::Arc;

/// Installs a test logger, ignoring repeated initialization.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates rider weights from `(access, wait, ivt, egress)` values.
pub fn create_weights(rider_id: &str, values: (f64, f64, f64, f64)) -> PreferenceWeights {
    PreferenceWeights::new(rider_id, values.0, values.1, values.2, values.3)
}

/// Creates a time breakdown without validation.
pub fn create_breakdown(access: f64, wait: f64, in_vehicle: f64, egress: f64) -> TimeBreakdown {
    TimeBreakdown { access, wait, in_vehicle, egress }
}

/// Returns the breakdown of a typical trip: 5 min walk, 2 min wait, 10 min ride, 3 min walk.
pub fn default_breakdown() -> TimeBreakdown {
    create_breakdown(300., 120., 600., 180.)
}

/// Returns typical weights of a rider.
pub fn default_weights(rider_id: &str) -> PreferenceWeights {
    create_weights(rider_id, (0.5, -0.3, 0.8, -0.2))
}

/// Creates a shared store with given weights using default bounds.
pub fn create_store(weights: Vec<PreferenceWeights>) -> Arc<DynamicPreferenceStore> {
    let store = DynamicPreferenceStore::new(StoreConfig::default());
    weights.into_iter().for_each(|weights| store.insert(weights));

    Arc::new(store)
}

/// Creates a shared store with `rider0..riderN` having default weights.
pub fn create_store_with_riders(size: usize) -> Arc<DynamicPreferenceStore> {
    create_store((0..size).map(|idx| default_weights(&format!("rider{idx}"))).collect())
}

/// Returns learner configuration without exploration noise.
pub fn deterministic_config() -> LearningConfig {
    LearningConfig::default().with_exploration(false)
}

/// Creates a learner over given store.
pub fn create_learner(store: Arc<DynamicPreferenceStore>, config: LearningConfig) -> PolicyGradientLearner {
    PolicyGradientLearner::new(store, config)
}

/// Creates a temporary directory removed on drop.
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("cannot create temp dir")
}

/// Reads all lines of a text file.
pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path).expect("cannot read file").lines().map(|line| line.to_string()).collect()
}
