use crate::events::{OutcomeHandler, PreferenceLearningHandler};
use crate::helpers::*;
use crate::models::{RiderId, WeightDelta};
use crate::store::{DynamicPreferenceStore, PreferenceStore, StoreConfig};
use std::sync::Arc;

/// Scenario: weights learned during a run are persisted at iteration end and used to seed a new run.
///
/// Both the thread-safe store and the plain seed store restore exactly the learned weights.
#[test]
fn can_continue_from_persisted_weights() {
    let dir = create_temp_dir();
    let output_dir = dir.path().join("run1");
    let store = create_store_with_riders(3);
    let learner = Arc::new(create_learner(store.clone(), deterministic_config()));
    let handler =
        PreferenceLearningHandler::new(store.clone(), learner).with_output_dir(output_dir.clone()).with_snapshots(true);

    (0..3).for_each(|idx| {
        let rider_id = RiderId::from(format!("rider{idx}"));
        handler.on_submitted(&rider_id, None, 0.);
        handler.on_accepted(&rider_id, 60. * idx as f64, 900., 10.);
        handler.on_completed(&rider_id, 60. * idx as f64, None, 1200.);
    });
    handler.on_iteration_end(0).unwrap();

    let snapshot = output_dir.join("learned_preferences_iter_0.csv");
    let restored = DynamicPreferenceStore::new(StoreConfig::default());
    let seeded = PreferenceStore::read_csv(&snapshot).unwrap();
    let seeded = DynamicPreferenceStore::from_store(seeded, StoreConfig::default());

    assert_eq!(restored.restore(&snapshot).unwrap(), 3);
    assert_eq!(seeded.len(), 3);
    store.rider_ids().iter().for_each(|rider_id| {
        let expected = store.get(rider_id.as_str()).unwrap();
        assert_ne!(expected, default_weights(rider_id.as_str()));

        for actual in [restored.get(rider_id.as_str()).unwrap(), seeded.get(rider_id.as_str()).unwrap()] {
            expected.as_array().iter().zip(actual.as_array().iter()).for_each(|(expected, actual)| {
                assert_close!(*actual, *expected, 1E-12);
            });
        }
    });
}

/// Scenario: a snapshot is restored into a running store which already has learned history.
///
/// Restored riders get snapshot weights but keep their history, riders missing in the snapshot are untouched.
#[test]
fn can_restore_into_running_store() {
    let dir = create_temp_dir();
    let path = dir.path().join("snapshot.csv");
    std::fs::write(&path, "id,access,wait,ivt,egress\nrider1,0.1,0.2,0.3,0.4\nrider9,5.0,-5.0,0.0,0.0\n").unwrap();
    let store = create_store_with_riders(3);
    store.update("rider1", &WeightDelta::new(0.01, 0., 0., 0.));

    let count = store.restore(&path).unwrap();

    assert_eq!(count, 2);
    assert_eq!(store.len(), 4);
    assert_eq!(store.get("rider1"), Some(create_weights("rider1", (0.1, 0.2, 0.3, 0.4))));
    assert_eq!(store.history("rider1").unwrap().update_count, 1);
    assert_eq!(store.get("rider2"), Some(default_weights("rider2")));
    assert_eq!(store.get("rider9"), Some(create_weights("rider9", (2., -2., 0., 0.))));
}
