use crate::helpers::*;
use crate::learning::EventKind;
use crate::models::WeightDelta;

/// Scenario: 10 threads apply 100 small updates each, spread evenly over 10 riders.
///
/// No update may be lost: every rider ends up with exactly 100 applied updates and the sum of them.
#[test]
fn can_apply_concurrent_updates_without_losing_any() {
    let store = create_store_with_riders(10);
    let delta = WeightDelta::new(0.001, 0., -0.001, 0.);

    let successes = std::thread::scope(|scope| {
        let handles = (0..10)
            .map(|_| {
                let store = store.clone();
                scope.spawn(move || {
                    (0..100).filter(|idx| store.update(&format!("rider{}", idx % 10), &delta)).count()
                })
            })
            .collect::<Vec<_>>();

        handles.into_iter().map(|handle| handle.join().unwrap()).sum::<usize>()
    });

    assert_eq!(successes, 1000);
    assert_eq!(store.global_update_count(), 1000);
    store.rider_ids().iter().for_each(|rider_id| {
        let weights = store.get(rider_id.as_str()).unwrap();
        assert_close!(weights.access, 0.6, 1E-9);
        assert_close!(weights.ivt, 0.7, 1E-9);
        assert_eq!(weights.wait, -0.3);
        assert_eq!(store.history(rider_id.as_str()).unwrap().update_count, 100);
    });
}

/// Scenario: learner and store are shared by many threads, each of them learning from outcomes of own riders.
#[test]
fn can_learn_concurrently() {
    let store = create_store_with_riders(8);
    let learner = create_learner(store.clone(), deterministic_config());

    std::thread::scope(|scope| {
        (0..8).for_each(|idx| {
            let (store, learner) = (&store, &learner);
            scope.spawn(move || {
                let rider_id = format!("rider{idx}");
                (0..50).for_each(|_| {
                    let delta = learner.learn(&rider_id, &default_breakdown(), 1., EventKind::Acceptance);
                    store.update(&rider_id, &delta);
                });
            });
        });
    });

    let statistics = learner.statistics();
    assert_eq!(statistics.total_updates, 400);
    assert_eq!(statistics.active_riders, 8);
    assert_eq!(store.global_update_count(), 400);

    let reference = store.get("rider0").unwrap();
    (1..8).for_each(|idx| {
        let weights = store.get(&format!("rider{idx}")).unwrap();
        assert_eq!(weights.as_array(), reference.as_array());
    });
}

/// Scenario: one thread keeps updating a rider while others read weights.
///
/// Readers never observe weights outside of configured bounds.
#[test]
fn can_read_while_updating() {
    let store = create_store(vec![create_weights("rider1", (1.9, -1.9, 0., 0.))]);
    let delta = WeightDelta::new(0.05, -0.05, 0.01, -0.01);

    std::thread::scope(|scope| {
        scope.spawn(|| (0..200).for_each(|_| assert!(store.update("rider1", &delta))));

        (0..4).for_each(|_| {
            scope.spawn(|| {
                (0..200).for_each(|_| {
                    let weights = store.get("rider1").unwrap();
                    assert!(weights.as_array().iter().all(|weight| (-2. ..=2.).contains(weight)));
                });
            });
        });
    });

    let weights = store.get("rider1").unwrap();
    assert_eq!((weights.access, weights.wait), (2., -2.));
    assert_close!(weights.ivt, 2., 1E-9);
    assert_close!(weights.egress, -2., 1E-9);
}
