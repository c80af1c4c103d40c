use crate::helpers::*;
use crate::learning::LearningConfig;

/// Scenario: a rider accepts 100 trips in a row with a moderate reward and exploration enabled.
///
/// Every single update stays within the step limit of the store and the learner's total change limit,
/// weights stay within bounds and keep moving in the direction of the reward.
#[test]
fn can_keep_repeated_updates_bounded() {
    let store = create_store(vec![default_weights("rider1")]);
    let learner = create_learner(store.clone(), LearningConfig::default());
    let config = store.config().clone();

    (0..100).for_each(|_| {
        let delta = learner.learn_from_acceptance("rider1", &default_breakdown(), 0.5);
        assert!(delta.l1_norm() <= learner.config().max_total_change + 1E-12);

        let (old, new) = store.apply_delta("rider1", &delta).unwrap();
        old.as_array().iter().zip(new.as_array().iter()).for_each(|(old, new)| {
            assert!((new - old).abs() <= config.max_weight_change + 1E-12);
            assert!((config.min_weight..=config.max_weight).contains(new));
        });
    });

    let weights = store.get("rider1").unwrap();
    assert!(weights.is_finite());
    assert_eq!(store.history("rider1").unwrap().update_count, 100);
    assert!(store.history("rider1").unwrap().average_change_magnitude() < config.max_weight_change);
}

/// Scenario: learning rate is so large that every raw step would leave the bounds.
///
/// The store absorbs it: weights saturate at the bounds and never cross them.
#[test]
fn can_saturate_weights_at_bounds() {
    let store = create_store(vec![create_weights("rider1", (0., 0., 0., 0.))]);
    let config = LearningConfig {
        max_total_change: 100.,
        temperature: 1E6,
        ..deterministic_config().with_learning_rate(50.)
    };
    let learner = create_learner(store.clone(), config);

    (0..200).for_each(|_| {
        let delta = learner.learn_from_completion("rider1", &create_breakdown(600., 0., 600., 0.), 1.);
        store.update("rider1", &delta);
    });

    let weights = store.get("rider1").unwrap();
    assert!(weights.as_array().iter().all(|weight| (-2. ..=2.).contains(weight)));
    assert_eq!(weights.access, 2.);
    assert_eq!(weights.ivt, 2.);
}
