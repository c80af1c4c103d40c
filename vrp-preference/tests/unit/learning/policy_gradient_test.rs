use super::*;
use crate::helpers::*;

fn create_default_learner(config: LearningConfig) -> PolicyGradientLearner {
    create_learner(create_store(vec![default_weights("rider1")]), config)
}

#[test]
fn can_produce_small_non_zero_delta_for_typical_trip() {
    let learner = create_default_learner(LearningConfig::default());

    let delta = learner.learn_from_acceptance("rider1", &default_breakdown(), 1.);

    assert!(!delta.is_zero());
    assert!(delta.l1_norm() < 0.5);
    assert!(delta.as_array().iter().all(|value| value.is_finite()));
}

#[test]
fn can_move_weights_along_trip_times_on_positive_reward() {
    let learner = create_default_learner(deterministic_config());

    let delta = learner.learn_from_acceptance("rider1", &default_breakdown(), 1.);

    assert!(delta.as_array().iter().all(|value| *value > 0.), "unexpected delta: {delta:?}");
    assert!(delta.ivt > delta.access);
}

#[test]
fn can_ignore_sign_of_rejection_penalty() {
    let positive = create_default_learner(deterministic_config());
    let negative = create_default_learner(deterministic_config());

    let positive = positive.learn_from_rejection("rider1", &default_breakdown(), 0.5);
    let negative = negative.learn_from_rejection("rider1", &default_breakdown(), -0.5);

    assert_eq!(positive, negative);
}

#[test]
fn can_apply_l2_regularization_on_zero_times() {
    let store = create_store(vec![create_weights("rider1", (1., 1., 1., 1.))]);
    let learner = create_learner(store, deterministic_config());

    let delta = learner.learn_from_completion("rider1", &TimeBreakdown::default(), 1.);

    assert!(delta.as_array().iter().all(|value| *value < 0.), "unexpected delta: {delta:?}");
    assert_close!(delta.access, 0.005 * 0.1 * -0.001, 1E-15);
}

#[test]
fn can_return_zero_delta_for_unknown_rider_without_exploration() {
    let learner = create_default_learner(deterministic_config());

    let delta = learner.learn_from_acceptance("unknown", &default_breakdown(), 1.);

    assert!(delta.is_zero());
    assert!(learner.momentum("unknown").is_none());
    assert_eq!(learner.statistics().active_riders, 0);
}

#[test]
fn can_return_only_noise_for_unknown_rider_with_exploration() {
    let learner = create_default_learner(LearningConfig::default());

    let delta = learner.learn_from_acceptance("unknown", &default_breakdown(), 1.);

    assert!(!delta.is_zero());
    assert!(delta.l1_norm() < 0.1);
    assert!(learner.momentum("unknown").is_none());
}

#[test]
fn can_return_zero_delta_for_invalid_input() {
    init_logger();
    let learner = create_default_learner(LearningConfig::default());
    let cases = vec![
        (create_breakdown(-1., 120., 600., 180.), 1.),
        (create_breakdown(300., f64::NAN, 600., 180.), 1.),
        (default_breakdown(), f64::NAN),
        (default_breakdown(), f64::INFINITY),
    ];

    for (breakdown, reward) in cases {
        let delta = learner.learn("rider1", &breakdown, reward, EventKind::Acceptance);

        assert!(delta.is_zero(), "expected zero delta for {breakdown:?} and {reward}");
    }
    assert_eq!(learner.statistics().total_updates, 0);
}

#[test]
fn can_limit_total_change() {
    let store = create_store(vec![create_weights("rider1", (0., 0., 0., 0.))]);
    let config = deterministic_config().with_learning_rate(100.).with_momentum(0.);
    let learner = create_learner(store, config);

    let delta = learner.learn_from_acceptance("rider1", &default_breakdown(), 1.);

    assert_close!(delta.l1_norm(), 0.3);
    assert_close!(delta.access / delta.ivt, 0.5);
}

#[test]
fn can_clip_momentum_norm() {
    let store = create_store(vec![create_weights("rider1", (0., 0., 0., 0.))]);
    let config = LearningConfig {
        gradient_clip_threshold: 0.1,
        max_total_change: 10.,
        ..deterministic_config().with_learning_rate(1.).with_momentum(0.)
    };
    let learner = create_learner(store, config);

    let delta = learner.learn_from_acceptance("rider1", &default_breakdown(), 1.);

    assert_close!(delta.l2_norm(), 0.1);
}

#[test]
fn can_accumulate_momentum() {
    let learner = create_default_learner(deterministic_config());

    let first = learner.learn_from_acceptance("rider1", &default_breakdown(), 1.);
    let momentum = learner.momentum("rider1").unwrap();
    let second = learner.learn_from_acceptance("rider1", &default_breakdown(), 1.);

    assert_close!(first.access, momentum.access * 0.005, 1E-15);
    assert!(second.access > first.access);
    assert_eq!(learner.statistics().total_updates, 2);
    assert_eq!(learner.statistics().active_riders, 1);
}

#[test]
fn can_produce_same_deltas_with_same_seed() {
    let run = |seed: u64| {
        let learner = create_default_learner(LearningConfig::default().with_seed(seed));
        (0..10)
            .map(|idx| learner.learn("rider1", &default_breakdown(), idx as f64 / 10. - 0.3, EventKind::Completion))
            .collect::<Vec<_>>()
    };

    assert_eq!(run(42), run(42));
    assert_ne!(run(42), run(7));
}

#[test]
fn can_decay_rates_with_iteration() {
    let learner = create_default_learner(LearningConfig::default());

    learner.update_learning_parameters(1000);
    let statistics = learner.statistics();

    assert_eq!(statistics.current_iteration, 1000);
    assert_close!(statistics.current_learning_rate, 0.005 * 0.999_f64.powi(1000));
    assert_close!(statistics.current_exploration_rate, 0.1 * 0.998_f64.powi(1000));
}

#[test]
fn can_buffer_experiences_until_batch_is_full() {
    let learner = create_default_learner(deterministic_config().with_batch_size(4));
    let experiences = |size: usize| {
        let experiences = (0..size)
            .map(|idx| LearningExperience::new("rider1", default_breakdown(), 1., EventKind::Acceptance, idx as f64))
            .collect();
        vec![(RiderId::from("rider1"), experiences)].into_iter().collect::<FxHashMap<_, _>>()
    };

    let first = learner.batch_learn(experiences(3));
    assert!(first.is_empty());
    assert_eq!(learner.statistics().buffered_experiences, 3);

    let second = learner.batch_learn(experiences(2));
    assert_eq!(second.len(), 1);
    assert!(!second.get("rider1").unwrap().is_zero());
    assert_eq!(learner.statistics().buffered_experiences, 1);
}

#[test]
fn can_normalize_batch_gradient() {
    let store = create_store(vec![create_weights("rider1", (0., 0., 0., 0.))]);
    let config = LearningConfig { max_total_change: 10., ..deterministic_config() }
        .with_batch_size(2)
        .with_batch_normalization(true)
        .with_learning_rate(1.)
        .with_momentum(0.);
    let learner = create_learner(store, config);
    let experiences = vec![
        LearningExperience::new("rider1", default_breakdown(), 1., EventKind::Acceptance, 0.),
        LearningExperience::new("rider1", create_breakdown(100., 500., 300., 100.), 0.5, EventKind::Completion, 1.),
    ];

    let deltas = learner.batch_learn(vec![(RiderId::from("rider1"), experiences)].into_iter().collect());

    let delta = deltas.get("rider1").unwrap();
    assert_close!(delta.as_array().iter().sum::<f64>(), 0., 1E-6);
    assert_close!(delta.l2_norm(), 1., 1E-6);
}

#[test]
fn can_drop_batch_experiences_of_unknown_rider() {
    let learner = create_default_learner(deterministic_config().with_batch_size(1));
    let experiences = vec![LearningExperience::new("unknown", default_breakdown(), 1., EventKind::Acceptance, 0.)];

    let deltas = learner.batch_learn(vec![(RiderId::from("unknown"), experiences)].into_iter().collect());

    assert!(deltas.is_empty());
    assert_eq!(learner.statistics().buffered_experiences, 0);
}

#[test]
fn can_reset_learner_state() {
    let learner = create_default_learner(LearningConfig::default());
    let first = learner.learn_from_acceptance("rider1", &default_breakdown(), 1.);
    learner.update_learning_parameters(10);

    learner.reset();
    let statistics = learner.statistics();
    let after_reset = learner.learn_from_acceptance("rider1", &default_breakdown(), 1.);

    assert_eq!(statistics.total_updates, 0);
    assert_eq!(statistics.current_iteration, 0);
    assert_eq!(statistics.active_riders, 0);
    assert_eq!(first, after_reset);
}
