use super::*;

#[test]
fn can_use_default_values() {
    let config = LearningConfig::default();

    assert_eq!(config.initial_learning_rate, 0.005);
    assert_eq!(config.momentum, 0.9);
    assert_eq!(config.batch_size, 16);
    assert_eq!(config.completion_reward_scale, 1.5);
    assert_eq!(config.max_total_change, 0.3);
    assert_eq!(config.temperature, 100.);
    assert_eq!(config.seed, 42);
    assert!(config.use_exploration);
    assert!(!config.use_batch_normalization);
    assert!(config.validate().is_ok());
}

#[test]
fn can_create_presets() {
    let conservative = LearningConfig::conservative();
    let aggressive = LearningConfig::aggressive();

    assert_eq!(conservative.initial_learning_rate, 0.001);
    assert_eq!(conservative.exploration_rate, 0.05);
    assert_eq!(aggressive.initial_learning_rate, 0.01);
    assert_eq!(aggressive.momentum, 0.95);
    assert_eq!(aggressive.batch_size, 32);
    assert!(conservative.validate().is_ok());
    assert!(aggressive.validate().is_ok());
}

#[test]
fn can_decay_learning_rate() {
    let config = LearningConfig::default();
    let cases = vec![(0, 0.005), (1, 0.005 * 0.999), (100, 0.005 * 0.999_f64.powi(100)), (100_000, 0.0001)];

    for (iteration, expected) in cases {
        let rate = config.current_learning_rate(iteration);

        assert!((rate - expected).abs() < 1E-12, "expected {expected} at {iteration}, got {rate}");
    }
}

#[test]
fn can_decay_exploration_rate_to_minimum() {
    let config = LearningConfig::default();

    assert_eq!(config.current_exploration_rate(0), 0.1);
    assert!(config.current_exploration_rate(100) < 0.1);
    assert_eq!(config.current_exploration_rate(2000), 0.01);
    assert_eq!(config.current_exploration_rate(usize::MAX), 0.01);
}

#[test]
fn can_validate_config() {
    let cases = vec![
        (LearningConfig::default().with_learning_rate(0.), false),
        (LearningConfig::default().with_learning_rate(-0.1), false),
        (LearningConfig::default().with_learning_rate(f64::NAN), false),
        (LearningConfig::default().with_batch_size(0), false),
        (LearningConfig::default().with_momentum(1.1), false),
        (LearningConfig::default().with_momentum(-0.1), false),
        (LearningConfig::default().with_momentum(0.), true),
        (LearningConfig::default().with_momentum(1.), true),
        (LearningConfig { temperature: 0., ..LearningConfig::default() }, false),
    ];

    for (config, is_valid) in cases {
        let result = config.validate();

        assert_eq!(result.is_ok(), is_valid, "unexpected result for {config}");
        if !is_valid {
            assert!(matches!(result, Err(PreferenceError::InvalidConfig(_))));
        }
    }
}

#[test]
fn can_deserialize_partial_config() {
    let config: LearningConfig = serde_json::from_str(r#"{"initialLearningRate": 0.01, "batchSize": 8}"#).unwrap();

    assert_eq!(config.initial_learning_rate, 0.01);
    assert_eq!(config.batch_size, 8);
    assert_eq!(config.momentum, 0.9);
}

#[test]
fn can_display_key_values() {
    let text = LearningConfig::default().to_string();

    assert!(text.contains("lr=0.005"));
    assert!(text.contains("batch=16"));
}
