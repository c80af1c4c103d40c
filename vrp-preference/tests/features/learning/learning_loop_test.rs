use crate::config::PersonalizationConfig;
use crate::events::{OutcomeHandler, PreferenceLearningHandler};
use crate::helpers::*;
use crate::models::RiderId;

/// Scenario: a handler built from configuration observes a small fleet over three iterations.
///
/// Every iteration produces its own output files, summaries are appended, learning rate decays
/// between iterations and learned weights differ from seed weights.
#[test]
fn can_run_learning_loop_over_iterations() {
    init_logger();
    let dir = create_temp_dir();
    let output_dir = dir.path().join("output");
    let config = PersonalizationConfig { output_dir: Some(output_dir.clone()), ..PersonalizationConfig::default() };
    let store = create_store_with_riders(4);
    let handler = PreferenceLearningHandler::from_config(&config, store.clone()).unwrap();

    for iteration in 0..3 {
        for idx in 0..8 {
            let rider_id = RiderId::from(format!("rider{}", idx % 4));
            let time = (idx * 300) as f64;

            handler.on_submitted(&rider_id, Some(idx as u32), time);
            if idx == 7 {
                handler.on_rejected(&rider_id, time + 10.);
            } else {
                handler.on_accepted(&rider_id, time + 240., time + 1200., time + 10.);
                handler.on_completed(&rider_id, time + 240., Some(2), time + 1200.);
            }
        }

        handler.on_iteration_end(iteration).unwrap();

        for name in [
            format!("rl_state_action_{iteration}.csv"),
            format!("learned_preferences_iter_{iteration}.csv"),
            format!("preference_updates_iter_{iteration}.csv"),
            format!("preference_person_stats_iter_{iteration}.csv"),
        ] {
            assert!(output_dir.join(&name).exists(), "missing {name}");
        }

        // 7 accepted and completed trips, 1 rejection
        assert_eq!(read_lines(&output_dir.join(format!("preference_updates_iter_{iteration}.csv"))).len(), 16);
        assert_eq!(read_lines(&output_dir.join(format!("rl_state_action_{iteration}.csv"))).len(), 24);
    }

    let summary = read_lines(&output_dir.join("preference_learning_summary.csv"));
    assert_eq!(summary.len(), 4);
    assert!(summary[1..].iter().all(|line| line.split(',').nth(1) == Some("15")));

    let learning_rates = read_lines(&output_dir.join("rl_learning_metrics.csv"))
        .iter()
        .skip(1)
        .map(|line| line.split(',').nth(7).unwrap().parse::<f64>().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(learning_rates.len(), 3);
    assert!(learning_rates.windows(2).all(|pair| pair[1] < pair[0]));

    assert_eq!(store.global_update_count(), 45);
    store.rider_ids().iter().for_each(|rider_id| {
        assert_ne!(store.get(rider_id.as_str()).unwrap(), default_weights(rider_id.as_str()));
    });
}
