#[cfg(test)]
#[path = "../../tests/unit/events/learning_handler_test.rs"]
mod learning_handler_test;

use super::{OutcomeHandler, PreferenceUpdateEvent, PreferenceUpdateTracker};
use crate::config::PersonalizationConfig;
use crate::learning::{EventKind, PolicyGradientLearner};
use crate::models::common::{Duration, Timestamp};
use crate::models::{RiderId, TimeBreakdown};
use crate::reward::RewardModel;
use crate::state::{StateTracker, ZoneId};
use crate::store::DynamicPreferenceStore;
use crate::utils::{CsvRow, PreferenceResult, append_row, create_dirs};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Learning counters of the current iteration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LearningCounters {
    /// Amount of applied updates.
    pub total_updates: usize,
    /// Updates learned from accepted requests.
    pub acceptance: usize,
    /// Updates learned from rejected requests.
    pub rejection: usize,
    /// Updates learned from completed trips.
    pub completion: usize,
    /// Sum of raw rewards of applied updates.
    pub total_reward: f64,
    /// Outcomes of riders without weights.
    pub skipped: usize,
}

impl LearningCounters {
    /// Returns mean reward per applied update.
    pub fn average_reward(&self) -> f64 {
        if self.total_updates > 0 { self.total_reward / self.total_updates as f64 } else { 0. }
    }
}

struct TripRecord {
    submitted_at: Timestamp,
    wait: Option<Duration>,
}

/// Runs the learning loop on trip outcomes reported by a host simulation.
///
/// Every outcome of a rider with weights is converted into a reward, passed to the learner and the
/// resulting delta is applied to the store. Wait times are derived from submission and pickup times,
/// walking times are estimated by the [`RewardModel`].
pub struct PreferenceLearningHandler {
    enabled: bool,
    store: Arc<DynamicPreferenceStore>,
    learner: Arc<PolicyGradientLearner>,
    reward_model: RewardModel,
    state: StateTracker,
    tracker: PreferenceUpdateTracker,
    output_dir: Option<PathBuf>,
    snapshot_every_iteration: bool,
    trips: Mutex<FxHashMap<RiderId, TripRecord>>,
    counters: Mutex<LearningCounters>,
}

impl PreferenceLearningHandler {
    /// Creates a new instance of `PreferenceLearningHandler` with default reward model and state tracker.
    pub fn new(store: Arc<DynamicPreferenceStore>, learner: Arc<PolicyGradientLearner>) -> Self {
        Self {
            enabled: true,
            store,
            learner,
            reward_model: RewardModel::default(),
            state: StateTracker::default(),
            tracker: PreferenceUpdateTracker::new(),
            output_dir: None,
            snapshot_every_iteration: false,
            trips: Mutex::new(FxHashMap::default()),
            counters: Mutex::new(LearningCounters::default()),
        }
    }

    /// Creates a handler and its learner from validated configuration.
    pub fn from_config(config: &PersonalizationConfig, store: Arc<DynamicPreferenceStore>) -> PreferenceResult<Self> {
        config.validate()?;

        let learner = Arc::new(PolicyGradientLearner::new(store.clone(), config.learning.clone()));
        log::info!("preference learning {}: {}", if config.enabled { "enabled" } else { "disabled" }, config.learning);

        let handler = Self::new(store, learner)
            .with_enabled(config.enabled)
            .with_reward_model(RewardModel::new(config.reward.clone()))
            .with_state_tracker(StateTracker::new(config.state.clone()))
            .with_snapshots(config.snapshot_every_iteration);

        Ok(match &config.output_dir {
            Some(output_dir) => handler.with_output_dir(output_dir.clone()),
            None => handler,
        })
    }

    /// Enables or disables learning. State tracking continues when learning is disabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets reward model.
    pub fn with_reward_model(mut self, reward_model: RewardModel) -> Self {
        self.reward_model = reward_model;
        self
    }

    /// Sets state tracker.
    pub fn with_state_tracker(mut self, state: StateTracker) -> Self {
        self.state = state;
        self
    }

    /// Sets directory for per-iteration outputs.
    pub fn with_output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = Some(output_dir);
        self
    }

    /// Enables or disables writing a weights snapshot at every iteration end.
    pub fn with_snapshots(mut self, enabled: bool) -> Self {
        self.snapshot_every_iteration = enabled;
        self
    }

    /// Returns preference store.
    pub fn store(&self) -> &Arc<DynamicPreferenceStore> {
        &self.store
    }

    /// Returns learner.
    pub fn learner(&self) -> &Arc<PolicyGradientLearner> {
        &self.learner
    }

    /// Returns state tracker.
    pub fn state(&self) -> &StateTracker {
        &self.state
    }

    /// Returns update tracker.
    pub fn tracker(&self) -> &PreferenceUpdateTracker {
        &self.tracker
    }

    /// Returns learning counters of the current iteration.
    pub fn counters(&self) -> LearningCounters {
        self.counters.lock().clone()
    }

    /// Learns from an outcome with known trip times. Reward is derived from event kind and wait time.
    /// Returns applied update or `None` if nothing was learned.
    pub fn observe(
        &self,
        rider_id: &RiderId,
        breakdown: &TimeBreakdown,
        kind: EventKind,
        time: Timestamp,
    ) -> Option<PreferenceUpdateEvent> {
        let reward = match kind {
            EventKind::Acceptance => self.reward_model.scheduling_reward(breakdown.wait),
            EventKind::Rejection => self.reward_model.rejection_penalty(),
            EventKind::Completion => self.reward_model.completion_reward(breakdown.wait),
        };

        self.apply(rider_id, breakdown, reward, kind, time)
    }

    fn apply(
        &self,
        rider_id: &RiderId,
        breakdown: &TimeBreakdown,
        reward: f64,
        kind: EventKind,
        time: Timestamp,
    ) -> Option<PreferenceUpdateEvent> {
        if !self.enabled {
            return None;
        }

        if !self.store.contains(rider_id.as_str()) {
            log::debug!("no weights for rider '{rider_id}', skipping {kind}");
            self.counters.lock().skipped += 1;
            return None;
        }

        let delta = self.learner.learn(rider_id.as_str(), breakdown, reward, kind);
        let Some((old_weights, new_weights)) = self.store.apply_delta(rider_id.as_str(), &delta) else {
            self.counters.lock().skipped += 1;
            return None;
        };

        let event = PreferenceUpdateEvent::new(time, old_weights, new_weights, kind.into(), reward);
        log::debug!("{kind} of rider '{rider_id}': reward {reward:.3}, update magnitude {:.6}", event.magnitude());

        {
            let mut counters = self.counters.lock();
            counters.total_updates += 1;
            counters.total_reward += reward;
            match kind {
                EventKind::Acceptance => counters.acceptance += 1,
                EventKind::Rejection => counters.rejection += 1,
                EventKind::Completion => counters.completion += 1,
            }
        }

        self.tracker.record(event.clone());

        Some(event)
    }

    fn write_outputs(&self, output_dir: &Path, iteration: usize, counters: &LearningCounters) -> PreferenceResult<()> {
        self.write_metrics(output_dir, iteration, counters)?;
        self.state.export_state_actions(output_dir, iteration)?;

        if self.snapshot_every_iteration {
            self.store.persist_iteration(output_dir, iteration)?;
        }

        Ok(())
    }

    fn write_metrics(&self, output_dir: &Path, iteration: usize, counters: &LearningCounters) -> PreferenceResult<()> {
        let statistics = self.learner.statistics();

        create_dirs(output_dir)?;
        append_row(
            &output_dir.join("rl_learning_metrics.csv"),
            LearningMetricsRow {
                iteration,
                total_learning_updates: counters.total_updates,
                acceptance_learning: counters.acceptance,
                rejection_learning: counters.rejection,
                completion_learning: counters.completion,
                total_reward: counters.total_reward,
                avg_reward: counters.average_reward(),
                learning_rate: statistics.current_learning_rate,
                exploration_rate: statistics.current_exploration_rate,
                global_updates: self.store.global_update_count(),
            },
        )
    }
}

impl OutcomeHandler for PreferenceLearningHandler {
    fn on_submitted(&self, rider_id: &RiderId, origin_zone: Option<ZoneId>, time: Timestamp) {
        self.trips.lock().insert(rider_id.clone(), TripRecord { submitted_at: time, wait: None });
        self.state.record_submission(rider_id, origin_zone, time);
    }

    fn on_accepted(&self, rider_id: &RiderId, pickup_time: Timestamp, dropoff_time: Timestamp, time: Timestamp) {
        let wait = {
            let mut trips = self.trips.lock();
            // NOTE a request scheduled without a known submission is assumed to be submitted now
            let record = trips.entry(rider_id.clone()).or_insert(TripRecord { submitted_at: time, wait: None });
            let wait = (pickup_time - record.submitted_at).max(0.);
            record.wait = Some(wait);
            wait
        };

        let reward = self.reward_model.scheduling_reward(wait);
        self.state.add_wait_time(wait);
        self.state.record_scheduled(rider_id, reward, time);

        let breakdown = self.reward_model.acceptance_breakdown(wait, dropoff_time - pickup_time);
        self.apply(rider_id, &breakdown, reward, EventKind::Acceptance, time);
    }

    fn on_rejected(&self, rider_id: &RiderId, time: Timestamp) {
        self.trips.lock().remove(rider_id.as_str());

        let penalty = self.reward_model.rejection_penalty();
        self.state.record_rejection(rider_id, penalty, time);

        let breakdown = self.reward_model.rejection_breakdown();
        self.apply(rider_id, &breakdown, penalty, EventKind::Rejection, time);
    }

    fn on_completed(&self, rider_id: &RiderId, departure_time: Timestamp, dest_zone: Option<ZoneId>, time: Timestamp) {
        let wait = self.trips.lock().remove(rider_id.as_str()).and_then(|record| record.wait).unwrap_or(0.);
        let travel_time = (time - departure_time).max(0.);

        let reward = self.reward_model.completion_reward(wait);
        self.state.record_completion(rider_id, dest_zone, reward, time);

        let breakdown = self.reward_model.completion_breakdown(wait, travel_time);
        self.apply(rider_id, &breakdown, reward, EventKind::Completion, time);
    }

    fn on_iteration_end(&self, iteration: usize) -> PreferenceResult<()> {
        self.learner.update_learning_parameters(iteration);

        let counters = std::mem::take(&mut *self.counters.lock());
        let statistics = self.learner.statistics();

        log::info!(
            "iteration {iteration}: {} learning updates (acceptance: {}, rejection: {}, completion: {}, skipped: {}), \
             total reward {:.3}, avg reward {:.3}, {statistics}, global updates {}",
            counters.total_updates,
            counters.acceptance,
            counters.rejection,
            counters.completion,
            counters.skipped,
            counters.total_reward,
            counters.average_reward(),
            self.store.global_update_count()
        );

        let written = match &self.output_dir {
            Some(output_dir) => self.write_outputs(output_dir, iteration, &counters),
            None => Ok(()),
        };

        // iteration state is reset even when outputs cannot be written, the first error is returned
        let finished = self.tracker.finish_iteration(self.output_dir.as_deref(), iteration).map(|_| ());
        self.state.clear_history();
        self.trips.lock().clear();

        written.and(finished)
    }
}

#[derive(Serialize)]
struct LearningMetricsRow {
    iteration: usize,
    total_learning_updates: usize,
    acceptance_learning: usize,
    rejection_learning: usize,
    completion_learning: usize,
    total_reward: f64,
    avg_reward: f64,
    learning_rate: f64,
    exploration_rate: f64,
    global_updates: usize,
}

impl CsvRow for LearningMetricsRow {
    const HEADER: &'static [&'static str] = &[
        "iteration",
        "total_learning_updates",
        "acceptance_learning",
        "rejection_learning",
        "completion_learning",
        "total_reward",
        "avg_reward",
        "learning_rate",
        "exploration_rate",
        "global_updates",
    ];
}
