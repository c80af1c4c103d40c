#[cfg(test)]
#[path = "../../tests/unit/state/state_tracker_test.rs"]
mod state_tracker_test;

use super::{FEATURE_NAMES, SystemState, ZoneId};
use crate::models::RiderId;
use crate::models::common::{Duration, Timestamp};
use crate::utils::{CsvRow, PreferenceResult, create_dirs, write_rows};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Specifies state tracking parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateTrackerConfig {
    /// Length of rolling windows of wait times and request outcomes.
    pub history_size: usize,
    /// Minimum time between two recomputations of the state on query.
    pub update_interval: Duration,
    /// Amount of available vehicles at start.
    pub initial_fleet_size: usize,
    /// Zone reported when no zone was observed yet.
    pub default_zone: ZoneId,
}

impl Default for StateTrackerConfig {
    fn default() -> Self {
        Self { history_size: 20, update_interval: 300., initial_fleet_size: 10, default_zone: 1 }
    }
}

/// An observed action of the dispatcher or a rider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateAction {
    /// Request was submitted.
    RequestSubmitted,
    /// Request was scheduled.
    RequestScheduled,
    /// Request was rejected.
    RequestRejected,
    /// Trip was completed.
    TripCompleted,
}

impl Display for StateAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StateAction::RequestSubmitted => "REQUEST_SUBMITTED",
            StateAction::RequestScheduled => "REQUEST_SCHEDULED",
            StateAction::RequestRejected => "REQUEST_REJECTED",
            StateAction::TripCompleted => "TRIP_COMPLETED",
        })
    }
}

/// A state observed together with an action and its reward.
#[derive(Clone, Debug, PartialEq)]
pub struct StateActionRecord {
    /// Rider involved in the action.
    pub rider_id: RiderId,
    /// State observed before the action.
    pub state: SystemState,
    /// Action kind.
    pub action: StateAction,
    /// Reward of the action, zero for submissions.
    pub reward: f64,
    /// Simulation time of the action.
    pub time: Timestamp,
}

/// Raw system counters.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemMetrics {
    /// Amount of submitted, not yet answered requests.
    pub active_requests: usize,
    /// Amount of idle vehicles.
    pub available_vehicles: usize,
    /// Amount of vehicles serving trips.
    pub busy_vehicles: usize,
    /// Average of recent wait times.
    pub average_wait_time: Duration,
    /// Amount of rejections among recent outcomes.
    pub recent_rejections: usize,
}

impl Display for SystemMetrics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "active={}, available={}, busy={}, avg wait={:.1}, rejections={}",
            self.active_requests,
            self.available_vehicles,
            self.busy_vehicles,
            self.average_wait_time,
            self.recent_rejections
        )
    }
}

struct TrackerState {
    current: SystemState,
    last_update: Timestamp,
    active_requests: usize,
    available_vehicles: usize,
    busy_vehicles: usize,
    wait_times: VecDeque<Duration>,
    outcomes: VecDeque<bool>,
    origin_zones: FxHashMap<ZoneId, usize>,
    dest_zones: FxHashMap<ZoneId, usize>,
    history: Vec<StateActionRecord>,
    rider_history: FxHashMap<RiderId, Vec<StateActionRecord>>,
}

/// Tracks system load from dispatcher events and keeps a log of observed state-action pairs.
pub struct StateTracker {
    config: StateTrackerConfig,
    inner: Mutex<TrackerState>,
}

impl StateTracker {
    /// Creates a new instance of `StateTracker`.
    pub fn new(config: StateTrackerConfig) -> Self {
        let current = SystemState {
            time: 0.,
            active_requests: 0,
            available_vehicles: config.initial_fleet_size,
            busy_vehicles: 0,
            avg_wait_time: 0.,
            recent_rejections: 0,
            dominant_origin_zone: config.default_zone,
            dominant_dest_zone: config.default_zone,
        };

        let inner = TrackerState {
            current,
            last_update: 0.,
            active_requests: 0,
            available_vehicles: config.initial_fleet_size,
            busy_vehicles: 0,
            wait_times: VecDeque::with_capacity(config.history_size + 1),
            outcomes: VecDeque::with_capacity(config.history_size + 1),
            origin_zones: FxHashMap::default(),
            dest_zones: FxHashMap::default(),
            history: Vec::new(),
            rider_history: FxHashMap::default(),
        };

        Self { config, inner: Mutex::new(inner) }
    }

    /// Returns system state, recomputing it when update interval has passed since the last recomputation.
    pub fn current_state(&self, time: Timestamp) -> SystemState {
        let mut inner = self.inner.lock();

        if time - inner.last_update >= self.config.update_interval {
            self.refresh(&mut *inner, time);
        }

        inner.current.clone()
    }

    /// Records a submitted request.
    pub fn record_submission(&self, rider_id: &RiderId, origin_zone: Option<ZoneId>, time: Timestamp) {
        self.record(rider_id, StateAction::RequestSubmitted, 0., time, |inner| {
            inner.active_requests += 1;
            let zone = origin_zone.unwrap_or(self.config.default_zone);
            *inner.origin_zones.entry(zone).or_insert(0) += 1;
        });
    }

    /// Records a scheduled request: a vehicle becomes busy.
    pub fn record_scheduled(&self, rider_id: &RiderId, reward: f64, time: Timestamp) {
        self.record(rider_id, StateAction::RequestScheduled, reward, time, |inner| {
            inner.active_requests = inner.active_requests.saturating_sub(1);
            inner.busy_vehicles += 1;
            inner.available_vehicles = inner.available_vehicles.saturating_sub(1);
            push_bounded(&mut inner.outcomes, false, self.config.history_size);
        });
    }

    /// Records a rejected request.
    pub fn record_rejection(&self, rider_id: &RiderId, penalty: f64, time: Timestamp) {
        self.record(rider_id, StateAction::RequestRejected, penalty, time, |inner| {
            inner.active_requests = inner.active_requests.saturating_sub(1);
            push_bounded(&mut inner.outcomes, true, self.config.history_size);
        });
    }

    /// Records a completed trip: a vehicle becomes available again.
    pub fn record_completion(&self, rider_id: &RiderId, dest_zone: Option<ZoneId>, reward: f64, time: Timestamp) {
        self.record(rider_id, StateAction::TripCompleted, reward, time, |inner| {
            inner.busy_vehicles = inner.busy_vehicles.saturating_sub(1);
            inner.available_vehicles += 1;
            let zone = dest_zone.unwrap_or(self.config.default_zone);
            *inner.dest_zones.entry(zone).or_insert(0) += 1;
        });
    }

    /// Adds an observed wait time to the rolling window. Non-finite values are ignored.
    pub fn add_wait_time(&self, wait: Duration) {
        if wait.is_finite() {
            push_bounded(&mut self.inner.lock().wait_times, wait.max(0.), self.config.history_size);
        }
    }

    /// Returns raw system counters.
    pub fn metrics(&self) -> SystemMetrics {
        let inner = self.inner.lock();

        SystemMetrics {
            active_requests: inner.active_requests,
            available_vehicles: inner.available_vehicles,
            busy_vehicles: inner.busy_vehicles,
            average_wait_time: average(&inner.wait_times),
            recent_rejections: inner.outcomes.iter().filter(|rejected| **rejected).count(),
        }
    }

    /// Returns all records of a rider.
    pub fn rider_history(&self, rider_id: &str) -> Vec<StateActionRecord> {
        self.inner.lock().rider_history.get(rider_id).cloned().unwrap_or_default()
    }

    /// Returns all records in observation order.
    pub fn history(&self) -> Vec<StateActionRecord> {
        self.inner.lock().history.clone()
    }

    /// Clears recorded state-action pairs and zone frequencies. Counters and rolling windows are kept.
    pub fn clear_history(&self) {
        let mut inner = self.inner.lock();
        inner.history.clear();
        inner.rider_history.clear();
        inner.origin_zones.clear();
        inner.dest_zones.clear();
    }

    /// Writes all records to `rl_state_action_<n>.csv` in the output directory. Returns path of the file.
    pub fn export_state_actions(&self, output_dir: &Path, iteration: usize) -> PreferenceResult<PathBuf> {
        create_dirs(output_dir)?;

        let path = output_dir.join(format!("rl_state_action_{iteration}.csv"));
        let rows = self.inner.lock().history.iter().map(StateActionRow::from).collect::<Vec<_>>();

        let count = write_rows(&path, rows)?;
        log::info!("exported {count} state-action records to {}", path.display());

        Ok(path)
    }

    fn record(
        &self,
        rider_id: &RiderId,
        action: StateAction,
        reward: f64,
        time: Timestamp,
        update: impl FnOnce(&mut TrackerState),
    ) {
        let mut inner = self.inner.lock();

        let state = inner.current.clone();
        let record = StateActionRecord { rider_id: rider_id.clone(), state, action, reward, time };
        inner.rider_history.entry(rider_id.clone()).or_default().push(record.clone());
        inner.history.push(record);

        update(&mut *inner);
        self.refresh(&mut *inner, time);
    }

    fn refresh(&self, inner: &mut TrackerState, time: Timestamp) {
        inner.current = SystemState {
            time,
            active_requests: inner.active_requests,
            available_vehicles: inner.available_vehicles,
            busy_vehicles: inner.busy_vehicles,
            avg_wait_time: average(&inner.wait_times),
            recent_rejections: inner.outcomes.iter().filter(|rejected| **rejected).count(),
            dominant_origin_zone: dominant_zone(&inner.origin_zones).unwrap_or(self.config.default_zone),
            dominant_dest_zone: dominant_zone(&inner.dest_zones).unwrap_or(self.config.default_zone),
        };
        inner.last_update = time;
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new(StateTrackerConfig::default())
    }
}

fn push_bounded<T>(window: &mut VecDeque<T>, value: T, size: usize) {
    window.push_back(value);
    while window.len() > size {
        window.pop_front();
    }
}

fn average(values: &VecDeque<Duration>) -> Duration {
    if values.is_empty() { 0. } else { values.iter().sum::<Duration>() / values.len() as f64 }
}

/// Returns the most frequent zone, ties are resolved in favor of the smaller zone id.
fn dominant_zone(zones: &FxHashMap<ZoneId, usize>) -> Option<ZoneId> {
    zones
        .iter()
        .max_by(|(a_zone, a_count), (b_zone, b_count)| a_count.cmp(b_count).then(b_zone.cmp(a_zone)))
        .map(|(zone, _)| *zone)
}

#[derive(Serialize)]
struct StateActionRow {
    person_id: RiderId,
    time: Timestamp,
    action: StateAction,
    reward: f64,
    active_requests_norm: f64,
    available_vehicles_norm: f64,
    busy_vehicles_norm: f64,
    avg_wait_time_norm: f64,
    recent_rejections_norm: f64,
    system_load: f64,
    hour_of_day_norm: f64,
    is_rush_hour: f64,
    dominant_origin_zone_norm: f64,
    dominant_dest_zone_norm: f64,
}

impl From<&StateActionRecord> for StateActionRow {
    fn from(record: &StateActionRecord) -> Self {
        let [
            active_requests_norm,
            available_vehicles_norm,
            busy_vehicles_norm,
            avg_wait_time_norm,
            recent_rejections_norm,
            system_load,
            hour_of_day_norm,
            is_rush_hour,
            dominant_origin_zone_norm,
            dominant_dest_zone_norm,
        ] = record.state.features();

        Self {
            person_id: record.rider_id.clone(),
            time: record.time,
            action: record.action,
            reward: record.reward,
            active_requests_norm,
            available_vehicles_norm,
            busy_vehicles_norm,
            avg_wait_time_norm,
            recent_rejections_norm,
            system_load,
            hour_of_day_norm,
            is_rush_hour,
            dominant_origin_zone_norm,
            dominant_dest_zone_norm,
        }
    }
}

impl CsvRow for StateActionRow {
    const HEADER: &'static [&'static str] = &[
        "person_id",
        "time",
        "action",
        "reward",
        FEATURE_NAMES[0],
        FEATURE_NAMES[1],
        FEATURE_NAMES[2],
        FEATURE_NAMES[3],
        FEATURE_NAMES[4],
        FEATURE_NAMES[5],
        FEATURE_NAMES[6],
        FEATURE_NAMES[7],
        FEATURE_NAMES[8],
        FEATURE_NAMES[9],
    ];
}
