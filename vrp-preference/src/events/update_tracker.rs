#[cfg(test)]
#[path = "../../tests/unit/events/update_tracker_test.rs"]
mod update_tracker_test;

use super::{PreferenceUpdateEvent, UpdateReason};
use crate::models::RiderId;
use crate::utils::{CsvRow, PreferenceResult, append_row, create_dirs, write_rows};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Aggregated statistics of preference updates within an iteration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreferenceLearningStats {
    /// Amount of updates.
    pub total_updates: usize,
    /// Amount of distinct updated riders.
    pub unique_riders: usize,
    /// Sum of raw rewards.
    pub total_reward: f64,
    /// Sum of update magnitudes.
    pub total_magnitude: f64,
    /// Amount of updates per reason.
    pub reason_counts: BTreeMap<UpdateReason, usize>,
}

impl PreferenceLearningStats {
    /// Returns mean reward per update.
    pub fn average_reward(&self) -> f64 {
        if self.total_updates > 0 { self.total_reward / self.total_updates as f64 } else { 0. }
    }

    /// Returns mean magnitude per update.
    pub fn average_magnitude(&self) -> f64 {
        if self.total_updates > 0 { self.total_magnitude / self.total_updates as f64 } else { 0. }
    }
}

/// Collects preference update events of an iteration and writes them at iteration end.
#[derive(Default)]
pub struct PreferenceUpdateTracker {
    events: Mutex<Vec<PreferenceUpdateEvent>>,
}

impl PreferenceUpdateTracker {
    /// Creates a new instance of `PreferenceUpdateTracker`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an update event.
    pub fn record(&self, event: PreferenceUpdateEvent) {
        self.events.lock().push(event);
    }

    /// Returns statistics of events recorded so far.
    pub fn stats(&self) -> PreferenceLearningStats {
        collect_stats(&self.events.lock())
    }

    /// Returns a copy of recorded events.
    pub fn events(&self) -> Vec<PreferenceUpdateEvent> {
        self.events.lock().clone()
    }

    /// Finishes an iteration: logs a summary, writes update logs into the output directory if it is
    /// specified and clears recorded events. Returns statistics of the finished iteration.
    ///
    /// Written files are `preference_updates_iter_<n>.csv`, `preference_person_stats_iter_<n>.csv`
    /// and a row appended to `preference_learning_summary.csv`.
    pub fn finish_iteration(
        &self,
        output_dir: Option<&Path>,
        iteration: usize,
    ) -> PreferenceResult<PreferenceLearningStats> {
        let events = std::mem::take(&mut *self.events.lock());
        let stats = collect_stats(&events);

        log_summary(&stats, iteration);

        if let Some(output_dir) = output_dir {
            create_dirs(output_dir)?;

            write_rows(
                &output_dir.join(format!("preference_updates_iter_{iteration}.csv")),
                events.iter().map(UpdateRow::from),
            )?;

            append_row(
                &output_dir.join("preference_learning_summary.csv"),
                SummaryRow {
                    iteration,
                    total_updates: stats.total_updates,
                    unique_persons_updated: stats.unique_riders,
                    avg_reward: stats.average_reward(),
                    avg_update_magnitude: stats.average_magnitude(),
                    total_reward: stats.total_reward,
                    total_magnitude: stats.total_magnitude,
                },
            )?;

            write_rows(
                &output_dir.join(format!("preference_person_stats_iter_{iteration}.csv")),
                person_stats(&events),
            )?;
        }

        Ok(stats)
    }
}

fn collect_stats(events: &[PreferenceUpdateEvent]) -> PreferenceLearningStats {
    let mut reason_counts = BTreeMap::new();
    events.iter().for_each(|event| *reason_counts.entry(event.reason).or_insert(0) += 1);

    let unique_riders = events.iter().map(|event| event.rider_id()).collect::<FxHashSet<_>>().len();

    PreferenceLearningStats {
        total_updates: events.len(),
        unique_riders,
        total_reward: events.iter().map(|event| event.reward).sum(),
        total_magnitude: events.iter().map(|event| event.magnitude()).sum(),
        reason_counts,
    }
}

fn log_summary(stats: &PreferenceLearningStats, iteration: usize) {
    log::info!(
        "iteration {iteration}: {} preference updates of {} riders, avg reward {:.4}, avg magnitude {:.4}",
        stats.total_updates,
        stats.unique_riders,
        stats.average_reward(),
        stats.average_magnitude()
    );

    stats.reason_counts.iter().for_each(|(reason, count)| {
        log::info!("  {reason}: {count} ({:.1}%)", 100. * *count as f64 / stats.total_updates.max(1) as f64);
    });
}

fn person_stats(events: &[PreferenceUpdateEvent]) -> Vec<PersonStatsRow> {
    let mut by_rider: FxHashMap<&RiderId, Vec<&PreferenceUpdateEvent>> = FxHashMap::default();
    events.iter().for_each(|event| by_rider.entry(event.rider_id()).or_default().push(event));

    let mut rows = by_rider
        .into_iter()
        .filter_map(|(rider_id, updates)| {
            let last = updates.last()?;
            let count = updates.len();
            let total_reward: f64 = updates.iter().map(|event| event.reward).sum();
            let total_magnitude: f64 = updates.iter().map(|event| event.magnitude()).sum();

            Some(PersonStatsRow {
                person_id: rider_id.clone(),
                num_updates: count,
                total_reward,
                avg_reward: total_reward / count as f64,
                total_magnitude,
                avg_magnitude: total_magnitude / count as f64,
                final_access: last.new_weights.access,
                final_wait: last.new_weights.wait,
                final_ivt: last.new_weights.ivt,
                final_egress: last.new_weights.egress,
            })
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| a.person_id.cmp(&b.person_id));

    rows
}

#[derive(Serialize)]
struct UpdateRow {
    time: f64,
    person_id: RiderId,
    old_access: f64,
    old_wait: f64,
    old_ivt: f64,
    old_egress: f64,
    new_access: f64,
    new_wait: f64,
    new_ivt: f64,
    new_egress: f64,
    delta_access: f64,
    delta_wait: f64,
    delta_ivt: f64,
    delta_egress: f64,
    update_reason: UpdateReason,
    learning_reward: f64,
    update_magnitude: f64,
}

impl From<&PreferenceUpdateEvent> for UpdateRow {
    fn from(event: &PreferenceUpdateEvent) -> Self {
        let (old, new, delta) = (&event.old_weights, &event.new_weights, event.deltas());

        Self {
            time: event.time,
            person_id: event.rider_id().clone(),
            old_access: old.access,
            old_wait: old.wait,
            old_ivt: old.ivt,
            old_egress: old.egress,
            new_access: new.access,
            new_wait: new.wait,
            new_ivt: new.ivt,
            new_egress: new.egress,
            delta_access: delta.access,
            delta_wait: delta.wait,
            delta_ivt: delta.ivt,
            delta_egress: delta.egress,
            update_reason: event.reason,
            learning_reward: event.reward,
            update_magnitude: delta.l1_norm(),
        }
    }
}

impl CsvRow for UpdateRow {
    const HEADER: &'static [&'static str] = &[
        "time",
        "person_id",
        "old_access",
        "old_wait",
        "old_ivt",
        "old_egress",
        "new_access",
        "new_wait",
        "new_ivt",
        "new_egress",
        "delta_access",
        "delta_wait",
        "delta_ivt",
        "delta_egress",
        "update_reason",
        "learning_reward",
        "update_magnitude",
    ];
}

#[derive(Serialize)]
struct SummaryRow {
    iteration: usize,
    total_updates: usize,
    unique_persons_updated: usize,
    avg_reward: f64,
    avg_update_magnitude: f64,
    total_reward: f64,
    total_magnitude: f64,
}

impl CsvRow for SummaryRow {
    const HEADER: &'static [&'static str] = &[
        "iteration",
        "total_updates",
        "unique_persons_updated",
        "avg_reward",
        "avg_update_magnitude",
        "total_reward",
        "total_magnitude",
    ];
}

#[derive(Serialize)]
struct PersonStatsRow {
    person_id: RiderId,
    num_updates: usize,
    total_reward: f64,
    avg_reward: f64,
    total_magnitude: f64,
    avg_magnitude: f64,
    final_access: f64,
    final_wait: f64,
    final_ivt: f64,
    final_egress: f64,
}

impl CsvRow for PersonStatsRow {
    const HEADER: &'static [&'static str] = &[
        "person_id",
        "num_updates",
        "total_reward",
        "avg_reward",
        "total_magnitude",
        "avg_magnitude",
        "final_access",
        "final_wait",
        "final_ivt",
        "final_egress",
    ];
}
