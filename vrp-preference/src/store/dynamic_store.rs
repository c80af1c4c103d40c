#[cfg(test)]
#[path = "../../tests/unit/store/dynamic_store_test.rs"]
mod dynamic_store_test;

use super::persistence::{HistoryRow, WeightsRow};
use super::{PreferenceStore, StoreConfig, UpdateHistory};
use crate::models::{PreferenceWeights, RiderId, WeightDelta};
use crate::utils::{PreferenceResult, create_dirs, read_rows, write_rows};
use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

struct RiderEntry {
    weights: PreferenceWeights,
    history: UpdateHistory,
}

/// A thread-safe store of rider weights which is mutated by online learning.
///
/// The rider map is guarded by an outer lock which is taken for writing only when riders are
/// inserted or restored. Each rider entry has its own lock, so an update of one rider never
/// blocks readers or writers of another one. Every write is bounded by [`StoreConfig`].
pub struct DynamicPreferenceStore {
    config: StoreConfig,
    riders: RwLock<FxHashMap<RiderId, RwLock<RiderEntry>>>,
    global_updates: AtomicUsize,
}

impl DynamicPreferenceStore {
    /// Creates a new empty instance of `DynamicPreferenceStore`.
    pub fn new(config: StoreConfig) -> Self {
        Self { config, riders: RwLock::new(FxHashMap::default()), global_updates: AtomicUsize::new(0) }
    }

    /// Creates a store seeded with weights from a plain store. Seed weights are clamped to bounds.
    pub fn from_store(store: PreferenceStore, config: StoreConfig) -> Self {
        let dynamic = Self::new(config);
        {
            let mut riders = dynamic.riders.write();
            riders.extend(store.into_iter().map(|weights| {
                let weights = dynamic.config.clamp(weights);
                (weights.rider_id.clone(), RwLock::new(RiderEntry { weights, history: UpdateHistory::default() }))
            }));
        }

        dynamic
    }

    /// Returns bounds enforced on every write.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Inserts or replaces weights of a rider, resetting its update history.
    pub fn insert(&self, weights: PreferenceWeights) {
        let weights = self.config.clamp(weights);
        let rider_id = weights.rider_id.clone();
        let entry = RwLock::new(RiderEntry { weights, history: UpdateHistory::default() });

        self.riders.write().insert(rider_id, entry);
    }

    /// Returns a copy of rider weights if rider is known.
    pub fn get(&self, rider_id: &str) -> Option<PreferenceWeights> {
        self.riders.read().get(rider_id).map(|entry| entry.read().weights.clone())
    }

    /// Checks whether rider is known.
    pub fn contains(&self, rider_id: &str) -> bool {
        self.riders.read().contains_key(rider_id)
    }

    /// Applies a bounded delta to rider weights. Returns false and changes nothing for an unknown rider.
    pub fn update(&self, rider_id: &str, delta: &WeightDelta) -> bool {
        self.apply_delta(rider_id, delta).is_some()
    }

    /// Applies a bounded delta to rider weights and returns weights before and after the change.
    /// Returns `None` and changes nothing for an unknown rider.
    pub fn apply_delta(&self, rider_id: &str, delta: &WeightDelta) -> Option<(PreferenceWeights, PreferenceWeights)> {
        let riders = self.riders.read();
        let mut entry = riders.get(rider_id)?.write();

        let updated = self.config.apply(&entry.weights, delta);
        let RiderEntry { weights, history } = &mut *entry;
        history.record(weights, &updated);
        let previous = std::mem::replace(weights, updated.clone());

        self.global_updates.fetch_add(1, Ordering::Relaxed);

        Some((previous, updated))
    }

    /// Applies deltas of many riders in parallel. There is no atomicity across riders.
    /// Returns amount of successful updates, unknown riders are skipped.
    pub fn batch_update(&self, deltas: &FxHashMap<RiderId, WeightDelta>) -> usize {
        deltas.par_iter().filter(|(rider_id, delta)| self.update(rider_id.as_str(), delta)).count()
    }

    /// Returns a copy of rider update history.
    pub fn history(&self, rider_id: &str) -> Option<UpdateHistory> {
        self.riders.read().get(rider_id).map(|entry| entry.read().history.clone())
    }

    /// Returns total amount of applied updates since creation.
    pub fn global_update_count(&self) -> usize {
        self.global_updates.load(Ordering::Relaxed)
    }

    /// Returns amount of known riders.
    pub fn len(&self) -> usize {
        self.riders.read().len()
    }

    /// Returns true if there are no riders.
    pub fn is_empty(&self) -> bool {
        self.riders.read().is_empty()
    }

    /// Returns sorted ids of all known riders.
    pub fn rider_ids(&self) -> Vec<RiderId> {
        let mut ids = self.riders.read().keys().cloned().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    /// Writes weights of all riders, sorted by id. Riders cannot be inserted while snapshot is written.
    /// Returns amount of written riders.
    pub fn snapshot(&self, path: &Path) -> PreferenceResult<usize> {
        let riders = self.riders.read();

        let mut rows = riders
            .values()
            .map(|entry| {
                let entry = entry.read();
                WeightsRow::new(&entry.weights, entry.history.update_count)
            })
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| a.id.cmp(&b.id));

        let count = write_rows(path, rows)?;
        log::info!("saved weights of {count} riders to {}", path.display());

        Ok(count)
    }

    /// Replaces or creates weights of every rider listed in a snapshot file, other riders stay untouched.
    /// Restored weights are clamped to bounds, rows with non-finite weights are skipped.
    /// Returns amount of restored riders.
    pub fn restore(&self, path: &Path) -> PreferenceResult<usize> {
        let entries = read_rows::<WeightsRow>(path)?
            .into_iter()
            .filter_map(|row| {
                let id = row.id.clone();
                let weights = row.into_weights();
                if weights.is_none() {
                    log::warn!("skipping non-finite weights of rider '{id}' in {}", path.display());
                }
                weights
            })
            .map(|weights| self.config.clamp(weights))
            .collect::<Vec<_>>();

        let count = entries.len();
        {
            let mut riders = self.riders.write();
            entries.into_iter().for_each(|weights| match riders.get_mut(weights.rider_id.as_str()) {
                Some(entry) => entry.get_mut().weights = weights,
                None => {
                    let rider_id = weights.rider_id.clone();
                    riders.insert(rider_id, RwLock::new(RiderEntry { weights, history: UpdateHistory::default() }));
                }
            });
        }

        log::info!("restored weights of {count} riders from {}", path.display());

        Ok(count)
    }

    /// Writes update history of all riders, sorted by id. Returns amount of written riders.
    pub fn export_history(&self, path: &Path) -> PreferenceResult<usize> {
        let riders = self.riders.read();

        let mut rows = riders
            .iter()
            .map(|(rider_id, entry)| HistoryRow::new(rider_id.clone(), &entry.read().history))
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| a.person_id.cmp(&b.person_id));

        write_rows(path, rows)
    }

    /// Writes a snapshot named `learned_preferences_iter_<n>.csv` into the output directory,
    /// creating it when needed. Returns path of the written file.
    pub fn persist_iteration(&self, output_dir: &Path, iteration: usize) -> PreferenceResult<PathBuf> {
        create_dirs(output_dir)?;

        let path = output_dir.join(format!("learned_preferences_iter_{iteration}.csv"));
        self.snapshot(&path)?;

        Ok(path)
    }
}
