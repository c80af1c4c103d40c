#[cfg(test)]
#[path = "../../tests/unit/store/preference_store_test.rs"]
mod preference_store_test;

use super::persistence::WeightsRow;
use crate::models::{PreferenceWeights, RiderId};
use crate::utils::{PreferenceResult, read_rows};
use rustc_hash::FxHashMap;
use std::path::Path;

/// A plain, single-threaded map of rider weights used to seed a run.
#[derive(Clone, Debug, Default)]
pub struct PreferenceStore {
    weights: FxHashMap<RiderId, PreferenceWeights>,
}

impl PreferenceStore {
    /// Creates a new empty instance of `PreferenceStore`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from given weights. Later entries replace earlier ones of the same rider.
    pub fn with_weights(weights: impl IntoIterator<Item = PreferenceWeights>) -> Self {
        weights.into_iter().collect()
    }

    /// Loads seed weights from a headered `id,access,wait,ivt,egress` file.
    /// Malformed rows and rows with non-finite weights are skipped.
    pub fn read_csv(path: &Path) -> PreferenceResult<Self> {
        let rows = read_rows::<WeightsRow>(path)?;
        let total = rows.len();

        let store: Self = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id.clone();
                let weights = row.into_weights();
                if weights.is_none() {
                    log::warn!("skipping non-finite weights of rider '{id}' in {}", path.display());
                }
                weights
            })
            .collect();

        log::info!("loaded weights of {} riders from {} ({total} rows)", store.len(), path.display());

        Ok(store)
    }

    /// Adds or replaces weights of a rider.
    pub fn add(&mut self, weights: PreferenceWeights) {
        self.weights.insert(weights.rider_id.clone(), weights);
    }

    /// Returns weights of a rider if present.
    pub fn get(&self, rider_id: &str) -> Option<&PreferenceWeights> {
        self.weights.get(rider_id)
    }

    /// Checks whether rider has weights.
    pub fn contains(&self, rider_id: &str) -> bool {
        self.weights.contains_key(rider_id)
    }

    /// Returns amount of riders.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Returns true if store has no riders.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Returns ids of all riders in no particular order.
    pub fn rider_ids(&self) -> impl Iterator<Item = &RiderId> + '_ {
        self.weights.keys()
    }

    /// Iterates over all weights in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &PreferenceWeights> + '_ {
        self.weights.values()
    }
}

impl FromIterator<PreferenceWeights> for PreferenceStore {
    fn from_iter<T: IntoIterator<Item = PreferenceWeights>>(iter: T) -> Self {
        let mut store = Self::new();
        iter.into_iter().for_each(|weights| store.add(weights));
        store
    }
}

impl IntoIterator for PreferenceStore {
    type Item = PreferenceWeights;
    type IntoIter = std::collections::hash_map::IntoValues<RiderId, PreferenceWeights>;

    fn into_iter(self) -> Self::IntoIter {
        self.weights.into_values()
    }
}
