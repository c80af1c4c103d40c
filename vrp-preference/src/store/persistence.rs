//! Row layouts of weight snapshots and update history files.

use super::UpdateHistory;
use crate::models::{PreferenceWeights, RiderId};
use crate::utils::CsvRow;
use serde::{Deserialize, Serialize};

/// A single row of a weights file: seed weights or a learned snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct WeightsRow {
    #[serde(alias = "person_id", alias = "user_id")]
    pub id: RiderId,
    pub access: f64,
    pub wait: f64,
    pub ivt: f64,
    pub egress: f64,
    #[serde(default)]
    pub update_count: usize,
}

impl WeightsRow {
    pub fn new(weights: &PreferenceWeights, update_count: usize) -> Self {
        Self {
            id: weights.rider_id.clone(),
            access: weights.access,
            wait: weights.wait,
            ivt: weights.ivt,
            egress: weights.egress,
            update_count,
        }
    }

    /// Converts row into weights, returns `None` if any weight is not a finite number.
    pub fn into_weights(self) -> Option<PreferenceWeights> {
        let weights = PreferenceWeights::new(self.id, self.access, self.wait, self.ivt, self.egress);
        weights.is_finite().then_some(weights)
    }
}

impl CsvRow for WeightsRow {
    const HEADER: &'static [&'static str] = &["id", "access", "wait", "ivt", "egress", "update_count"];
}

/// A single row of an update history export.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct HistoryRow {
    pub person_id: RiderId,
    pub update_count: usize,
    pub total_access_change: f64,
    pub total_wait_change: f64,
    pub total_ivt_change: f64,
    pub total_egress_change: f64,
    pub avg_change_magnitude: f64,
}

impl HistoryRow {
    pub fn new(rider_id: RiderId, history: &UpdateHistory) -> Self {
        Self {
            person_id: rider_id,
            update_count: history.update_count,
            total_access_change: history.total_access_change,
            total_wait_change: history.total_wait_change,
            total_ivt_change: history.total_ivt_change,
            total_egress_change: history.total_egress_change,
            avg_change_magnitude: history.average_change_magnitude(),
        }
    }
}

impl CsvRow for HistoryRow {
    const HEADER: &'static [&'static str] = &[
        "person_id",
        "update_count",
        "total_access_change",
        "total_wait_change",
        "total_ivt_change",
        "total_egress_change",
        "avg_change_magnitude",
    ];
}
