use crate::models::PreferenceWeights;

/// Accumulates statistics about preference updates of a single rider.
///
/// The history is used for diagnostics and export only, it never feeds back into learning.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateHistory {
    /// Amount of applied updates.
    pub update_count: usize,
    /// Cumulative absolute change of the access weight.
    pub total_access_change: f64,
    /// Cumulative absolute change of the wait weight.
    pub total_wait_change: f64,
    /// Cumulative absolute change of the in-vehicle time weight.
    pub total_ivt_change: f64,
    /// Cumulative absolute change of the egress weight.
    pub total_egress_change: f64,
}

impl UpdateHistory {
    /// Records a single transition from old to new weights.
    pub fn record(&mut self, old: &PreferenceWeights, new: &PreferenceWeights) {
        self.update_count += 1;
        self.total_access_change += (new.access - old.access).abs();
        self.total_wait_change += (new.wait - old.wait).abs();
        self.total_ivt_change += (new.ivt - old.ivt).abs();
        self.total_egress_change += (new.egress - old.egress).abs();
    }

    /// Returns mean absolute change per dimension and update.
    pub fn average_change_magnitude(&self) -> f64 {
        if self.update_count == 0 {
            return 0.;
        }

        let total =
            self.total_access_change + self.total_wait_change + self.total_ivt_change + self.total_egress_change;

        total / (4. * self.update_count as f64)
    }
}
