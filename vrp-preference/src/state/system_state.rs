#[cfg(test)]
#[path = "../../tests/unit/state/system_state_test.rs"]
mod system_state_test;

use crate::models::common::{Duration, Timestamp};

/// A zone identifier used to track spatial demand.
pub type ZoneId = u32;

/// Names of the normalized features returned by [`SystemState::features`].
pub const FEATURE_NAMES: [&str; 10] = [
    "active_requests_norm",
    "available_vehicles_norm",
    "busy_vehicles_norm",
    "avg_wait_time_norm",
    "recent_rejections_norm",
    "system_load",
    "hour_of_day_norm",
    "is_rush_hour",
    "dominant_origin_zone_norm",
    "dominant_dest_zone_norm",
];

const MAX_ZONE: f64 = 72.;

/// A point-in-time snapshot of the system.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemState {
    /// Simulation time of the snapshot.
    pub time: Timestamp,
    /// Amount of submitted, not yet answered requests.
    pub active_requests: usize,
    /// Amount of idle vehicles.
    pub available_vehicles: usize,
    /// Amount of vehicles serving trips.
    pub busy_vehicles: usize,
    /// Average of recent wait times.
    pub avg_wait_time: Duration,
    /// Amount of rejections among recent outcomes.
    pub recent_rejections: usize,
    /// Most frequent recent origin zone.
    pub dominant_origin_zone: ZoneId,
    /// Most frequent recent destination zone.
    pub dominant_dest_zone: ZoneId,
}

impl SystemState {
    /// Returns ratio of active requests to fleet size. An empty fleet counts as a single vehicle.
    pub fn system_load(&self) -> f64 {
        let fleet = (self.available_vehicles + self.busy_vehicles).max(1);
        self.active_requests as f64 / fleet as f64
    }

    /// Returns hour of day in `[0, 24)`.
    pub fn hour_of_day(&self) -> u32 {
        if self.time.is_finite() { (self.time / 3600.).floor().rem_euclid(24.) as u32 } else { 0 }
    }

    /// Returns true for morning (7-9) and evening (17-19) peak hours.
    pub fn is_rush_hour(&self) -> bool {
        matches!(self.hour_of_day(), 7..=9 | 17..=19)
    }

    /// Returns features normalized to `[0, 1]` in [`FEATURE_NAMES`] order.
    pub fn features(&self) -> [f64; 10] {
        let ratio = |value: f64, max: f64| (value / max).min(1.);

        [
            ratio(self.active_requests as f64, 50.),
            ratio(self.available_vehicles as f64, 20.),
            ratio(self.busy_vehicles as f64, 20.),
            ratio(self.avg_wait_time.max(0.), 600.),
            ratio(self.recent_rejections as f64, 10.),
            self.system_load().min(1.),
            self.hour_of_day() as f64 / 24.,
            if self.is_rush_hour() { 1. } else { 0. },
            ratio(self.dominant_origin_zone as f64, MAX_ZONE),
            ratio(self.dominant_dest_zone as f64, MAX_ZONE),
        ]
    }

    /// Returns discrete state id in `[0, 30)` built from load, rush hour and rejection bins.
    pub fn discrete_id(&self) -> usize {
        let load_bin = ((self.system_load() * 5.) as usize).min(4);
        let rush_bin = usize::from(self.is_rush_hour());
        let rejection_bin = (self.recent_rejections / 3).min(2);

        load_bin * 6 + rush_bin * 3 + rejection_bin
    }
}
