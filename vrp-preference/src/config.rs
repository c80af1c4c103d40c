//! Specifies configuration of the whole personalization layer and logic to read it from json.

#[cfg(test)]
#[path = "../tests/unit/config_test.rs"]
mod config_test;

use crate::cost::CostAdjustmentConfig;
use crate::learning::LearningConfig;
use crate::reward::RewardConfig;
use crate::state::StateTrackerConfig;
use crate::store::StoreConfig;
use crate::utils::{PreferenceError, PreferenceResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Configuration of preference learning and cost adjustment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalizationConfig {
    /// Whether weights are learned from outcomes.
    pub enabled: bool,
    /// Learner hyper parameters.
    pub learning: LearningConfig,
    /// Cost adjustment envelope.
    pub cost: CostAdjustmentConfig,
    /// Reward shaping.
    pub reward: RewardConfig,
    /// Weight bounds.
    pub store: StoreConfig,
    /// System state tracking.
    pub state: StateTrackerConfig,
    /// Directory for per-iteration outputs, nothing is written when absent.
    pub output_dir: Option<PathBuf>,
    /// Whether a weights snapshot is written at every iteration end.
    pub snapshot_every_iteration: bool,
}

impl Default for PersonalizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            learning: LearningConfig::default(),
            cost: CostAdjustmentConfig::default(),
            reward: RewardConfig::default(),
            store: StoreConfig::default(),
            state: StateTrackerConfig::default(),
            output_dir: None,
            snapshot_every_iteration: true,
        }
    }
}

impl PersonalizationConfig {
    /// Checks that all parts of configuration are usable.
    pub fn validate(&self) -> PreferenceResult<()> {
        self.learning.validate()?;
        self.cost.validate()?;
        self.store.validate()?;

        if self.state.history_size == 0 {
            return Err(PreferenceError::InvalidConfig("state history size must be positive".to_string()));
        }

        Ok(())
    }
}

/// Reads and validates configuration from json.
pub fn read_config<R: Read>(reader: BufReader<R>) -> PreferenceResult<PersonalizationConfig> {
    let config: PersonalizationConfig = serde_json::from_reader(reader)?;
    config.validate()?;

    Ok(config)
}

/// Reads and validates configuration from a json file.
pub fn read_config_file(path: &Path) -> PreferenceResult<PersonalizationConfig> {
    let file = File::open(path).map_err(|source| PreferenceError::Io { path: path.to_path_buf(), source })?;

    read_config(BufReader::new(file))
}
