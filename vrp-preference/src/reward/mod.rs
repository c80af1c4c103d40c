//! Converts service outcomes into scalar learning rewards.

mod reward_model;
pub use self::reward_model::{RewardConfig, RewardModel};
