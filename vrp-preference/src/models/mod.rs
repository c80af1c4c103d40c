//! Contains domain models shared by the store, the learner and the cost adjuster.

pub mod common;

mod preference;
pub use self::preference::*;
