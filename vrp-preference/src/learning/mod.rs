//! Online learning of rider weights from observed outcomes.
//!
//! The [`PolicyGradientLearner`] treats the acceptance probability of a trip as a logistic function
//! of its utility and nudges weights with a REINFORCE-style gradient. It only produces
//! [`WeightDelta`](crate::models::WeightDelta) values, applying them is up to the caller.

mod config;
pub use self::config::LearningConfig;

mod experience;
pub use self::experience::{EventKind, LearningExperience};

mod policy_gradient;
pub use self::policy_gradient::{LearningStatistics, PolicyGradientLearner};
