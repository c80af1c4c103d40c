#[cfg(test)]
#[path = "../../tests/unit/learning/policy_gradient_test.rs"]
mod policy_gradient_test;

use super::{EventKind, LearningConfig, LearningExperience};
use crate::models::common::WEIGHT_DIMENSIONS;
use crate::models::{PreferenceWeights, RiderId, TimeBreakdown, WeightDelta};
use crate::store::DynamicPreferenceStore;
use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use rustc_hash::FxHashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

type Gradient = [f64; WEIGHT_DIMENSIONS];

#[derive(Default)]
struct RiderState {
    momentum: Gradient,
    buffer: Vec<LearningExperience>,
}

/// A snapshot of learner progress.
#[derive(Clone, Debug, PartialEq)]
pub struct LearningStatistics {
    /// Amount of produced deltas.
    pub total_updates: usize,
    /// Iteration used to decay learning and exploration rates.
    pub current_iteration: usize,
    /// Learning rate at current iteration.
    pub current_learning_rate: f64,
    /// Exploration rate at current iteration.
    pub current_exploration_rate: f64,
    /// Amount of riders with learner state.
    pub active_riders: usize,
    /// Amount of experiences waiting for a batch update.
    pub buffered_experiences: usize,
}

impl Display for LearningStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "updates={}, iteration={}, lr={:.6}, exploration={:.4}, riders={}, buffered={}",
            self.total_updates,
            self.current_iteration,
            self.current_learning_rate,
            self.current_exploration_rate,
            self.active_riders,
            self.buffered_experiences
        )
    }
}

/// Learns rider weights with a REINFORCE-style policy gradient.
///
/// Probability of accepting a trip is modeled as `sigmoid(utility / temperature)`. A positive reward
/// moves weights along normalized trip times scaled by `reward × (1 - p)`, a negative one by
/// `-reward × p`. The gradient is smoothed with momentum, clipped, scaled by a decaying learning rate
/// and optionally perturbed by seeded gaussian noise.
///
/// The learner reads current weights from the store but never writes them: every method returns a
/// [`WeightDelta`] which has to be applied by the caller, usually via [`DynamicPreferenceStore::update`].
pub struct PolicyGradientLearner {
    config: LearningConfig,
    store: Arc<DynamicPreferenceStore>,
    riders: RwLock<FxHashMap<RiderId, Mutex<RiderState>>>,
    random: Mutex<StdRng>,
    iteration: AtomicUsize,
    total_updates: AtomicUsize,
}

impl PolicyGradientLearner {
    /// Creates a new instance of `PolicyGradientLearner`.
    pub fn new(store: Arc<DynamicPreferenceStore>, config: LearningConfig) -> Self {
        let random = Mutex::new(StdRng::seed_from_u64(config.seed));

        Self {
            config,
            store,
            riders: RwLock::new(FxHashMap::default()),
            random,
            iteration: AtomicUsize::new(0),
            total_updates: AtomicUsize::new(0),
        }
    }

    /// Returns learner configuration.
    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Produces a weight delta from a single outcome. Reward is scaled according to event kind.
    ///
    /// An unknown rider gets a zero delta with optional exploration noise. An invalid breakdown or a
    /// non-finite reward results in a zero delta.
    pub fn learn(&self, rider_id: &str, breakdown: &TimeBreakdown, reward: f64, kind: EventKind) -> WeightDelta {
        if let Err(err) = breakdown.validate() {
            log::warn!("cannot learn from {kind} of rider '{rider_id}': {err}");
            return WeightDelta::zero();
        }

        if !reward.is_finite() {
            log::warn!("cannot learn from {kind} of rider '{rider_id}': reward {reward} is not finite");
            return WeightDelta::zero();
        }

        let Some(weights) = self.store.get(rider_id) else {
            log::debug!("no weights for rider '{rider_id}', only exploration is applied");
            return self.finalize([0.; WEIGHT_DIMENSIONS]);
        };

        let reward = kind.scale_reward(reward, &self.config);
        let gradient = policy_gradient(&weights, breakdown, reward, &self.config);
        let delta = self.step(&weights.rider_id, gradient);

        log::debug!("{kind} of rider '{rider_id}' with reward {reward:.4} produced delta {delta:?}");

        delta
    }

    /// Learns from an accepted trip request.
    pub fn learn_from_acceptance(&self, rider_id: &str, breakdown: &TimeBreakdown, reward: f64) -> WeightDelta {
        self.learn(rider_id, breakdown, reward, EventKind::Acceptance)
    }

    /// Learns from a rejected trip request. Penalty sign is ignored, it always acts as a negative reward.
    pub fn learn_from_rejection(&self, rider_id: &str, breakdown: &TimeBreakdown, penalty: f64) -> WeightDelta {
        self.learn(rider_id, breakdown, penalty, EventKind::Rejection)
    }

    /// Learns from a completed trip using actually experienced times.
    pub fn learn_from_completion(&self, rider_id: &str, breakdown: &TimeBreakdown, satisfaction: f64) -> WeightDelta {
        self.learn(rider_id, breakdown, satisfaction, EventKind::Completion)
    }

    /// Buffers experiences and produces a delta for every known rider whose buffer reached batch size.
    ///
    /// A single batch is consumed per rider and call: gradients of the batch are averaged, optionally
    /// normalized, and applied as one momentum step. Leftover experiences stay buffered. Experiences of
    /// unknown riders and invalid experiences are dropped.
    pub fn batch_learn(
        &self,
        experiences: FxHashMap<RiderId, Vec<LearningExperience>>,
    ) -> FxHashMap<RiderId, WeightDelta> {
        let batch_size = self.config.batch_size.max(1);

        experiences
            .into_iter()
            .filter_map(|(rider_id, experiences)| {
                let Some(weights) = self.store.get(rider_id.as_str()) else {
                    log::debug!("dropping {} experiences of unknown rider '{rider_id}'", experiences.len());
                    return None;
                };

                let batch = self.with_state(&rider_id, |state| {
                    state.buffer.extend(experiences.into_iter().filter(|experience| {
                        experience.breakdown.validate().is_ok() && experience.reward.is_finite()
                    }));

                    (state.buffer.len() >= batch_size).then(|| state.buffer.drain(..batch_size).collect::<Vec<_>>())
                })?;

                let mut gradient = average_gradient(&weights, &batch, &self.config);
                if self.config.use_batch_normalization && batch.len() > 1 {
                    normalize_gradient(&mut gradient);
                }

                Some((rider_id.clone(), self.step(&rider_id, gradient)))
            })
            .collect()
    }

    /// Sets iteration used to decay learning and exploration rates.
    pub fn update_learning_parameters(&self, iteration: usize) {
        self.iteration.store(iteration, Ordering::Relaxed);
    }

    /// Drops all rider state and counters. Noise generator is reseeded.
    pub fn reset(&self) {
        self.riders.write().clear();
        *self.random.lock() = StdRng::seed_from_u64(self.config.seed);
        self.iteration.store(0, Ordering::Relaxed);
        self.total_updates.store(0, Ordering::Relaxed);
    }

    /// Returns current learner statistics.
    pub fn statistics(&self) -> LearningStatistics {
        let iteration = self.iteration.load(Ordering::Relaxed);
        let riders = self.riders.read();

        LearningStatistics {
            total_updates: self.total_updates.load(Ordering::Relaxed),
            current_iteration: iteration,
            current_learning_rate: self.config.current_learning_rate(iteration),
            current_exploration_rate: self.config.current_exploration_rate(iteration),
            active_riders: riders.len(),
            buffered_experiences: riders.values().map(|state| state.lock().buffer.len()).sum(),
        }
    }

    /// Returns current momentum of a rider.
    pub fn momentum(&self, rider_id: &str) -> Option<WeightDelta> {
        self.riders.read().get(rider_id).map(|state| WeightDelta::from_array(state.lock().momentum))
    }

    /// Updates rider momentum with gradient and turns clipped momentum into a final delta.
    fn step(&self, rider_id: &RiderId, gradient: Gradient) -> WeightDelta {
        let beta = self.config.momentum;

        let momentum = self.with_state(rider_id, |state| {
            state.momentum.iter_mut().zip(gradient.iter()).for_each(|(momentum, gradient)| {
                *momentum = beta * *momentum + (1. - beta) * gradient;
            });
            state.momentum
        });

        self.finalize(clip_norm(momentum, self.config.gradient_clip_threshold))
    }

    /// Scales direction by learning rate, adds exploration noise and limits total change.
    fn finalize(&self, direction: Gradient) -> WeightDelta {
        let iteration = self.iteration.load(Ordering::Relaxed);
        let learning_rate = self.config.current_learning_rate(iteration);

        let mut delta = direction.map(|value| value * learning_rate);

        let exploration_rate = self.config.current_exploration_rate(iteration);
        if self.config.use_exploration && exploration_rate > 0. {
            let scale = exploration_rate * self.config.exploration_noise_scale;
            let mut random = self.random.lock();
            delta.iter_mut().for_each(|value| {
                let noise: f64 = StandardNormal.sample(&mut *random);
                *value += noise * scale;
            });
        }

        let delta = WeightDelta::from_array(delta);
        let total_change = delta.l1_norm();

        self.total_updates.fetch_add(1, Ordering::Relaxed);

        if total_change > self.config.max_total_change {
            delta.scale(self.config.max_total_change / total_change)
        } else {
            delta
        }
    }

    fn with_state<R>(&self, rider_id: &RiderId, func: impl FnOnce(&mut RiderState) -> R) -> R {
        {
            let riders = self.riders.read();
            if let Some(state) = riders.get(rider_id.as_str()) {
                return func(&mut state.lock());
            }
        }

        let mut riders = self.riders.write();
        let state = riders.entry(rider_id.clone()).or_default().get_mut();

        func(state)
    }
}

/// Calculates REINFORCE gradient of given (already scaled) reward with L2 regularization.
fn policy_gradient(
    weights: &PreferenceWeights,
    breakdown: &TimeBreakdown,
    reward: f64,
    config: &LearningConfig,
) -> Gradient {
    let utility = weights.utility(breakdown);
    let probability = 1. / (1. + (-utility / config.temperature).exp());

    let scale = if reward > 0. { reward * (1. - probability) } else { reward * -probability };

    let times = breakdown.normalized();
    let current = weights.as_array();

    std::array::from_fn(|idx| scale * times[idx] - config.l2_regularization * current[idx])
}

fn average_gradient(weights: &PreferenceWeights, batch: &[LearningExperience], config: &LearningConfig) -> Gradient {
    let mut total = [0.; WEIGHT_DIMENSIONS];

    batch.iter().for_each(|experience| {
        let reward = experience.kind.scale_reward(experience.reward, config);
        let gradient = policy_gradient(weights, &experience.breakdown, reward, config);
        total.iter_mut().zip(gradient.iter()).for_each(|(total, value)| *total += value);
    });

    let count = batch.len().max(1) as f64;

    total.map(|value| value / count)
}

/// Applies z-score normalization across gradient components.
fn normalize_gradient(gradient: &mut Gradient) {
    let size = WEIGHT_DIMENSIONS as f64;
    let mean = gradient.iter().sum::<f64>() / size;
    let variance = gradient.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / size;
    let std = (variance + 1E-8).sqrt();

    gradient.iter_mut().for_each(|value| *value = (*value - mean) / std);
}

fn clip_norm(vector: Gradient, threshold: f64) -> Gradient {
    let norm = vector.iter().map(|value| value * value).sum::<f64>().sqrt();

    if norm > threshold && norm > 0. { vector.map(|value| value * threshold / norm) } else { vector }
}
