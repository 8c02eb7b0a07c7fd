//! Episode collection with running observation normalization.
//!
//! One call to [`run_policy`] is one training iteration's worth of data:
//!
//! ```text
//! scale/offset snapshot ──► run_episode × N ──► unscaled observations
//!          ▲                                          │
//!          └──────────── Scaler::update ◄─────────────┘
//! ```
//!
//! The snapshot is taken once per batch so every episode in the batch sees
//! the same normalization.

mod config;


pub use config::RolloutConfig;

use rand::Rng;

use crate::core::{ScaleOffset, Scaler};
use crate::environment::Environment;
use crate::error::{HarnessError, Result};
use crate::metrics::{LogValue, RunLogger, MEAN_REWARD_KEY};

/// Maps a normalized observation to an action.
pub trait Policy {
    /// Choose an action for the given normalized observation.
    fn sample(&mut self, obs: &[f64]) -> Vec<f64>;
}

impl<F> Policy for F
where
    F: FnMut(&[f64]) -> Vec<f64>,
{
    fn sample(&mut self, obs: &[f64]) -> Vec<f64> {
        self(obs)
    }
}

/// One collected episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    /// Normalized observations fed to the policy.
    pub observes: Vec<Vec<f64>>,
    /// Actions taken.
    pub actions: Vec<Vec<f64>>,
    /// Rewards received.
    pub rewards: Vec<f64>,
    /// Raw observations (with the time feature) before normalization.
    pub unscaled_obs: Vec<Vec<f64>>,
}

impl Trajectory {
    /// Number of steps.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Whether no step was taken.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Undiscounted episode return.
    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }
}

/// Width of the feature vector fed to the policy for `env`.
pub fn feature_dim<E: Environment>(env: &E, config: &RolloutConfig) -> usize {
    env.obs_dim() + usize::from(config.time_feature)
}

/// Create a scaler sized for `env`'s features.
pub fn scaler_for<E: Environment>(env: &E, config: &RolloutConfig) -> Result<Scaler> {
    Scaler::new(feature_dim(env, config))
}

/// Run a single episode, normalizing observations with `scale_offset`.
///
/// With the time feature enabled, a step counter (`0.0`, then incremented by
/// `time_step_increment`) is appended to each observation and passed through
/// unnormalized.
pub fn run_episode<E, P, R>(
    env: &mut E,
    policy: &mut P,
    scale_offset: &ScaleOffset,
    config: &RolloutConfig,
    rng: &mut R,
) -> Result<Trajectory>
where
    E: Environment,
    P: Policy,
    R: Rng + ?Sized,
{
    let dim = feature_dim(env, config);
    if scale_offset.dimension() != dim {
        return Err(HarnessError::invalid_input(format!(
            "scale/offset has {} dimensions, rollout features have {}",
            scale_offset.dimension(),
            dim
        )));
    }

    let mut scale_offset = scale_offset.clone();
    if config.time_feature {
        scale_offset.pin_dimension(dim - 1)?;
    }

    let mut trajectory = Trajectory::default();
    let mut obs = env.reset(rng);
    let mut time_step = 0.0;

    for _ in 0..config.max_steps {
        let mut features = obs;
        if config.time_feature {
            features.push(time_step);
        }

        let normalized = scale_offset.apply(&features)?;
        let action = policy.sample(&normalized);
        let outcome = env.step(&action)?;

        trajectory.unscaled_obs.push(features);
        trajectory.observes.push(normalized);
        trajectory.actions.push(action);
        trajectory.rewards.push(outcome.reward);

        time_step += config.time_step_increment;
        obs = outcome.observation;
        if outcome.done {
            break;
        }
    }

    Ok(trajectory)
}

/// Collect a batch of episodes, update the scaler and log the batch summary.
///
/// Logs `_MeanReward` (mean episode return) and `Steps` (total steps) to
/// `logger`; the caller decides when to [`RunLogger::write`].
pub fn run_policy<E, P, R>(
    env: &mut E,
    policy: &mut P,
    scaler: &mut Scaler,
    logger: &mut RunLogger,
    config: &RolloutConfig,
    rng: &mut R,
) -> Result<Vec<Trajectory>>
where
    E: Environment,
    P: Policy,
    R: Rng + ?Sized,
{
    config.validate()?;

    let scale_offset = scaler.current_scale_and_offset();
    let mut trajectories = Vec::with_capacity(config.episodes_per_batch);
    for _ in 0..config.episodes_per_batch {
        trajectories.push(run_episode(env, policy, &scale_offset, config, rng)?);
    }

    let unscaled: Vec<&[f64]> = trajectories
        .iter()
        .flat_map(|t| t.unscaled_obs.iter().map(Vec::as_slice))
        .collect();
    let total_steps = unscaled.len();
    scaler.update(&unscaled)?;

    let mean_reward = trajectories.iter().map(Trajectory::total_reward).sum::<f64>()
        / trajectories.len() as f64;

    log::debug!(
        "Collected {} episodes ({} steps), mean reward {:.3}",
        trajectories.len(),
        total_steps,
        mean_reward
    );

    logger.log([
        (MEAN_REWARD_KEY, LogValue::from(mean_reward)),
        ("Steps", LogValue::from(total_steps)),
    ])?;

    Ok(trajectories)
}
