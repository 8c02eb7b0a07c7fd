//! Environment abstraction for locomotion training.
//!
//! The physics engine itself is an external collaborator reached through
//! [`Simulator`]; this crate only shapes rewards and observations on top of
//! it.
//!
//! - [`Simulator`]: generalized-coordinate physics engine boundary
//! - [`Environment`]: episodic task interface consumed by the rollout loop
//! - [`HalfCheetah`]: planar running task built on any [`Simulator`]

pub mod config;
pub mod half_cheetah;


pub use config::HalfCheetahConfig;
pub use half_cheetah::HalfCheetah;

use rand::Rng;

use crate::error::Result;

/// Physics engine boundary.
///
/// State is expressed in generalized coordinates: `qpos` (length `nq`) and
/// `qvel` (length `nv`). Integration is entirely the engine's business.
pub trait Simulator {
    /// Number of position coordinates.
    fn nq(&self) -> usize;

    /// Number of velocity coordinates.
    fn nv(&self) -> usize;

    /// Number of actuator controls.
    fn action_dim(&self) -> usize;

    /// Duration of one simulator frame in seconds.
    fn timestep(&self) -> f64;

    /// Current positions.
    fn qpos(&self) -> &[f64];

    /// Current velocities.
    fn qvel(&self) -> &[f64];

    /// Positions of the model's reference pose.
    fn init_qpos(&self) -> &[f64];

    /// Velocities of the model's reference pose.
    fn init_qvel(&self) -> &[f64];

    /// Overwrite the full state.
    fn set_state(&mut self, qpos: &[f64], qvel: &[f64]);

    /// Apply `ctrl` and advance `n_frames` frames.
    fn do_simulation(&mut self, ctrl: &[f64], n_frames: usize);
}

/// Per-step reward breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RewardInfo {
    /// Forward velocity term.
    pub reward_run: f64,
    /// Control penalty term (non-positive).
    pub reward_ctrl: f64,
    /// Torso tilt penalty term (non-positive).
    pub reward_flat: f64,
}

/// Result of a single environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Observation after the step.
    pub observation: Vec<f64>,
    /// Scalar reward.
    pub reward: f64,
    /// Whether the episode ended.
    pub done: bool,
    /// Reward components.
    pub info: RewardInfo,
}

/// Episodic task interface.
pub trait Environment {
    /// Size of the observation vector.
    fn obs_dim(&self) -> usize;

    /// Size of the action vector.
    fn action_dim(&self) -> usize;

    /// Start a new episode and return its first observation.
    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<f64>;

    /// Apply an action.
    fn step(&mut self, action: &[f64]) -> Result<StepOutcome>;
}
