//! Half-cheetah running task.
//!
//! Reward per step:
//!
//! ```text
//! reward_ctrl = -ctrl_cost_weight * sum(action^2)
//! reward_run  = (x_after - x_before) / dt
//! reward_flat = -(torso_angle_after^2)
//! reward      = reward_ctrl + reward_run + reward_flat
//! ```
//!
//! where `x = qpos[0]`, `torso_angle = qpos[2]` and
//! `dt = timestep * frame_skip`. Episodes never terminate on their own; the
//! rollout loop truncates them.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use super::{Environment, HalfCheetahConfig, RewardInfo, Simulator, StepOutcome};
use crate::error::{HarnessError, Result};

/// Index of the root x-position in `qpos`.
const ROOT_X: usize = 0;
/// Index of the torso pitch angle in `qpos`.
const TORSO_ANGLE: usize = 2;

/// Planar locomotion task wrapping a [`Simulator`].
pub struct HalfCheetah<S> {
    sim: S,
    config: HalfCheetahConfig,
}

impl<S: Simulator> HalfCheetah<S> {
    /// Create the task with the default configuration.
    pub fn new(sim: S) -> Result<Self> {
        Self::with_config(sim, HalfCheetahConfig::default())
    }

    /// Create the task with a custom configuration.
    pub fn with_config(sim: S, config: HalfCheetahConfig) -> Result<Self> {
        config.validate()?;
        if sim.nq() <= TORSO_ANGLE {
            return Err(HarnessError::invalid_config(
                "nq",
                format!("model needs at least {} positions, has {}", TORSO_ANGLE + 1, sim.nq()),
            ));
        }
        if sim.timestep() <= 0.0 {
            return Err(HarnessError::invalid_config(
                "timestep",
                format!("must be positive, got {}", sim.timestep()),
            ));
        }
        Ok(Self { sim, config })
    }

    /// Environment step duration in seconds.
    pub fn dt(&self) -> f64 {
        self.sim.timestep() * self.config.frame_skip as f64
    }

    /// Viewer camera distance.
    pub fn camera_distance(&self) -> f64 {
        self.config.camera_distance
    }

    /// Get the configuration.
    pub fn config(&self) -> &HalfCheetahConfig {
        &self.config
    }

    /// Borrow the underlying simulator.
    pub fn simulator(&self) -> &S {
        &self.sim
    }

    /// Mutably borrow the underlying simulator.
    pub fn simulator_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    /// Current observation: `qpos[1..]` followed by `qvel`.
    ///
    /// The root x-position is left out so the policy is translation invariant.
    pub fn observation(&self) -> Vec<f64> {
        let qpos = self.sim.qpos();
        let qvel = self.sim.qvel();
        let mut obs = Vec::with_capacity(qpos.len() - 1 + qvel.len());
        obs.extend_from_slice(&qpos[ROOT_X + 1..]);
        obs.extend_from_slice(qvel);
        obs
    }
}

impl<S: Simulator> Environment for HalfCheetah<S> {
    fn obs_dim(&self) -> usize {
        self.sim.nq() - 1 + self.sim.nv()
    }

    fn action_dim(&self) -> usize {
        self.sim.action_dim()
    }

    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<f64> {
        let pos_noise = self.config.reset_qpos_noise;
        let vel_noise = self.config.reset_qvel_noise;

        let qpos: Vec<f64> = self
            .sim
            .init_qpos()
            .iter()
            .map(|&q| q + (rng.gen::<f64>() * 2.0 - 1.0) * pos_noise)
            .collect();
        let qvel: Vec<f64> = self
            .sim
            .init_qvel()
            .iter()
            .map(|&v| {
                let z: f64 = StandardNormal.sample(&mut *rng);
                v + z * vel_noise
            })
            .collect();

        self.sim.set_state(&qpos, &qvel);
        self.observation()
    }

    fn step(&mut self, action: &[f64]) -> Result<StepOutcome> {
        if action.len() != self.sim.action_dim() {
            return Err(HarnessError::invalid_input(format!(
                "action has length {}, expected {}",
                action.len(),
                self.sim.action_dim()
            )));
        }

        let x_before = self.sim.qpos()[ROOT_X];
        self.sim.do_simulation(action, self.config.frame_skip);
        let x_after = self.sim.qpos()[ROOT_X];
        let torso_angle_after = self.sim.qpos()[TORSO_ANGLE];

        let reward_ctrl = -self.config.ctrl_cost_weight * action.iter().map(|a| a * a).sum::<f64>();
        let reward_run = (x_after - x_before) / self.dt();
        let reward_flat = -(torso_angle_after * torso_angle_after);

        Ok(StepOutcome {
            observation: self.observation(),
            reward: reward_ctrl + reward_run + reward_flat,
            done: false,
            info: RewardInfo {
                reward_run,
                reward_ctrl,
                reward_flat,
            },
        })
    }
}
