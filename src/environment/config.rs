//! Configuration for the half-cheetah locomotion task.

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// Configuration for [`HalfCheetah`](super::HalfCheetah).
///
/// # Example
/// ```ignore
/// let config = HalfCheetahConfig::new()
///     .with_frame_skip(5)
///     .with_ctrl_cost_weight(0.1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalfCheetahConfig {
    /// Simulator frames advanced per environment step.
    pub frame_skip: usize,
    /// Weight of the quadratic control penalty.
    pub ctrl_cost_weight: f64,
    /// Half-width of the uniform noise added to the initial positions.
    pub reset_qpos_noise: f64,
    /// Standard deviation of the Gaussian noise added to the initial velocities.
    pub reset_qvel_noise: f64,
    /// Viewer camera distance.
    pub camera_distance: f64,
}

impl Default for HalfCheetahConfig {
    fn default() -> Self {
        Self {
            frame_skip: 5,
            ctrl_cost_weight: 0.1,
            reset_qpos_noise: 0.1,
            reset_qvel_noise: 0.1,
            camera_distance: 10.0,
        }
    }
}

impl HalfCheetahConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of simulator frames per step.
    pub fn with_frame_skip(mut self, frame_skip: usize) -> Self {
        self.frame_skip = frame_skip;
        self
    }

    /// Set the control penalty weight.
    pub fn with_ctrl_cost_weight(mut self, weight: f64) -> Self {
        self.ctrl_cost_weight = weight;
        self
    }

    /// Set the reset noise scales for positions and velocities.
    pub fn with_reset_noise(mut self, qpos: f64, qvel: f64) -> Self {
        self.reset_qpos_noise = qpos;
        self.reset_qvel_noise = qvel;
        self
    }

    /// Set the viewer camera distance.
    pub fn with_camera_distance(mut self, distance: f64) -> Self {
        self.camera_distance = distance;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.frame_skip == 0 {
            return Err(HarnessError::invalid_config(
                "frame_skip",
                "must be at least 1",
            ));
        }
        if !(self.ctrl_cost_weight >= 0.0) {
            return Err(HarnessError::invalid_config(
                "ctrl_cost_weight",
                format!("must be non-negative, got {}", self.ctrl_cost_weight),
            ));
        }
        if !(self.reset_qpos_noise >= 0.0) {
            return Err(HarnessError::invalid_config(
                "reset_qpos_noise",
                format!("must be non-negative, got {}", self.reset_qpos_noise),
            ));
        }
        if !(self.reset_qvel_noise >= 0.0) {
            return Err(HarnessError::invalid_config(
                "reset_qvel_noise",
                format!("must be non-negative, got {}", self.reset_qvel_noise),
            ));
        }
        Ok(())
    }
}
