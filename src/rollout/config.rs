//! Configuration for episode collection.

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// Configuration for [`run_policy`](super::run_policy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolloutConfig {
    /// Episodes collected per scaler update.
    pub episodes_per_batch: usize,
    /// Step limit per episode.
    pub max_steps: usize,
    /// Append a step-counter feature to every observation.
    pub time_feature: bool,
    /// Increment of the step-counter feature per step.
    pub time_step_increment: f64,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            episodes_per_batch: 20,
            max_steps: 1000,
            time_feature: true,
            time_step_increment: 1e-3,
        }
    }
}

impl RolloutConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of episodes per batch.
    pub fn with_episodes_per_batch(mut self, n: usize) -> Self {
        self.episodes_per_batch = n;
        self
    }

    /// Set the per-episode step limit.
    pub fn with_max_steps(mut self, n: usize) -> Self {
        self.max_steps = n;
        self
    }

    /// Enable or disable the step-counter feature.
    pub fn with_time_feature(mut self, enabled: bool) -> Self {
        self.time_feature = enabled;
        self
    }

    /// Set the step-counter increment.
    pub fn with_time_step_increment(mut self, increment: f64) -> Self {
        self.time_step_increment = increment;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.episodes_per_batch == 0 {
            return Err(HarnessError::invalid_config(
                "episodes_per_batch",
                "must be at least 1",
            ));
        }
        if self.max_steps == 0 {
            return Err(HarnessError::invalid_config("max_steps", "must be at least 1"));
        }
        if !self.time_step_increment.is_finite() {
            return Err(HarnessError::invalid_config(
                "time_step_increment",
                format!("must be finite, got {}", self.time_step_increment),
            ));
        }
        Ok(())
    }
}
