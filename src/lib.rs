//! # Locomotion RL: experiment harness for physics-based locomotion
//!
//! Training-support pieces around an external physics engine:
//!
//! ```text
//! ┌─────────────┐  raw obs   ┌──────────────┐  normalized obs  ┌────────┐
//! │ HalfCheetah │──────────► │ ScaleOffset  │ ───────────────► │ Policy │
//! │ (Simulator) │            │  (snapshot)  │                  └───┬────┘
//! └─────▲───────┘            └──────▲───────┘                      │
//!       │                           │ current_scale_and_offset     │
//!       │ action              ┌─────┴──────┐                       │
//!       └─────────────────────│   Scaler   │◄── update(batch) ─────┘
//!                             └────────────┘     (per rollout batch)
//! ```
//!
//! - [`core`]: running mean/variance with exact batch merging, and the
//!   scale/offset read-out
//! - [`environment`]: physics engine boundary and the half-cheetah task
//! - [`rollout`]: episode collection feeding the scaler
//! - [`metrics`]: CSV run log and reward chart
//!
//! ## Usage
//!
//! ```rust,ignore
//! use locomotion_rl::{HalfCheetah, RolloutConfig, RunLogger, RunLoggerConfig};
//! use locomotion_rl::rollout::{run_policy, scaler_for};
//!
//! let mut env = HalfCheetah::new(my_simulator)?;
//! let config = RolloutConfig::new().with_episodes_per_batch(20);
//! let mut scaler = scaler_for(&env, &config)?;
//! let mut logger = RunLogger::create(RunLoggerConfig::new("HalfCheetah-v2", "logs"))?;
//!
//! let mut episode = 0;
//! while episode < 1000 {
//!     let trajectories = run_policy(&mut env, &mut policy, &mut scaler, &mut logger, &config, &mut rng)?;
//!     episode += trajectories.len();
//!     logger.log([("_Episode", episode)])?;
//!     logger.write()?;
//! }
//! logger.close()?;
//! ```

pub mod core;
pub mod environment;
pub mod error;
pub mod metrics;
pub mod rollout;

pub use crate::core::{BatchMoments, ScaleOffset, Scaler, SharedScaler};
pub use environment::{Environment, HalfCheetah, HalfCheetahConfig, RewardInfo, Simulator, StepOutcome};
pub use error::{HarnessError, Result};
pub use metrics::{LogValue, RunLogger, RunLoggerConfig};
pub use rollout::{Policy, RolloutConfig, Trajectory};
