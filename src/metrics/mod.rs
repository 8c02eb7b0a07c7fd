//! Run logging for training.
//!
//! ## Loggers
//!
//! - [`RunLogger`]: CSV file logging with an optional console summary
//! - `RewardPlot`: mean reward vs. episodes chart (feature `plot`)

pub mod logger;
#[cfg(feature = "plot")]
pub mod plot;

#[cfg(test)]
mod tests;

pub use logger::{LogValue, RunLogger, RunLoggerConfig, EPISODE_KEY, MEAN_REWARD_KEY};
#[cfg(feature = "plot")]
pub use plot::RewardPlot;
