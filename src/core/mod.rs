//! Core statistics for observation normalization.
//!
//! - [`Scaler`]: running mean/variance over observation batches
//! - [`ScaleOffset`]: affine normalization snapshot derived from a scaler
//! - [`SharedScaler`]: lock-protected scaler for multiple producers

pub mod running_stats;

pub use running_stats::{BatchMoments, ScaleOffset, Scaler, SharedScaler, STD_FLOOR, STD_RANGE};
