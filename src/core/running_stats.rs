//! Running observation statistics using the pooled-moments merge.
//!
//! Provides an exact running mean and population variance over a stream of
//! observation batches, and the scale/offset read-out used to normalize
//! observations before they reach the policy.
//!
//! # Features
//! - Whole batches are merged with the pooled second-moment identity, so
//!   state is `O(dimension)` no matter how many batches were absorbed
//! - Population variance (divisor `n`), clamped at zero after every merge
//! - Thread-safe wrapper via `parking_lot::RwLock`
//!
//! # Example
//! ```ignore
//! use locomotion_rl::core::Scaler;
//!
//! let mut scaler = Scaler::new(2)?;
//! scaler.update(&[[0.0, 0.0], [2.0, 0.0]])?;
//! scaler.update(&[[4.0, 0.0], [6.0, 0.0]])?;
//!
//! let scale_offset = scaler.current_scale_and_offset();
//! let normalized = scale_offset.apply(&[3.0, 0.0])?;
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// Added to the standard deviation before inverting it.
pub const STD_FLOOR: f64 = 0.1;

/// Number of standard deviations mapped onto a normalized magnitude of 1.0.
pub const STD_RANGE: f64 = 3.0;

/// Exact per-dimension moments of a single batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchMoments {
    /// Number of rows in the batch
    pub count: usize,
    /// Per-dimension mean
    pub mean: Vec<f64>,
    /// Per-dimension population variance
    pub variance: Vec<f64>,
}

impl BatchMoments {
    /// Compute the moments of a batch of rows.
    ///
    /// Fails if the batch is empty or any row length differs from `dimension`.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R], dimension: usize) -> Result<Self> {
        if rows.is_empty() {
            return Err(HarnessError::invalid_input("batch is empty"));
        }
        for (i, row) in rows.iter().enumerate() {
            let len = row.as_ref().len();
            if len != dimension {
                return Err(HarnessError::invalid_input(format!(
                    "row {} has length {}, expected {}",
                    i, len, dimension
                )));
            }
        }

        let n = rows.len() as f64;

        let mut mean = vec![0.0; dimension];
        for row in rows {
            for (m, &x) in mean.iter_mut().zip(row.as_ref()) {
                *m += x;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        // Second pass over deviations, like np.var
        let mut variance = vec![0.0; dimension];
        for row in rows {
            for ((v, &m), &x) in variance.iter_mut().zip(&mean).zip(row.as_ref()) {
                let d = x - m;
                *v += d * d;
            }
        }
        for v in &mut variance {
            *v /= n;
        }

        Ok(Self {
            count: rows.len(),
            mean,
            variance,
        })
    }

    /// Compute the moments of a row-major flattened batch.
    pub fn from_flat(data: &[f64], dimension: usize) -> Result<Self> {
        if dimension == 0 || data.len() % dimension != 0 {
            return Err(HarnessError::invalid_input(format!(
                "flat batch of length {} is not a multiple of dimension {}",
                data.len(),
                dimension
            )));
        }
        let rows: Vec<&[f64]> = data.chunks_exact(dimension).collect();
        Self::from_rows(&rows, dimension)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum State {
    /// No batch absorbed yet.
    Empty,
    /// At least one batch absorbed.
    Populated {
        count: usize,
        mean: Vec<f64>,
        variance: Vec<f64>,
    },
}

/// Running mean and population variance over observation batches.
///
/// The first batch replaces the state outright; every later batch is merged
/// with the pooled second-moment identity:
///
/// ```text
/// mu  = (mu_old * m + mu_new * n) / (m + n)
/// var = [m * (var_old + mu_old^2) + n * (var_new + mu_new^2)] / (m + n) - mu^2
/// ```
///
/// and each variance component is clamped to `>= 0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScaler")]
pub struct Scaler {
    dimension: usize,
    state: State,
}

/// Unchecked serialized form of [`Scaler`].
#[derive(Deserialize)]
struct RawScaler {
    dimension: usize,
    state: State,
}

impl TryFrom<RawScaler> for Scaler {
    type Error = HarnessError;

    fn try_from(raw: RawScaler) -> Result<Self> {
        let mut scaler = Scaler::new(raw.dimension)?;
        if let State::Populated {
            count,
            ref mean,
            ref variance,
        } = raw.state
        {
            if count == 0 {
                return Err(HarnessError::invalid_input(
                    "populated scaler state has a count of 0",
                ));
            }
            if mean.len() != raw.dimension || variance.len() != raw.dimension {
                return Err(HarnessError::invalid_input(format!(
                    "scaler state has {} means and {} variances, expected {}",
                    mean.len(),
                    variance.len(),
                    raw.dimension
                )));
            }
        }
        scaler.state = raw.state;
        Ok(scaler)
    }
}

impl Scaler {
    /// Create an empty scaler for observations of the given dimensionality.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(HarnessError::invalid_config(
                "dimension",
                "must be at least 1",
            ));
        }
        Ok(Self {
            dimension,
            state: State::Empty,
        })
    }

    /// Fold a batch of rows into the running statistics.
    ///
    /// Leaves the state untouched on error.
    pub fn update<R: AsRef<[f64]>>(&mut self, batch: &[R]) -> Result<()> {
        let moments = BatchMoments::from_rows(batch, self.dimension)?;
        self.absorb(moments);
        Ok(())
    }

    /// Fold a row-major flattened batch into the running statistics.
    pub fn update_flat(&mut self, data: &[f64]) -> Result<()> {
        let moments = BatchMoments::from_flat(data, self.dimension)?;
        self.absorb(moments);
        Ok(())
    }

    fn absorb(&mut self, batch: BatchMoments) {
        match self.state {
            State::Empty => {
                self.state = State::Populated {
                    count: batch.count,
                    mean: batch.mean,
                    variance: batch.variance,
                };
            }
            State::Populated {
                ref mut count,
                ref mut mean,
                ref mut variance,
            } => {
                let m = *count as f64;
                let n = batch.count as f64;
                let total = m + n;

                for i in 0..self.dimension {
                    let new_mean = (mean[i] * m + batch.mean[i] * n) / total;
                    let pooled = (m * (variance[i] + mean[i] * mean[i])
                        + n * (batch.variance[i] + batch.mean[i] * batch.mean[i]))
                        / total
                        - new_mean * new_mean;

                    // Cancellation occasionally leaves a tiny negative value.
                    // NaN passes through so a corrupted batch stays visible.
                    variance[i] = if pooled < 0.0 { 0.0 } else { pooled };
                    mean[i] = new_mean;
                }

                *count += batch.count;
            }
        }
    }

    /// Derive the per-dimension normalization parameters.
    ///
    /// `offset = mean`, `scale = 1 / (sqrt(variance) + 0.1) / 3`, so three
    /// standard deviations map to roughly `+/- 1.0`.
    pub fn current_scale_and_offset(&self) -> ScaleOffset {
        let (mean, variance) = match &self.state {
            State::Empty => (vec![0.0; self.dimension], vec![0.0; self.dimension]),
            State::Populated { mean, variance, .. } => (mean.clone(), variance.clone()),
        };

        let scale = variance
            .iter()
            .map(|&v| 1.0 / (v.sqrt() + STD_FLOOR) / STD_RANGE)
            .collect();

        ScaleOffset {
            scale,
            offset: mean,
        }
    }

    /// Shorthand for [`Scaler::current_scale_and_offset`].
    #[inline]
    pub fn get(&self) -> ScaleOffset {
        self.current_scale_and_offset()
    }

    /// Get the dimensionality.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of samples folded in so far.
    pub fn count(&self) -> usize {
        match &self.state {
            State::Empty => 0,
            State::Populated { count, .. } => *count,
        }
    }

    /// Whether at least one batch has been absorbed.
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, State::Populated { .. })
    }

    /// Get the running mean (zeros before the first batch).
    pub fn mean(&self) -> Vec<f64> {
        match &self.state {
            State::Empty => vec![0.0; self.dimension],
            State::Populated { mean, .. } => mean.clone(),
        }
    }

    /// Get the running population variance (zeros before the first batch).
    pub fn variance(&self) -> Vec<f64> {
        match &self.state {
            State::Empty => vec![0.0; self.dimension],
            State::Populated { variance, .. } => variance.clone(),
        }
    }

    /// Reset statistics to the empty state.
    pub fn reset(&mut self) {
        self.state = State::Empty;
    }
}

/// Per-dimension affine normalization parameters.
///
/// A snapshot derived from a [`Scaler`]; applying it computes
/// `(x - offset) * scale` elementwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleOffset {
    /// Multiplier applied after centering
    pub scale: Vec<f64>,
    /// Value subtracted before scaling (the running mean)
    pub offset: Vec<f64>,
}

impl ScaleOffset {
    /// Get the dimensionality.
    pub fn dimension(&self) -> usize {
        self.scale.len()
    }

    /// Normalize a raw observation.
    pub fn apply(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.check_len(x)?;
        Ok(x.iter()
            .zip(self.offset.iter().zip(&self.scale))
            .map(|(&x, (&offset, &scale))| (x - offset) * scale)
            .collect())
    }

    /// Map a normalized observation back to raw units.
    pub fn invert(&self, y: &[f64]) -> Result<Vec<f64>> {
        self.check_len(y)?;
        Ok(y.iter()
            .zip(self.offset.iter().zip(&self.scale))
            .map(|(&y, (&offset, &scale))| y / scale + offset)
            .collect())
    }

    /// Pass dimension `i` through unchanged (`scale = 1`, `offset = 0`).
    pub fn pin_dimension(&mut self, i: usize) -> Result<()> {
        if i >= self.dimension() {
            return Err(HarnessError::invalid_input(format!(
                "dimension {} out of range for {} features",
                i,
                self.dimension()
            )));
        }
        self.scale[i] = 1.0;
        self.offset[i] = 0.0;
        Ok(())
    }

    fn check_len(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.dimension() {
            return Err(HarnessError::invalid_input(format!(
                "observation has length {}, expected {}",
                x.len(),
                self.dimension()
            )));
        }
        Ok(())
    }
}

/// Thread-safe wrapper for [`Scaler`].
///
/// `update` holds the write lock for the whole merge; the read-out takes the
/// read lock, so it always observes the state between two updates.
#[derive(Debug, Clone)]
pub struct SharedScaler {
    inner: Arc<RwLock<Scaler>>,
}

impl SharedScaler {
    /// Create a new thread-safe scaler.
    pub fn new(dimension: usize) -> Result<Self> {
        Ok(Self::from_scaler(Scaler::new(dimension)?))
    }

    /// Create from an existing scaler.
    pub fn from_scaler(scaler: Scaler) -> Self {
        Self {
            inner: Arc::new(RwLock::new(scaler)),
        }
    }

    /// Fold a batch of rows into the statistics.
    pub fn update<R: AsRef<[f64]>>(&self, batch: &[R]) -> Result<()> {
        self.inner.write().update(batch)
    }

    /// Fold a flattened batch into the statistics.
    pub fn update_flat(&self, data: &[f64]) -> Result<()> {
        self.inner.write().update_flat(data)
    }

    /// Derive a consistent scale/offset snapshot.
    pub fn current_scale_and_offset(&self) -> ScaleOffset {
        self.inner.read().current_scale_and_offset()
    }

    /// Get a copy of the current statistics.
    pub fn snapshot(&self) -> Scaler {
        self.inner.read().clone()
    }

    /// Get the sample count.
    pub fn count(&self) -> usize {
        self.inner.read().count()
    }
}


#[cfg(test)]
mod proptest_scaler {
    use super::*;
    use proptest::prelude::*;

    const DIM: usize = 3;

    /// Batches of 1..8 rows with moderate magnitudes
    fn batches() -> impl Strategy<Value = Vec<Vec<Vec<f64>>>> {
        let row = prop::collection::vec(-100.0f64..100.0, DIM);
        let batch = prop::collection::vec(row, 1..8);
        prop::collection::vec(batch, 1..6)
    }

    fn direct_moments(batches: &[Vec<Vec<f64>>]) -> (Vec<f64>, Vec<f64>) {
        let all: Vec<&Vec<f64>> = batches.iter().flatten().collect();
        let moments = BatchMoments::from_rows(&all, DIM).unwrap();
        (moments.mean, moments.variance)
    }

    proptest! {
        /// Property: merging batch by batch equals the statistics of the concatenation
        #[test]
        fn test_merge_matches_concatenation(batches in batches()) {
            let mut scaler = Scaler::new(DIM).unwrap();
            for b in &batches {
                scaler.update(b).unwrap();
            }

            let (mean, variance) = direct_moments(&batches);
            let total: usize = batches.iter().map(|b| b.len()).sum();
            prop_assert_eq!(scaler.count(), total);

            for i in 0..DIM {
                let got = scaler.mean()[i];
                prop_assert!((got - mean[i]).abs() <= 1e-9 * (1.0 + mean[i].abs()),
                    "mean[{}]: {} vs {}", i, got, mean[i]);
                let got = scaler.variance()[i];
                let tol = 1e-9 * (1.0 + variance[i]);
                prop_assert!((got - variance[i]).abs() <= tol,
                    "variance[{}]: {} vs {}", i, got, variance[i]);
            }
        }

        /// Property: variance never goes negative after any update
        #[test]
        fn test_variance_non_negative(batches in batches(), shift in -1e9f64..1e9) {
            let mut scaler = Scaler::new(DIM).unwrap();
            for b in &batches {
                let shifted: Vec<Vec<f64>> = b
                    .iter()
                    .map(|row| row.iter().map(|x| x * 1e-6 + shift).collect())
                    .collect();
                scaler.update(&shifted).unwrap();
                prop_assert!(scaler.variance().iter().all(|&v| v >= 0.0));
            }
        }

        /// Property: the read-out is idempotent and matches the formula
        #[test]
        fn test_readout_formula(batches in batches()) {
            let mut scaler = Scaler::new(DIM).unwrap();
            for b in &batches {
                scaler.update(b).unwrap();
            }
            let a = scaler.current_scale_and_offset();
            let b = scaler.current_scale_and_offset();
            prop_assert_eq!(&a, &b);

            let variance = scaler.variance();
            for i in 0..DIM {
                prop_assert_eq!(a.scale[i], 1.0 / (variance[i].sqrt() + 0.1) / 3.0);
                prop_assert_eq!(a.offset[i], scaler.mean()[i]);
            }
        }
    }
}
