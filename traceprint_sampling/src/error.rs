//! Error types for the sampling primitives.

use thiserror::Error;

/// Errors that can occur during sampling.
#[derive(Debug, Error)]
pub enum SampleError {
    /// Asked for more distinct items than the population holds.
    #[error("cannot draw {requested} distinct items from a population of {available}")]
    NotEnoughItems { requested: usize, available: usize },

    /// Probability outside [0, 1].
    #[error("probability {0} outside [0, 1]")]
    InvalidProbability(f64),

    /// Weighted draw over a distribution with no usable mass.
    #[error("weighted draw over a degenerate distribution")]
    DegenerateDistribution,
}
