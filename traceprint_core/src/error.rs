//! Error types for the fingerprinting core.

use thiserror::Error;

/// Errors that can occur in the core library.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Geo-point outside the configured bounding box.
    ///
    /// Out-of-range input is never clamped: clamping would silently
    /// corrupt the cell index arithmetic downstream.
    #[error("point ({lat}, {lng}) outside the configured bounding box")]
    PointOutOfRange { lat: f64, lng: f64 },

    /// Grid cell outside [0, grid_size) on either axis.
    #[error("cell ({x}, {y}) outside the {grid_size}x{grid_size} grid")]
    CellOutOfRange { x: i32, y: i32, grid_size: usize },

    /// Emission query over a neighborhood with zero total visits.
    #[error("no emission data in the neighborhood of cell ({x}, {y})")]
    NoEmissionData { x: i32, y: i32 },

    /// Fingerprinting probability must lie in [0, 1].
    #[error("invalid fingerprinting probability {0}: must lie in [0, 1]")]
    InvalidProbability(f64),

    /// Controller adjustment factor must lie in [0, 1].
    #[error("invalid adjustment factor {0}: must lie in [0, 1]")]
    InvalidTheta(f64),

    /// Detection requires at least one candidate trajectory.
    #[error("detection requires at least one candidate trajectory")]
    NoCandidates,

    /// Detection candidates must be position-aligned with the leak.
    #[error("candidate {index} has length {got}, expected {expected}")]
    LengthMismatch {
        index: usize,
        got: usize,
        expected: usize,
    },

    /// A statistical function that was never implemented.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// Error propagated from the sampling primitives.
    #[error(transparent)]
    Sample(#[from] traceprint_sampling::SampleError),
}
