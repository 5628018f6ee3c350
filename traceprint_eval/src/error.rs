//! Error types for the evaluation harness.

use thiserror::Error;

/// Errors that can occur while running evaluations.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A selector combination the harness does not support.
    #[error("unsupported option: {0}")]
    UnsupportedOption(String),

    /// A parameter violating the harness contract.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error propagated from the core library.
    #[error(transparent)]
    Core(#[from] traceprint_core::CoreError),

    /// Error propagated from the sampling primitives.
    #[error(transparent)]
    Sample(#[from] traceprint_sampling::SampleError),

    /// Result export failed.
    #[error("export error: {0}")]
    Io(#[from] std::io::Error),

    /// Result serialization failed.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
