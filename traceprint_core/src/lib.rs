//! Traceprint Core - Privacy-Preserving Trajectory Fingerprinting
//!
//! This library implements the fingerprinting triad:
//! 1. **Correlation**: a grid-discretized Markov transition/emission model
//!    built from historical trajectories
//! 2. **Embedding**: adaptive probabilistic substitution of trajectory cells,
//!    rate-held by a windowed feedback controller
//! 3. **Detection**: similarity-based attribution of a leaked copy to its
//!    most likely source

pub mod config;
pub mod correlation;
pub mod detection;
pub mod distance;
pub mod error;
pub mod fingerprint;
pub mod grid;
pub mod types;

// Re-export key types for convenience
pub use config::{Config, GpsBounds};
pub use correlation::{CandidateSets, CorrelationModel};
pub use detection::{similarity_detection, Detection};
pub use error::CoreError;
pub use fingerprint::{sample_candidate, Fingerprinted, Fingerprinter};
pub use grid::Grid;
pub use types::{GeoPoint, GeoTrajectory, GridCell, Trajectory, TrajectoryPoint};
