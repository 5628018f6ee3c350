//! Traceprint Evaluation Harness
//!
//! Monte-Carlo evaluation of the fingerprinting triad: repeated
//! trials of copy distribution, attack simulation, and leak
//! attribution, plus utility metrics over the protected datasets.
//!
//! All entropy derives from a single master seed, so any trial is
//! reproducible from its seed number.

pub mod attack;
pub mod dataset;
mod error;
pub mod export;
pub mod metrics;
pub mod runner;

pub use attack::{forge_leak, Attack, AttackParams};
pub use dataset::DatasetGenerator;
pub use error::EvalError;
pub use export::{ExperimentExport, UtilityResult};
pub use metrics::{evaluate_utility, UtilityMetric};
pub use runner::{evaluate_detection_accuracy, AccuracyReport, TrialResult, TrialSettings};
