//! JSON export of experiment results.

use crate::error::EvalError;
use crate::metrics::UtilityMetric;
use crate::runner::{AccuracyReport, TrialSettings};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// One computed utility metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityResult {
    pub metric: UtilityMetric,
    pub value: f64,
}

/// Everything one experiment produced, in a single exportable record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentExport {
    /// Master seed the whole experiment derives from.
    pub seed: u64,

    /// Settings the experiment ran with.
    pub settings: TrialSettings,

    /// Detection-accuracy results.
    pub report: AccuracyReport,

    /// Utility metrics, if any were requested.
    pub utility: Vec<UtilityResult>,
}

impl ExperimentExport {
    /// Writes the record as pretty-printed JSON.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), EvalError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}
