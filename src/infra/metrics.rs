// ============================================================
// Layer 6 — Result Recorder
// ============================================================
// Collects the mean inference value of every checkpoint and
// dumps the whole structure to a text file at the end of a run.
//
// Output file: ./infer_result_dict.txt (overwritten every run)
//
// Example contents:
//   {"result": {"0001": 0.731, "0002": 0.748}}
//
// The dump is a printable representation, not a format meant
// for machine parsing. Nothing is written until every checkpoint
// has finished, so a failure mid-run leaves no file behind.

use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fmt, fs,
    path::PathBuf,
};

/// Default output location, relative to the working directory
pub const RESULT_FILE: &str = "./infer_result_dict.txt";

/// Checkpoint name → mean inference value, nested under "result".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferResultDict {
    result: BTreeMap<String, f64>,
}

impl InferResultDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, checkpoint: impl Into<String>, value: f64) {
        self.result.insert(checkpoint.into(), value);
    }

    #[cfg(test)]
    pub fn get(&self, checkpoint: &str) -> Option<f64> {
        self.result.get(checkpoint).copied()
    }

    pub fn len(&self) -> usize {
        self.result.len()
    }
}

impl fmt::Display for InferResultDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"result\": {:?}}}", self.result)
    }
}

/// Writes an InferResultDict to disk.
pub struct ResultRecorder {
    path: PathBuf,
}

impl ResultRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log the results and overwrite the output file with them.
    pub fn record(&self, results: &InferResultDict) -> Result<()> {
        tracing::info!("infer_result_dict: {}", results);
        fs::write(&self.path, results.to_string())
            .with_context(|| format!("Cannot write results to '{}'", self.path.display()))?;
        tracing::debug!("Wrote {} result(s) to '{}'", results.len(), self.path.display());
        Ok(())
    }
}

impl Default for ResultRecorder {
    fn default() -> Self {
        Self::new(RESULT_FILE)
    }
}
