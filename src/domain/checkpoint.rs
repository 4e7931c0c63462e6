// ============================================================
// Layer 3 — Checkpoint Reference
// ============================================================
// A saved model snapshot is identified by its directory. The
// name recorded in the result file is the last path segment,
// e.g. ".../model_save/0003" → "0003".

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CheckpointRef {
    /// Directory holding the serialized program
    pub path: PathBuf,

    /// Trailing path segment, used as the result key
    pub name: String,
}

impl CheckpointRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = trailing_segment(&path);
        Self { path, name }
    }
}

fn trailing_segment(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
