// ============================================================
// Layer 6 — Checkpoint Discovery
// ============================================================
// Finds the saved models to evaluate under the model-save
// directory.
//
// Training writes one sub-directory per epoch, named by the
// epoch number:
//
//   output_model/
//     0/            ← epoch 0 checkpoint
//     1/            ← epoch 1 checkpoint
//     ...
//
// Every numerically named sub-directory is one checkpoint. When
// there are none, the save directory itself is assumed to be a
// single flat checkpoint; if it holds no model the loader fails
// later, not here.
//
// Ordering is lexicographic on the full path. Epoch names that
// are not zero-padded ("2" vs "10") therefore come out of order.

use anyhow::Result;
use std::{fs, path::Path};

use crate::domain::checkpoint::CheckpointRef;
use crate::domain::error::InferError;

/// List the checkpoints under `base`, sorted by path.
pub fn discover_checkpoints(base: &Path) -> Result<Vec<CheckpointRef>> {
    let entries = fs::read_dir(base).map_err(|e| {
        InferError::Path(format!("cannot list '{}': {e}", base.display()))
    })?;

    let mut epoch_dirs = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let is_epoch = path.is_dir()
            && entry
                .file_name()
                .to_str()
                .map(is_number)
                .unwrap_or(false);
        if is_epoch {
            epoch_dirs.push(path);
        }
    }

    if epoch_dirs.is_empty() {
        tracing::debug!("No epoch sub-directories in '{}', using it directly", base.display());
        epoch_dirs.push(base.to_path_buf());
    }

    epoch_dirs.sort();
    tracing::info!("epoch_model_path_list: {:?}", epoch_dirs);

    Ok(epoch_dirs.into_iter().map(CheckpointRef::new).collect())
}

/// True when the whole string parses as a number ("3", "0007", "1.5", "-2", "1e3").
pub fn is_number(s: &str) -> bool {
    let s = s.trim();
    // Stricter than a Python float() check: "nan", "inf" and "1_0" are not
    // epoch numbers here. f64::from_str accepts the words, so reject them;
    // it already rejects underscores.
    let lowered = s.to_ascii_lowercase();
    let word = lowered.trim_start_matches(['+', '-']);
    if matches!(word, "inf" | "infinity" | "nan") {
        return false;
    }
    s.parse::<f64>().is_ok()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_numeric_subdirs_sorted() {
        let dir = tempdir().unwrap();
        for name in ["0003", "0001", "0002"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }

        let ckpts = discover_checkpoints(dir.path()).unwrap();
        let names: Vec<_> = ckpts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["0001", "0002", "0003"]);
        assert_eq!(ckpts[0].path, dir.path().join("0001"));
    }

    #[test]
    fn test_non_numeric_entries_ignored() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("5")).unwrap();
        fs::create_dir(dir.path().join("logs")).unwrap();
        // A numeric *file* is not a checkpoint
        fs::write(dir.path().join("7"), b"not a dir").unwrap();

        let ckpts = discover_checkpoints(dir.path()).unwrap();
        assert_eq!(ckpts.len(), 1);
        assert_eq!(ckpts[0].name, "5");
    }

    #[test]
    fn test_no_numeric_subdirs_falls_back_to_base() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("params")).unwrap();

        let ckpts = discover_checkpoints(dir.path()).unwrap();
        assert_eq!(ckpts.len(), 1);
        assert_eq!(ckpts[0].path, dir.path());
    }

    #[test]
    fn test_empty_dir_still_yields_base() {
        let dir = tempdir().unwrap();
        let ckpts = discover_checkpoints(dir.path()).unwrap();
        assert_eq!(ckpts.len(), 1);
        assert_eq!(ckpts[0].path, dir.path());
    }

    #[test]
    fn test_unpadded_names_sort_lexicographically() {
        let dir = tempdir().unwrap();
        for name in ["2", "10"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        let ckpts = discover_checkpoints(dir.path()).unwrap();
        let names: Vec<_> = ckpts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["10", "2"]);
    }

    #[test]
    fn test_missing_dir_is_path_error() {
        let dir = tempdir().unwrap();
        let err = discover_checkpoints(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err.downcast_ref::<InferError>(), Some(InferError::Path(_))));
    }

    #[test]
    fn test_is_number() {
        assert!(is_number("0001"));
        assert!(is_number("1.5"));
        assert!(is_number("-3"));
        assert!(is_number("1e3"));
        assert!(!is_number("epoch_1"));
        assert!(!is_number(""));
        assert!(!is_number("nan"));
        assert!(!is_number("inf"));
        assert!(!is_number("1_0"));
    }
}
