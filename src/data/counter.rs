// ============================================================
// Layer 4 — Example Counter
// ============================================================
// Counts the evaluation set before inference starts, either by
// example (one per non-empty line) or by word (whitespace
// separated tokens over all lines). The count is only reported;
// an unsupported method aborts the run before any checkpoint is
// touched.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::error::InferError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMethod {
    Example,
    Word,
}

impl CountMethod {
    /// Accepts "example" or "word"; anything else is InvalidValue.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "example" => Ok(Self::Example),
            "word" => Ok(Self::Word),
            other => Err(InferError::InvalidValue(format!(
                "runner.example_count_method must be 'example' or 'word', got '{other}'"
            ))
            .into()),
        }
    }

    pub fn count(&self, files: &[PathBuf]) -> Result<usize> {
        match self {
            Self::Example => example_num(files),
            Self::Word => word_num(files),
        }
    }
}

/// Number of non-empty lines across all files
pub fn example_num(files: &[PathBuf]) -> Result<usize> {
    let mut total = 0;
    for file in files {
        let text = fs::read_to_string(file)
            .with_context(|| format!("Cannot read '{}'", file.display()))?;
        total += text.lines().filter(|l| !l.trim().is_empty()).count();
    }
    Ok(total)
}

/// Number of whitespace-separated tokens across all files
pub fn word_num(files: &[PathBuf]) -> Result<usize> {
    let mut total = 0;
    for file in files {
        let text = fs::read_to_string(file)
            .with_context(|| format!("Cannot read '{}'", file.display()))?;
        total += text.split_whitespace().count();
    }
    Ok(total)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_methods() {
        assert_eq!(CountMethod::parse("example").unwrap(), CountMethod::Example);
        assert_eq!(CountMethod::parse("word").unwrap(), CountMethod::Word);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = CountMethod::parse("sentence").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InferError>(),
            Some(InferError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_counts_over_files() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("part-0");
        let b = dir.path().join("part-1");
        fs::write(&a, "1 2 3\n\n4 5\n").unwrap();
        fs::write(&b, "6\n").unwrap();
        let files = vec![a, b];

        assert_eq!(example_num(&files).unwrap(), 3);
        assert_eq!(word_num(&files).unwrap(), 6);
        assert_eq!(CountMethod::Word.count(&files).unwrap(), 6);
    }
}
