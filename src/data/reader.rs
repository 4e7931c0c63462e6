// ============================================================
// Layer 4 — Slot File Reader
// ============================================================
// Reads the evaluation set from every regular file in the test
// data directory (sorted by path) and yields batches of
// `batch_size` examples. The last batch may be shorter.
//
// The reader is built once per run and iterated once per
// checkpoint: each call to `batches()` starts a fresh pass from
// the first line of the first file. Files are streamed line by
// line, so memory use is bounded by one batch.

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufRead, BufReader, Lines},
    path::{Path, PathBuf},
};

use crate::data::batcher::{Example, SlotBatcher};
use crate::domain::error::InferError;
use crate::domain::tensor::{Batch, FeedSlot};
use crate::domain::traits::BatchReader;

pub struct SlotFileReader {
    files: Vec<PathBuf>,
    batcher: SlotBatcher,
    batch_size: usize,
}

impl SlotFileReader {
    /// Build a reader over every file in `data_dir`.
    pub fn new(data_dir: &Path, slots: Vec<FeedSlot>, batch_size: usize) -> Result<Self> {
        let files = list_data_files(data_dir)?;
        tracing::info!(
            "Infer reader: {} file(s) in '{}', batch size {}",
            files.len(),
            data_dir.display(),
            batch_size
        );
        Ok(Self::from_files(files, slots, batch_size))
    }

    pub fn from_files(files: Vec<PathBuf>, slots: Vec<FeedSlot>, batch_size: usize) -> Self {
        Self {
            files,
            batcher: SlotBatcher::new(slots),
            batch_size: batch_size.max(1),
        }
    }
}

impl BatchReader for SlotFileReader {
    fn batches(&self) -> Box<dyn Iterator<Item = Result<Batch>> + '_> {
        Box::new(SlotBatches {
            reader: self,
            next_file: 0,
            current: None,
            finished: false,
        })
    }

    fn file_list(&self) -> &[PathBuf] {
        &self.files
    }
}

/// Regular files directly under `dir`, sorted by path.
fn list_data_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        InferError::Path(format!("cannot list test data dir '{}': {e}", dir.display()))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ─── Iterator ─────────────────────────────────────────────────────────────────

struct OpenFile {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

struct SlotBatches<'a> {
    reader: &'a SlotFileReader,
    next_file: usize,
    current: Option<OpenFile>,
    finished: bool,
}

impl SlotBatches<'_> {
    /// Next non-empty example, moving across file boundaries.
    fn next_example(&mut self) -> Result<Option<Example>> {
        loop {
            if self.current.is_none() {
                let Some(path) = self.reader.files.get(self.next_file) else {
                    return Ok(None);
                };
                self.next_file += 1;
                let file = File::open(path)
                    .with_context(|| format!("Cannot open '{}'", path.display()))?;
                self.current = Some(OpenFile {
                    path: path.clone(),
                    lines: BufReader::new(file).lines(),
                    line_no: 0,
                });
            }

            let Some(open) = self.current.as_mut() else {
                continue;
            };
            match open.lines.next() {
                Some(line) => {
                    let line = line
                        .with_context(|| format!("Cannot read '{}'", open.path.display()))?;
                    open.line_no += 1;
                    if line.trim().is_empty() {
                        continue;
                    }
                    let origin = format!("{}:{}", open.path.display(), open.line_no);
                    return self.reader.batcher.parse_line(&line, &origin).map(Some);
                }
                None => self.current = None,
            }
        }
    }
}

impl Iterator for SlotBatches<'_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut items = Vec::with_capacity(self.reader.batch_size);
        while items.len() < self.reader.batch_size {
            match self.next_example() {
                Ok(Some(ex)) => items.push(ex),
                Ok(None) => break,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }

        if items.is_empty() {
            self.finished = true;
            return None;
        }
        Some(Ok(self.reader.batcher.batch(&items)))
    }
}
