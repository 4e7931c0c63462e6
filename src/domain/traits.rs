// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The runner is written against these two seams only:
//
//   InferenceEngine → loads a serialized program from a
//                     checkpoint directory and executes it on
//                     one batch at a time
//   BatchReader     → restartable, multi-pass source of
//                     evaluation batches
//
// Implementations:
//   - BurnExecutor<B>  (ml::executor) implements InferenceEngine
//   - SlotFileReader   (data::reader) implements BatchReader
//   - tests provide in-memory fakes for both
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::scope::Scope;
use crate::domain::tensor::{Batch, HostTensor};

// ─── LoadedModel ──────────────────────────────────────────────────────────────
/// A program plus the feed / fetch variable names it was saved with.
#[derive(Debug, Clone)]
pub struct LoadedModel<P> {
    pub program: P,
    pub feed_names: Vec<String>,
    pub fetch_names: Vec<String>,
}

// ─── InferenceEngine ──────────────────────────────────────────────────────────
/// Anything that can load and run an inference program.
///
/// The engine owns no variable state of its own: persistable
/// variables live in the caller-supplied Scope.
pub trait InferenceEngine {
    /// Engine-specific representation of a loaded program
    type Program;

    /// Load the program saved under `dir`, creating any persistable
    /// variables it declares in `scope` if they are not there yet.
    fn load_inference_model(
        &self,
        dir: &Path,
        scope: &mut Scope,
    ) -> Result<LoadedModel<Self::Program>>;

    /// Execute `program` on one batch and return one tensor per
    /// fetch target, in fetch order.
    fn run(
        &self,
        model: &LoadedModel<Self::Program>,
        feed: &Batch,
        scope: &mut Scope,
    ) -> Result<Vec<HostTensor>>;
}

// ─── BatchReader ──────────────────────────────────────────────────────────────
/// A data source that can be iterated from the beginning any
/// number of times.
pub trait BatchReader {
    /// Fresh pass over all batches, starting from the first file.
    fn batches(&self) -> Box<dyn Iterator<Item = Result<Batch>> + '_>;

    /// The files this reader was built from
    fn file_list(&self) -> &[PathBuf];
}
