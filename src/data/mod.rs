// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the evaluation files on disk and the named
// tensor batches the engine consumes.
//
//   test data dir
//       │
//       ▼
//   SlotFileReader    → lists files, streams lines, restartable
//       │
//       ▼
//   SlotBatcher       → parses "a b;c" lines into slot values
//       │                and stacks rows into [rows, dim] tensors
//       ▼
//   Batch             → fed to the InferenceEngine
//
// counter.rs sizes the evaluation set (examples or words) for
// the run log.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Restartable reader over the test data files
pub mod reader;

/// Line parsing and row stacking
pub mod batcher;

/// Example / word counting over the reader's file list
pub mod counter;
