// ============================================================
// Layer 5 — ML / Execution Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly, only this one.
//
// What's in this layer:
//
//   model.rs      — The network definition taken from the run
//                   config: the ordered feed slots the reader
//                   fills for every batch
//
//   program.rs    — The serialized inference program stored in
//                   each checkpoint (__model__.json): feed and
//                   fetch names, params, persistables, op list
//
//   executor.rs   — Interprets a program on a Burn backend
//                   (NdArray on CPU, Wgpu on GPU) against the
//                   caller's Scope
//
//   inferencer.rs — Evaluates one checkpoint end to end and
//                   reduces all fetched values to one mean
//
// Reference: Burn Book §3 (Building Blocks)

/// Feed slot definition from the run config
pub mod model;

/// Checkpoint program format and validation
pub mod program;

/// Burn-backed program interpreter
pub mod executor;

/// Per-checkpoint evaluation loop
pub mod inferencer;
