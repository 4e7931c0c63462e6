// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem on behalf of the
// driver, outside the data and model layers:
//
//   config.rs      — YAML run configuration
//                    Dotted-key lookup ("runner.use_gpu") over
//                    the parsed document, plus the typed
//                    RunnerConfig view the driver consumes.
//
//   checkpoint.rs  — Checkpoint discovery
//                    Scans the model-save directory for epoch
//                    sub-directories, falling back to the
//                    directory itself.
//
//   metrics.rs     — Result recording
//                    Holds checkpoint → mean value and dumps it
//                    to infer_result_dict.txt once at the end.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// YAML configuration loading and dotted-key lookup
pub mod config;

/// Epoch checkpoint directory scanning
pub mod checkpoint;

/// Per-checkpoint result collection and dump
pub mod metrics;
