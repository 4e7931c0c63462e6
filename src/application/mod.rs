// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Coordinates the other layers to evaluate every saved epoch of
// a model against one evaluation set.
//
// Rules for this layer:
//   - No tensor math or program interpretation here (Layer 5)
//   - No argument parsing or printing here (Layer 1)
//   - No direct file parsing here (Layers 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The multi-checkpoint inference workflow
pub mod infer_use_case;
