// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that describe what an
// inference run IS, independent of how tensors get computed.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain data, the error taxonomy and the seams
//     (traits) that the other layers implement
//
// The execution engine's variable scope lives here too, as an
// ordinary struct. The engine receives it by &mut instead of
// reaching for process-wide state, so the runner can be driven
// by a fake engine in tests.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Dense host-side tensor and a named batch of them
pub mod tensor;

// Named variable storage shared between runner and engine
pub mod scope;

// A checkpoint directory and its display name
pub mod checkpoint;

// Error taxonomy for the whole run
pub mod error;

// Engine and reader seams
pub mod traits;
