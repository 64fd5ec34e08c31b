// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that describe the
// reasoning tasks this toolkit trains and evaluates on.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only data types, label mappings and pure scoring code
//
// Everything here can be unit tested without a device.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Per-example tuples produced by the dataset classes
pub mod examples;

// Model kinds, accelerators, dataset splits
pub mod kinds;

// The typed pipeline error
pub mod errors;

// Accuracy and per-depth score aggregation
pub mod scores;

// FLD proof metrics
pub mod proof_metrics;

// Core abstractions (traits) that other layers implement
pub mod traits;
