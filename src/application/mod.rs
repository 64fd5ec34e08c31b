// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to train, evaluate, or predict.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Runtime choice of Burn backend
pub mod backend;

// The five training pipelines
pub mod pipelines;

// The training workflow
pub mod train_use_case;

// Evaluation scripts and result files
pub mod evaluate_use_case;

// Single-example prediction
pub mod predict_use_case;
