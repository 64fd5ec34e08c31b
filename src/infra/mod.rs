// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the checkpoint directory or the
// results directory:
//
//   checkpoint.rs      — Saving and loading model weights
//                        Uses Burn's CompactRecorder for the
//                        kept epoch and writes the ModelConfig
//                        as JSON so evaluation can rebuild the
//                        model before loading weights.
//
//   tokenizer_store.rs — Tokenizer persistence
//                        Builds a word-level tokenizer from the
//                        training corpus if none exists, or
//                        loads the saved one, so training and
//                        evaluation share one vocabulary.
//
//   metrics.rs         — One CSV row per training epoch
//
//   results.rs         — Score txt files and the FLD JSON report
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;

pub mod results;
