// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from JSON Lines corpora all
// the way to tensor batches.
//
//   {root}/{corpus}/.../{split}.jsonl
//       │
//       ▼
//   loader            → reads JSONL records with line numbers
//       │
//       ▼
//   *Dataset          → RuleTaker / ProofWriter / TE / FLD items
//       │
//       ▼
//   TextCodec         → items to fixed-length token id samples
//       │
//       ▼
//   SampleDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   *Batcher          → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads JSON Lines corpora and resolves split paths
pub mod loader;

/// RuleTaker question answering over theories
pub mod ruletaker;

/// ProofWriter theories, questions and proofs
pub mod proofwriter;

/// SNLI / MNLI / RTE and their negated variants
pub mod te;

/// Formal Logic Deduction prompts and proofs
pub mod fld;

/// Tokenisation and fixed-length layouts for every model kind
pub mod codec;

/// Encoded sample types and Burn's Dataset over them
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded train/validation carve-out
pub mod splitter;
