// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model architectures and the training loop live here.
//
//   encoder / decoder   — transformer building blocks
//   classifier          — encoder + [CLS] head
//   generator           — encoder-decoder with greedy decoding
//
//   ruletaker, bertnot  — sequence classifiers
//   prover              — answer head + proof node head
//   proofwriter, fld    — generative provers
//
//   step                — StepModel: one batch → loss + accuracy
//   trainer             — fit(): Adam, validation, best checkpoint
//   model               — ModelConfig + LogicModel (any family)
//   presets             — named architecture sizes
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

pub mod encoder;
pub mod decoder;
pub mod classifier;
pub mod generator;

pub mod ruletaker;
pub mod bertnot;
pub mod prover;
pub mod proofwriter;
pub mod fld;

/// One-batch loss and accuracy shared by every model
pub mod step;

/// Generic training loop with best-checkpoint selection
pub mod trainer;

/// Serialisable model description and loaded models
pub mod model;

pub mod presets;
