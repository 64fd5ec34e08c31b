// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Hands a model to one of the five training pipelines:
//
//   Step 1: Save the run config        (Layer 6 - infra)
//   Step 2: Run the chosen pipeline    (Layer 2 - pipelines)
//
// The pipeline is chosen separately from the model so that a
// mismatched pair fails the same way a script calling the wrong
// pipeline would: with a ModelNotCompatibleError.
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::application::pipelines::{
    bertnot_pipeline, fld_pipeline, proofwriter_pipeline, prover_pipeline, ruletaker_pipeline,
};
use crate::domain::kinds::{Accelerator, ModelKind};
use crate::ml::{model::ModelConfig, trainer::FitSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a pipeline needs besides the model itself.
// Serialisable so every run leaves a record of how it was trained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Directory holding ruletaker/, proofwriter/, snli/, fld/ ...
    pub data_root:        String,
    /// Corpus variant, e.g. "depth-5"; the TE corpus name for BERTNOT
    pub dataset_name:     String,
    pub saved_model_path: String,
    pub saved_model_name: String,
    pub batch_size:       usize,
    pub epochs:           usize,
    pub accelerator:      Accelerator,
    pub learning_rate:    f64,
    /// Upper bound on corpus words in a freshly built vocabulary
    pub max_vocab:        usize,
    /// FLD only: cap on examples per split
    pub max_samples:      Option<usize>,
    /// Shuffle the training loader with this seed; None keeps file order
    pub shuffle_seed:     Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_root:        "data".to_string(),
            dataset_name:     "depth-5".to_string(),
            saved_model_path: "models".to_string(),
            saved_model_name: "best_model".to_string(),
            batch_size:       8,
            epochs:           1,
            accelerator:      Accelerator::Cpu,
            learning_rate:    1e-3,
            max_vocab:        30000,
            max_samples:      None,
            shuffle_seed:     None,
        }
    }
}

impl TrainConfig {
    pub fn data_root(&self) -> &Path {
        Path::new(&self.data_root)
    }

    /// `{saved_model_path}/{saved_model_name}.train.json`
    pub fn save(&self) -> Result<()> {
        let dir = Path::new(&self.saved_model_path);
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        let path = dir.join(format!("{}.train.json", self.saved_model_name));
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved train config to '{}'", path.display());
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config:   TrainConfig,
    model:    ModelConfig,
    pipeline: ModelKind,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig, model: ModelConfig, pipeline: ModelKind) -> Self {
        Self { config, model, pipeline }
    }

    pub fn execute(&self) -> Result<FitSummary> {
        let cfg = &self.config;

        // ── Step 1: Record how this run was configured ───────────────────────
        cfg.save()?;

        // ── Step 2: Run the pipeline ─────────────────────────────────────────
        tracing::info!(
            "Training {} ({}) with the {} pipeline on '{}'",
            self.model.kind, self.model.preset, self.pipeline, cfg.dataset_name
        );
        match self.pipeline {
            ModelKind::RuleTaker   => ruletaker_pipeline(&self.model, cfg),
            ModelKind::Prover      => prover_pipeline(&self.model, cfg),
            ModelKind::ProofWriter => proofwriter_pipeline(&self.model, cfg),
            ModelKind::BertNot     => bertnot_pipeline(&self.model, cfg),
            ModelKind::Fld         => fld_pipeline(&self.model, cfg),
        }
    }
}
