// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// Only one set of weights is ever kept per run: the epoch with
// the lowest validation loss overwrites the previous best.
//
// File naming convention ({name} = saved_model_name):
//   {saved_model_path}/
//     {name}.mpk.gz          ← weights of the best epoch
//     {name}.best.json       ← {"epoch": 3, "val_loss": 0.41}
//     {name}.model.json      ← model kind, preset, architecture, budgets
//     {name}.train.json      ← the TrainConfig of the run
//     {name}.tokenizer.json  ← vocabulary the model was trained with
//     {name}.metrics.csv     ← one row per epoch
//
// Weights only load into a module of the same shape, so readers
// rebuild the model from {name}.model.json before loading.

use anyhow::{anyhow, Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::ml::model::ModelConfig;

/// Which epoch the kept weights come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestCheckpoint {
    pub epoch:    usize,
    /// None when the validation set was empty
    pub val_loss: Option<f64>,
}

/// Manages saving and loading of one named checkpoint.
pub struct CheckpointManager {
    dir:  PathBuf,
    name: String,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir, name: name.into() })
    }

    /// Open an existing checkpoint without creating anything.
    pub fn open(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self { dir: dir.into(), name: name.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Weights path without extension; the recorder adds `.mpk.gz`.
    fn weights_path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    fn best_path(&self) -> PathBuf {
        self.dir.join(format!("{}.best.json", self.name))
    }

    pub fn model_config_path(&self) -> PathBuf {
        self.dir.join(format!("{}.model.json", self.name))
    }

    /// Overwrite the kept weights with `model` and record its epoch.
    pub fn save_best<B: Backend, M: Module<B>>(&self, model: &M, best: &BestCheckpoint) -> Result<()> {
        let path = self.weights_path();
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        fs::write(self.best_path(), serde_json::to_string_pretty(best)?)
            .with_context(|| format!("Failed to write '{}'", self.best_path().display()))?;

        tracing::debug!("Saved checkpoint '{}' (epoch {})", self.name, best.epoch);
        Ok(())
    }

    /// Load the kept weights into `model`, which must have the saved shape.
    pub fn load_weights<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M> {
        let path = self.weights_path();
        CompactRecorder::new()
            .load(path.clone(), device)
            .map(|record| model.load_record(record))
            .with_context(|| format!("No weights at '{}.mpk.gz'; run 'train' first", path.display()))
    }

    pub fn load_best(&self) -> Result<BestCheckpoint> {
        let path = self.best_path();
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'; run 'train' first", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Malformed '{}'", path.display()))
    }

    pub fn save_model_config(&self, cfg: &ModelConfig) -> Result<()> {
        let path = self.model_config_path();
        cfg.save(&path)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))?;
        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    pub fn load_model_config(&self) -> Result<ModelConfig> {
        let path = self.model_config_path();
        ModelConfig::load(&path).map_err(|e| {
            anyhow!(
                "Cannot read model config from '{}': {}. Make sure you have run 'train' first.",
                path.display(),
                e
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kinds::ModelKind;
    use crate::ml::ruletaker::RuleTaker;
    use burn::backend::NdArray;

    #[test]
    fn test_model_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "rt").unwrap();
        let cfg = ModelConfig::from_preset(ModelKind::RuleTaker, "tiny").unwrap().with_vocab_size(321);

        ckpt.save_model_config(&cfg).unwrap();
        let back = ckpt.load_model_config().unwrap();
        assert_eq!(back.kind, ModelKind::RuleTaker);
        assert_eq!(back.vocab_size, 321);
        assert_eq!(back.arch.d_model, cfg.arch.d_model);
        assert!(dir.path().join("rt.model.json").exists());
    }

    #[test]
    fn test_weights_and_best_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "rt").unwrap();
        let device = Default::default();
        let cfg = ModelConfig::from_preset(ModelKind::RuleTaker, "tiny")
            .unwrap()
            .with_vocab_size(50)
            .with_max_seq_len(16);
        let model: RuleTaker<NdArray> = RuleTaker::new(cfg.encoder_config(), &device);

        let best = BestCheckpoint { epoch: 2, val_loss: Some(0.5) };
        ckpt.save_best::<NdArray, _>(&model, &best).unwrap();
        assert_eq!(ckpt.load_best().unwrap(), best);

        let fresh: RuleTaker<NdArray> = RuleTaker::new(cfg.encoder_config(), &device);
        assert!(ckpt.load_weights::<NdArray, _>(fresh, &device).is_ok());
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::open(dir.path(), "nothing");
        assert!(ckpt.load_model_config().is_err());
        assert!(ckpt.load_best().is_err());
    }
}
