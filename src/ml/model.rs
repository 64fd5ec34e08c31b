// ============================================================
// Layer 5 — Model Config and Loaded Models
// ============================================================
// ModelConfig is the serialisable description of a model: which
// family, which architecture preset, and the sequence budgets its
// codec must respect. It is what a pipeline receives, what is
// written to {name}.model.json, and what evaluation rebuilds from.
//
// LogicModel is a built (or loaded) model of any family. Callers
// that need one particular family ask for it and get a
// ModelNotCompatibleError when the checkpoint holds another.

use anyhow::{ensure, Result};
use burn::prelude::*;

use crate::domain::{errors::ModelNotCompatibleError, kinds::ModelKind};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    bertnot::BertNot,
    decoder::TextDecoderConfig,
    encoder::TextEncoderConfig,
    fld::FldProver,
    generator::Seq2SeqConfig,
    presets::{preset, ArchConfig},
    proofwriter::ProofWriter,
    prover::{Prover, PROVER_LABELS},
    ruletaker::{RuleTaker, RULETAKER_LABELS},
};

// #[derive(Config)] supplies Clone, Serialize and Deserialize.
#[derive(Config, Debug)]
pub struct ModelConfig {
    pub kind:   ModelKind,
    pub preset: String,
    pub arch:   ArchConfig,
    /// Classification labels (ignored by the generators)
    #[config(default = 2)]
    pub num_labels:     usize,
    /// Embedding rows; filled in once the tokenizer exists
    #[config(default = 0)]
    pub vocab_size:     usize,
    #[config(default = 256)]
    pub max_seq_len:    usize,
    #[config(default = 128)]
    pub max_target_len: usize,
}

impl ModelConfig {
    /// A model of `kind` with the architecture named `preset_name`.
    pub fn from_preset(kind: ModelKind, preset_name: &str) -> Result<Self> {
        let num_labels = match kind {
            ModelKind::Prover => PROVER_LABELS,
            _                 => RULETAKER_LABELS,
        };
        Ok(Self::new(kind, preset_name.to_string(), preset(preset_name)?).with_num_labels(num_labels))
    }

    /// Err unless this config describes a model of `expected` kind.
    pub fn check_kind(&self, pipeline: &'static str, expected: ModelKind) -> Result<(), ModelNotCompatibleError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(ModelNotCompatibleError::new(pipeline, expected, self.kind))
        }
    }

    pub fn encoder_config(&self) -> TextEncoderConfig {
        TextEncoderConfig::new(
            self.vocab_size,
            self.max_seq_len,
            self.arch.d_model,
            self.arch.num_heads,
            self.arch.num_layers,
            self.arch.d_ff,
            self.arch.dropout,
        )
    }

    pub fn decoder_config(&self) -> TextDecoderConfig {
        TextDecoderConfig::new(
            self.vocab_size,
            self.max_target_len,
            self.arch.d_model,
            self.arch.num_heads,
            self.arch.num_layers,
            self.arch.d_ff,
            self.arch.dropout,
        )
    }

    pub fn seq2seq_config(&self) -> Seq2SeqConfig {
        Seq2SeqConfig::new(self.encoder_config(), self.decoder_config())
    }

    /// Build a freshly initialised model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<LogicModel<B>> {
        ensure!(self.vocab_size > 0, "vocab_size is not set; build the tokenizer first");
        ensure!(
            self.arch.d_model % self.arch.num_heads == 0,
            "d_model {} is not divisible by num_heads {}",
            self.arch.d_model,
            self.arch.num_heads
        );

        let model = match self.kind {
            ModelKind::RuleTaker   => LogicModel::RuleTaker(RuleTaker::new(self.encoder_config(), device)),
            ModelKind::BertNot     => LogicModel::BertNot(BertNot::new(self.encoder_config(), self.num_labels, device)),
            ModelKind::Prover      => LogicModel::Prover(Prover::new(self.encoder_config(), device)),
            ModelKind::ProofWriter => LogicModel::ProofWriter(ProofWriter::new(self.seq2seq_config(), device)),
            ModelKind::Fld         => LogicModel::Fld(FldProver::new(self.seq2seq_config(), device)),
        };
        Ok(model)
    }
}

/// A built model of any family.
#[derive(Debug)]
pub enum LogicModel<B: Backend> {
    RuleTaker(RuleTaker<B>),
    BertNot(BertNot<B>),
    Prover(Prover<B>),
    ProofWriter(ProofWriter<B>),
    Fld(FldProver<B>),
}

impl<B: Backend> LogicModel<B> {
    /// Rebuild the model described by `{name}.model.json` and load its weights.
    pub fn load(ckpt: &CheckpointManager, device: &B::Device) -> Result<(Self, ModelConfig)> {
        let cfg = ckpt.load_model_config()?;
        let model = match cfg.init::<B>(device)? {
            LogicModel::RuleTaker(m)   => LogicModel::RuleTaker(ckpt.load_weights::<B, _>(m, device)?),
            LogicModel::BertNot(m)     => LogicModel::BertNot(ckpt.load_weights::<B, _>(m, device)?),
            LogicModel::Prover(m)      => LogicModel::Prover(ckpt.load_weights::<B, _>(m, device)?),
            LogicModel::ProofWriter(m) => LogicModel::ProofWriter(ckpt.load_weights::<B, _>(m, device)?),
            LogicModel::Fld(m)         => LogicModel::Fld(ckpt.load_weights::<B, _>(m, device)?),
        };
        let best = ckpt.load_best()?;
        tracing::info!(
            epoch = best.epoch,
            val_loss = ?best.val_loss,
            "Loaded {} model '{}' from '{}'",
            cfg.kind,
            ckpt.name(),
            ckpt.dir().display()
        );
        Ok((model, cfg))
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            LogicModel::RuleTaker(_)   => ModelKind::RuleTaker,
            LogicModel::BertNot(_)     => ModelKind::BertNot,
            LogicModel::Prover(_)      => ModelKind::Prover,
            LogicModel::ProofWriter(_) => ModelKind::ProofWriter,
            LogicModel::Fld(_)         => ModelKind::Fld,
        }
    }

    fn mismatch(&self, user: &'static str, expected: ModelKind) -> ModelNotCompatibleError {
        ModelNotCompatibleError::new(user, expected, self.kind())
    }

    pub fn as_ruletaker(&self, user: &'static str) -> Result<&RuleTaker<B>, ModelNotCompatibleError> {
        match self {
            LogicModel::RuleTaker(m) => Ok(m),
            _ => Err(self.mismatch(user, ModelKind::RuleTaker)),
        }
    }

    pub fn as_bertnot(&self, user: &'static str) -> Result<&BertNot<B>, ModelNotCompatibleError> {
        match self {
            LogicModel::BertNot(m) => Ok(m),
            _ => Err(self.mismatch(user, ModelKind::BertNot)),
        }
    }

    pub fn as_prover(&self, user: &'static str) -> Result<&Prover<B>, ModelNotCompatibleError> {
        match self {
            LogicModel::Prover(m) => Ok(m),
            _ => Err(self.mismatch(user, ModelKind::Prover)),
        }
    }

    pub fn as_proofwriter(&self, user: &'static str) -> Result<&ProofWriter<B>, ModelNotCompatibleError> {
        match self {
            LogicModel::ProofWriter(m) => Ok(m),
            _ => Err(self.mismatch(user, ModelKind::ProofWriter)),
        }
    }

    pub fn as_fld(&self, user: &'static str) -> Result<&FldProver<B>, ModelNotCompatibleError> {
        match self {
            LogicModel::Fld(m) => Ok(m),
            _ => Err(self.mismatch(user, ModelKind::Fld)),
        }
    }
}
