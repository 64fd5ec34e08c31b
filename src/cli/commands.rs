// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `train`, `evaluate` and `predict`.
//
// Model kinds, accelerators and corpora parse through their
// FromStr impls in the domain layer, so a typo is reported by
// clap before anything runs.
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::application::{
    evaluate_use_case::EvaluateConfig,
    predict_use_case::PredictConfig,
    train_use_case::TrainConfig,
};
use crate::domain::kinds::{Accelerator, ModelKind};
use crate::ml::{model::ModelConfig, presets::default_preset};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a model with one of the five pipelines
    Train(TrainArgs),

    /// Score a saved checkpoint and write result files
    Evaluate(EvaluateArgs),

    /// Run one example through a saved checkpoint
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Model family: ruletaker, prover, proofwriter, bertnot, fld
    #[arg(long)]
    pub model: ModelKind,

    /// Pipeline to train with; defaults to the model's own
    #[arg(long)]
    pub pipeline: Option<ModelKind>,

    /// Architecture preset, e.g. tiny, roberta-large, t5-base
    #[arg(long)]
    pub preset: Option<String>,

    /// Directory containing the corpora
    #[arg(long, default_value = "data")]
    pub data_root: String,

    /// Corpus variant (depth-5, birds-electricity, ...) or snli/mnli/rte for bertnot
    #[arg(long, default_value = "depth-5")]
    pub dataset_name: String,

    /// Directory for the checkpoint, tokenizer and metrics
    #[arg(long, default_value = "models")]
    pub saved_model_path: String,

    /// Checkpoint file stem; defaults to best_{model}
    #[arg(long)]
    pub saved_model_name: Option<String>,

    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1)]
    pub epochs: usize,

    /// cpu (NdArray) or gpu (Wgpu)
    #[arg(long, default_value = "cpu")]
    pub accelerator: Accelerator,

    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Token budget of encoder inputs
    #[arg(long, default_value_t = 256)]
    pub max_seq_len: usize,

    /// Token budget of generated targets (proofwriter, fld)
    #[arg(long, default_value_t = 128)]
    pub max_target_len: usize,

    /// Most corpus words kept in a new vocabulary
    #[arg(long, default_value_t = 30000)]
    pub max_vocab: usize,

    /// Cap on examples per split (fld)
    #[arg(long)]
    pub max_samples: Option<usize>,

    /// Shuffle training batches with this seed
    #[arg(long)]
    pub shuffle_seed: Option<u64>,
}

impl TrainArgs {
    /// The model instance handed to the pipeline.
    pub fn model_config(&self) -> Result<ModelConfig> {
        let preset = self.preset.as_deref().unwrap_or(default_preset(self.model));
        Ok(ModelConfig::from_preset(self.model, preset)?
            .with_max_seq_len(self.max_seq_len)
            .with_max_target_len(self.max_target_len))
    }

    pub fn pipeline(&self) -> ModelKind {
        self.pipeline.unwrap_or(self.model)
    }
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            saved_model_name: a.saved_model_name.unwrap_or_else(|| format!("best_{}", a.model)),
            data_root:        a.data_root,
            dataset_name:     a.dataset_name,
            saved_model_path: a.saved_model_path,
            batch_size:       a.batch_size,
            epochs:           a.epochs,
            accelerator:      a.accelerator,
            learning_rate:    a.learning_rate,
            max_vocab:        a.max_vocab,
            max_samples:      a.max_samples,
            shuffle_seed:     a.shuffle_seed,
        }
    }
}

/// All arguments for the `evaluate` command.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory the checkpoint was saved to
    #[arg(long, default_value = "models")]
    pub saved_model_path: String,

    #[arg(long)]
    pub saved_model_name: String,

    /// Evaluation script; defaults to the saved model's family
    #[arg(long)]
    pub script: Option<ModelKind>,

    #[arg(long, default_value = "data")]
    pub data_root: String,

    /// Datasets to score (repeatable). Defaults to depth-5 and
    /// birds-electricity; a TE corpus for bertnot; the variant for fld
    #[arg(long = "dataset")]
    pub datasets: Vec<String>,

    #[arg(long, default_value = "results")]
    pub results_dir: String,

    #[arg(long, default_value = "cpu")]
    pub accelerator: Accelerator,

    /// Cap on test examples (fld)
    #[arg(long)]
    pub max_samples: Option<usize>,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            data_root:        a.data_root,
            saved_model_path: a.saved_model_path,
            saved_model_name: a.saved_model_name,
            results_dir:      a.results_dir,
            accelerator:      a.accelerator,
            script:           a.script,
            datasets:         a.datasets,
            max_samples:      a.max_samples,
        }
    }
}

/// All arguments for the `predict` command.
/// Which inputs are needed depends on the saved model.
#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(long, default_value = "models")]
    pub saved_model_path: String,

    #[arg(long)]
    pub saved_model_name: String,

    #[arg(long)]
    pub accelerator: Option<Accelerator>,

    /// ruletaker, proofwriter: the theory as plain text
    #[arg(long)]
    pub context: Option<String>,

    /// ruletaker, prover, proofwriter
    #[arg(long)]
    pub question: Option<String>,

    /// prover, proofwriter: one fact sentence (repeatable)
    #[arg(long = "fact")]
    pub facts: Vec<String>,

    /// prover, proofwriter: one rule sentence (repeatable)
    #[arg(long = "rule")]
    pub rules: Vec<String>,

    /// bertnot
    #[arg(long)]
    pub premise: Option<String>,

    /// bertnot
    #[arg(long)]
    pub hypothesis: Option<String>,

    /// fld: the serialised prompt
    #[arg(long)]
    pub prompt: Option<String>,
}

impl From<PredictArgs> for PredictConfig {
    fn from(a: PredictArgs) -> Self {
        PredictConfig {
            saved_model_path: a.saved_model_path,
            saved_model_name: a.saved_model_name,
            accelerator:      a.accelerator,
            context:          a.context,
            question:         a.question,
            facts:            a.facts,
            rules:            a.rules,
            premise:          a.premise,
            hypothesis:       a.hypothesis,
            prompt:           a.prompt,
        }
    }
}
