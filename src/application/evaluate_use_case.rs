// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a trained checkpoint on held-out data:
//
//   Step 1: Rebuild the model from {name}.model.json + weights
//   Step 2: Reload the tokenizer it was trained with
//   Step 3: Run the evaluation script for the model family
//   Step 4: Write one result file per score
//
// Result files (in results_dir):
//   ruletaker_{d}_{k}.txt, ruletaker_{d}.txt      per depth k / overall
//   prover_{d}_{k}.txt,    prover_{d}.txt
//   proofwriter_{d}_{k}.txt, proofwriter_{d}.txt
//   bertnot_val_{x}.txt,   bertnot_neg_{x}.txt
//   fld_results.json
//
// Evaluation runs on the inner (non-autodiff) backend.

use anyhow::{anyhow, Result};
use burn::{prelude::Backend, tensor::backend::AutodiffBackend};
use std::path::{Path, PathBuf};

use crate::application::backend::{on_accelerator, BackendTask};
use crate::data::{
    codec::TextCodec,
    fld::FldDataset,
    proofwriter::{ProofWriterDataset, ProofWriterTask},
    ruletaker::RuleTakerDataset,
    te::TeDataset,
};
use crate::domain::{
    examples::{parse_facts_rules, TeItem},
    kinds::{Accelerator, ModelKind, Split, TeCorpus},
    proof_metrics::{compute_proof_metrics, ProofMetricAccumulator},
    scores::{accuracy_score, DepthScores},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    results::ResultWriter,
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    bertnot::{BertNot, TE_TASK},
    fld::FldProver,
    model::LogicModel,
    proofwriter::ProofWriter,
    prover::Prover,
    ruletaker::RuleTaker,
};

/// ProofWriter datasets scored when none are named.
pub const DEFAULT_PROOFWRITER_DATASETS: [&str; 2] = ["depth-5", "birds-electricity"];

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub data_root:        String,
    pub saved_model_path: String,
    pub saved_model_name: String,
    pub results_dir:      String,
    pub accelerator:      Accelerator,
    /// Which script to run; defaults to the family of the saved model
    pub script:           Option<ModelKind>,
    /// Dataset names for the question-answering scripts, the TE corpus for bertnot,
    /// the FLD variant for fld
    pub datasets:         Vec<String>,
    pub max_samples:      Option<usize>,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    /// Returns the paths of every result file written.
    pub fn execute(&self) -> Result<Vec<PathBuf>> {
        on_accelerator(self.config.accelerator, EvalJob { cfg: &self.config })
    }
}

struct EvalJob<'a> {
    cfg: &'a EvaluateConfig,
}

impl BackendTask for EvalJob<'_> {
    type Output = Vec<PathBuf>;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<Vec<PathBuf>> {
        let cfg = self.cfg;

        // ── Step 1: Model ────────────────────────────────────────────────────
        let ckpt = CheckpointManager::open(&cfg.saved_model_path, &cfg.saved_model_name);
        let (model, model_cfg) = LogicModel::<B::InnerBackend>::load(&ckpt, &device)?;

        // ── Step 2: Tokenizer ────────────────────────────────────────────────
        let tokenizer = TokenizerStore::new(&cfg.saved_model_path, &cfg.saved_model_name).load()?;
        let codec = TextCodec::new(tokenizer, model_cfg.max_seq_len, model_cfg.max_target_len)?;

        // ── Step 3 + 4: Script and result files ──────────────────────────────
        let writer = ResultWriter::new(&cfg.results_dir)?;
        let root = Path::new(&cfg.data_root);
        let script = cfg.script.unwrap_or(model.kind());

        match script {
            ModelKind::RuleTaker => {
                let model = model.as_ruletaker("ruletaker evaluation")?;
                evaluate_ruletaker(model, &codec, root, &question_datasets(cfg), &writer)
            }
            ModelKind::Prover => {
                let model = model.as_prover("prover evaluation")?;
                evaluate_prover(model, &codec, root, &question_datasets(cfg), &writer)
            }
            ModelKind::ProofWriter => {
                let model = model.as_proofwriter("proofwriter evaluation")?;
                evaluate_proofwriter(model, &codec, root, &question_datasets(cfg), &writer)
            }
            ModelKind::BertNot => {
                let model = model.as_bertnot("bertnot evaluation")?;
                let mut paths = Vec::new();
                for corpus in te_corpora(cfg)? {
                    paths.extend(evaluate_bertnot(model, &codec, root, corpus, &writer)?);
                }
                Ok(paths)
            }
            ModelKind::Fld => {
                let model = model.as_fld("fld evaluation")?;
                let name = cfg
                    .datasets
                    .first()
                    .ok_or_else(|| anyhow!("fld evaluation needs a dataset name"))?;
                Ok(vec![evaluate_fld(model, &codec, root, name, cfg.max_samples, &writer)?])
            }
        }
    }
}

fn question_datasets(cfg: &EvaluateConfig) -> Vec<String> {
    if cfg.datasets.is_empty() {
        DEFAULT_PROOFWRITER_DATASETS.iter().map(|s| s.to_string()).collect()
    } else {
        cfg.datasets.clone()
    }
}

/// The named entailment corpora, or all three when none are named.
fn te_corpora(cfg: &EvaluateConfig) -> Result<Vec<TeCorpus>> {
    if cfg.datasets.is_empty() {
        return Ok(TeCorpus::ALL.to_vec());
    }
    cfg.datasets
        .iter()
        .map(|name| name.parse().map_err(|e: String| anyhow!(e)))
        .collect()
}

// ─── Progress ─────────────────────────────────────────────────────────────────

/// Logs every tenth of the way through an evaluation set.
struct Progress {
    label: String,
    total: usize,
    done:  usize,
    every: usize,
}

impl Progress {
    fn new(label: impl Into<String>, total: usize) -> Self {
        let label = label.into();
        tracing::info!("Evaluating {label} ({total} examples)");
        Self { label, total, done: 0, every: (total / 10).max(1) }
    }

    fn inc(&mut self) {
        self.done += 1;
        if self.done % self.every == 0 && self.done < self.total {
            tracing::info!("{}: {}/{}", self.label, self.done, self.total);
        }
    }

    fn finish(self) {
        tracing::info!("{}: done ({} examples)", self.label, self.done);
    }
}

// ─── Scripts ──────────────────────────────────────────────────────────────────

/// Write `{prefix}_{dataset}_{k}.txt` per depth and `{prefix}_{dataset}.txt`.
fn write_depth_scores(
    writer:  &ResultWriter,
    prefix:  &str,
    dataset: &str,
    scores:  &DepthScores,
) -> Result<Vec<PathBuf>> {
    if scores.is_empty() {
        tracing::warn!("{prefix} on {dataset}: no test examples, every score is NaN");
    } else {
        tracing::info!("{prefix} on {dataset}: {} examples scored", scores.len());
    }

    let mut paths = Vec::new();
    for (depth, acc) in scores.per_depth() {
        paths.push(writer.write_score(&format!("{prefix}_{dataset}_{depth}"), acc)?);
    }
    paths.push(writer.write_score(&format!("{prefix}_{dataset}"), scores.overall())?);
    Ok(paths)
}

pub fn evaluate_ruletaker<B: Backend>(
    model:    &RuleTaker<B>,
    codec:    &TextCodec,
    root:     &Path,
    datasets: &[String],
    writer:   &ResultWriter,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for name in datasets {
        let dataset = RuleTakerDataset::new(root, name, Split::Test)?;
        let mut progress = Progress::new(dataset.to_string(), dataset.items().len());
        let mut scores = DepthScores::new();

        for item in dataset.items() {
            let pred = model.predict(codec, &item.context, &item.question)?;
            scores.push(item.depth, pred, item.label);
            progress.inc();
        }
        progress.finish();
        paths.extend(write_depth_scores(writer, "ruletaker", name, &scores)?);
    }
    Ok(paths)
}

pub fn evaluate_prover<B: Backend>(
    model:    &Prover<B>,
    codec:    &TextCodec,
    root:     &Path,
    datasets: &[String],
    writer:   &ResultWriter,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for name in datasets {
        let dataset = ProofWriterDataset::new(root, name, Split::Test, ProofWriterTask::ProofGenerationAll)?;
        let mut progress = Progress::new(dataset.to_string(), dataset.items().len());
        let mut scores = DepthScores::new();

        for item in dataset.items() {
            let pred = model.predict(codec, &item.facts, &item.rules, &item.question)?;
            scores.push(item.depth, pred, item.answer.label_id());
            progress.inc();
        }
        progress.finish();
        paths.extend(write_depth_scores(writer, "prover", name, &scores)?);
    }
    Ok(paths)
}

/// A generated answer counts as True when it mentions "true" anywhere.
pub fn generated_label(text: &str) -> usize {
    usize::from(text.to_lowercase().contains("true"))
}

pub fn evaluate_proofwriter<B: Backend>(
    model:    &ProofWriter<B>,
    codec:    &TextCodec,
    root:     &Path,
    datasets: &[String],
    writer:   &ResultWriter,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for name in datasets {
        let dataset = ProofWriterDataset::new(root, name, Split::Test, ProofWriterTask::ProofGenerationAll)?;
        let mut progress = Progress::new(dataset.to_string(), dataset.items().len());
        let mut scores = DepthScores::new();

        for item in dataset.items() {
            let context = parse_facts_rules(&item.facts, &item.rules);
            let generated = model.predict(codec, &context, &item.question)?;
            scores.push(item.depth, generated_label(&generated), item.answer.label_id());
            progress.inc();
        }
        progress.finish();
        paths.extend(write_depth_scores(writer, "proofwriter", name, &scores)?);
    }
    Ok(paths)
}

pub fn evaluate_bertnot<B: Backend>(
    model:  &BertNot<B>,
    codec:  &TextCodec,
    root:   &Path,
    corpus: TeCorpus,
    writer: &ResultWriter,
) -> Result<Vec<PathBuf>> {
    let score = |label: String, items: &[TeItem]| -> Result<f64> {
        let mut progress = Progress::new(label, items.len());
        let mut preds = Vec::with_capacity(items.len());
        let mut trues = Vec::with_capacity(items.len());
        for item in items {
            preds.push(model.predict(codec, &item.premise, &item.hypothesis, TE_TASK)?);
            trues.push(item.label);
            progress.inc();
        }
        progress.finish();
        Ok(accuracy_score(&preds, &trues))
    };

    let val = TeDataset::new(root, corpus, Split::Val)?;
    let negated = TeDataset::negated(root, corpus)?;

    Ok(vec![
        writer.write_score(&format!("bertnot_val_{corpus}"), score(val.to_string(), val.items())?)?,
        writer.write_score(&format!("bertnot_neg_{corpus}"), score(negated.to_string(), negated.items())?)?,
    ])
}

pub fn evaluate_fld<B: Backend>(
    model:       &FldProver<B>,
    codec:       &TextCodec,
    root:        &Path,
    name:        &str,
    max_samples: Option<usize>,
    writer:      &ResultWriter,
) -> Result<PathBuf> {
    let dataset = FldDataset::new(root, name, Split::Test, max_samples)?;
    let mut progress = Progress::new(dataset.to_string(), dataset.items().len());
    let mut metrics = ProofMetricAccumulator::new();

    for item in dataset.items() {
        let generated = model.predict(codec, &item.prompt_serial)?;
        metrics.add(item.depth, &compute_proof_metrics(&generated, &item.proof_serial));
        progress.inc();
    }
    progress.finish();

    writer.write_json("fld_results.json", &metrics.means())
}
