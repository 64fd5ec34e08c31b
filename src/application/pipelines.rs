// ============================================================
// Layer 2 — Training Pipelines
// ============================================================
// One pipeline per model family. Each follows the same steps:
//
//   Step 1: Check the model belongs to this pipeline
//   Step 2: Load train + val (carve val from train if absent)
//   Step 3: Build this model's tokenizer, fix the vocab size
//   Step 4: Save the model config next to the checkpoint
//   Step 5: Encode every item with the TextCodec
//   Step 6: Build DataLoaders and run fit() on the backend
//
// Steps 3-6 are shared; a pipeline only decides which corpus
// to read and how an item becomes a sample.
//
// Reference: Burn Book §5 (Training), §6 (Dataset, DataLoader)

use anyhow::{anyhow, bail, Result};
use burn::{
    data::{
        dataloader::{batcher::Batcher, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::AutodiffModule,
    tensor::backend::AutodiffBackend,
};
use std::{fmt::Debug, path::Path};

use crate::application::{
    backend::{on_accelerator, BackendTask},
    train_use_case::TrainConfig,
};
use crate::data::{
    batcher::{ClassificationBatcher, ProverBatcher, Seq2SeqBatcher},
    codec::{proofwriter_source, TextCodec},
    dataset::{ClassificationSample, ProverSample, SampleDataset, Seq2SeqSample},
    fld::FldDataset,
    loader::split_path,
    proofwriter::{ProofWriterDataset, ProofWriterTask},
    ruletaker::RuleTakerDataset,
    splitter::{carve_validation, SPLIT_SEED, VAL_FRACTION},
    te::TeDataset,
};
use crate::domain::{
    examples::{parse_facts_rules, FldItem, ProofWriterItem, RuleTakerItem, TeItem},
    kinds::{ModelKind, Split, TeCorpus},
    traits::{collect_corpus, CorpusText},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    model::{LogicModel, ModelConfig},
    step::StepModel,
    trainer::{fit, FitOptions, FitSummary, ValidBatch},
};

// ─── Pipelines ────────────────────────────────────────────────────────────────

/// Train a RuleTaker on `{data_root}/ruletaker/{dataset_name}`.
pub fn ruletaker_pipeline(model: &ModelConfig, cfg: &TrainConfig) -> Result<FitSummary> {
    model.check_kind("ruletaker", ModelKind::RuleTaker)?;

    let root = cfg.data_root();
    let name = cfg.dataset_name.as_str();
    let train = RuleTakerDataset::new(root, name, Split::Train)?;
    tracing::info!("Training on {}", train);

    let (train, val) = with_validation(
        train.into_items(),
        &split_path(root, "ruletaker", Some(name), Split::Val),
        || Ok(RuleTakerDataset::new(root, name, Split::Val)?.into_items()),
    )?;

    let run = prepare(model, cfg, &train)?;
    let encode = |item: &RuleTakerItem| {
        run.codec.encode_classification(&item.context, &item.question, item.label)
    };
    let train = encode_all(&train, encode)?;
    let val = encode_all(&val, encode)?;

    on_accelerator(cfg.accelerator, TrainJob { cfg, run: &run, train, val })
}

/// Train a PRover on `{data_root}/proofwriter/{dataset_name}`.
pub fn prover_pipeline(model: &ModelConfig, cfg: &TrainConfig) -> Result<FitSummary> {
    model.check_kind("prover", ModelKind::Prover)?;

    let (train, val) = proofwriter_splits(cfg)?;
    let run = prepare(model, cfg, &train)?;
    let train = encode_all(&train, |item| run.codec.encode_prover(item))?;
    let val = encode_all(&val, |item| run.codec.encode_prover(item))?;

    on_accelerator(cfg.accelerator, TrainJob { cfg, run: &run, train, val })
}

/// Train a generative ProofWriter on `{data_root}/proofwriter/{dataset_name}`.
pub fn proofwriter_pipeline(model: &ModelConfig, cfg: &TrainConfig) -> Result<FitSummary> {
    model.check_kind("proofwriter", ModelKind::ProofWriter)?;

    let (train, val) = proofwriter_splits(cfg)?;
    let run = prepare(model, cfg, &train)?;
    let encode = |item: &ProofWriterItem| {
        let source = proofwriter_source(&parse_facts_rules(&item.facts, &item.rules), &item.question);
        run.codec.encode_seq2seq(&source, &item.target())
    };
    let train = encode_all(&train, encode)?;
    let val = encode_all(&val, encode)?;

    on_accelerator(cfg.accelerator, TrainJob { cfg, run: &run, train, val })
}

/// Train BERTNOT on an entailment corpus; `dataset_name` is snli, mnli or rte.
pub fn bertnot_pipeline(model: &ModelConfig, cfg: &TrainConfig) -> Result<FitSummary> {
    model.check_kind("bertnot", ModelKind::BertNot)?;

    let corpus: TeCorpus = cfg.dataset_name.parse().map_err(|e: String| anyhow!(e))?;
    let root = cfg.data_root();
    let train = TeDataset::new(root, corpus, Split::Train)?;
    let (train, val) = with_validation(
        train.into_items(),
        &split_path(root, corpus.name(), None, Split::Val),
        || Ok(TeDataset::new(root, corpus, Split::Val)?.into_items()),
    )?;

    // The label count follows the corpus, not the preset
    let model = model.clone().with_num_labels(corpus.num_labels());
    let run = prepare(&model, cfg, &train)?;
    let encode = |item: &TeItem| {
        run.codec.encode_classification(&item.premise, &item.hypothesis, item.label)
    };
    let train = encode_all(&train, encode)?;
    let val = encode_all(&val, encode)?;

    on_accelerator(cfg.accelerator, TrainJob { cfg, run: &run, train, val })
}

/// Train the FLD all-at-once prover on `{data_root}/fld/{dataset_name}`.
pub fn fld_pipeline(model: &ModelConfig, cfg: &TrainConfig) -> Result<FitSummary> {
    model.check_kind("fld", ModelKind::Fld)?;

    let root = cfg.data_root();
    let name = cfg.dataset_name.as_str();
    let train = FldDataset::new(root, name, Split::Train, cfg.max_samples)?;
    tracing::info!("Training on {}", train);

    let (train, val) = with_validation(
        train.into_items(),
        &split_path(root, "fld", Some(name), Split::Val),
        || Ok(FldDataset::new(root, name, Split::Val, cfg.max_samples)?.into_items()),
    )?;

    let run = prepare(model, cfg, &train)?;
    let encode = |item: &FldItem| {
        run.codec.encode_seq2seq(&item.prompt_serial, &item.proof_serial)
    };
    let train = encode_all(&train, encode)?;
    let val = encode_all(&val, encode)?;

    on_accelerator(cfg.accelerator, TrainJob { cfg, run: &run, train, val })
}

// ─── Shared Steps ─────────────────────────────────────────────────────────────

fn proofwriter_splits(cfg: &TrainConfig) -> Result<(Vec<ProofWriterItem>, Vec<ProofWriterItem>)> {
    let root = cfg.data_root();
    let name = cfg.dataset_name.as_str();
    let task = ProofWriterTask::ProofGenerationAll;

    let train = ProofWriterDataset::new(root, name, Split::Train, task)?;
    tracing::info!("Training on {}", train);

    with_validation(
        train.into_items(),
        &split_path(root, "proofwriter", Some(name), Split::Val),
        || Ok(ProofWriterDataset::new(root, name, Split::Val, task)?.into_items()),
    )
}

/// Use `val.jsonl` when it exists, otherwise hold out part of train.
fn with_validation<T>(
    train:    Vec<T>,
    val_path: &Path,
    load_val: impl FnOnce() -> Result<Vec<T>>,
) -> Result<(Vec<T>, Vec<T>)> {
    if val_path.exists() {
        return Ok((train, load_val()?));
    }

    let (train, val) = carve_validation(train, VAL_FRACTION, SPLIT_SEED);
    tracing::warn!(
        "'{}' not found; holding out {} of {} training items for validation",
        val_path.display(),
        val.len(),
        train.len() + val.len(),
    );
    Ok((train, val))
}

/// Everything the encode and fit steps share.
struct PreparedRun {
    model:   ModelConfig,
    codec:   TextCodec,
    ckpt:    CheckpointManager,
    metrics: MetricsLogger,
}

fn prepare<T: CorpusText>(model: &ModelConfig, cfg: &TrainConfig, train: &[T]) -> Result<PreparedRun> {
    if train.is_empty() {
        bail!("training split of '{}' is empty", cfg.dataset_name);
    }

    // ── Tokenizer: counted from this run's training corpus ───────────────────
    let tokenizer = TokenizerStore::new(&cfg.saved_model_path, &cfg.saved_model_name)
        .build(&collect_corpus(train), cfg.max_vocab)?;
    let codec = TextCodec::new(tokenizer, model.max_seq_len, model.max_target_len)?;
    let model = model.clone().with_vocab_size(codec.vocab_size());

    // ── Model config: evaluation rebuilds the model from this file ───────────
    let ckpt = CheckpointManager::new(&cfg.saved_model_path, &cfg.saved_model_name)?;
    ckpt.save_model_config(&model)?;
    let metrics = MetricsLogger::new(Path::new(&cfg.saved_model_path), &cfg.saved_model_name)?;

    Ok(PreparedRun { model, codec, ckpt, metrics })
}

fn encode_all<T, S>(items: &[T], encode: impl Fn(&T) -> Result<S>) -> Result<Vec<S>> {
    let samples = items.iter().map(encode).collect::<Result<Vec<_>>>()?;
    tracing::debug!("Encoded {} samples", samples.len());
    Ok(samples)
}

// ─── Backend-generic Training ─────────────────────────────────────────────────

/// Encoded splits waiting for a backend.
struct TrainJob<'a, S> {
    cfg:   &'a TrainConfig,
    run:   &'a PreparedRun,
    train: Vec<S>,
    val:   Vec<S>,
}

impl<S> TrainJob<'_, S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn fit_with<B, M>(
        self,
        module:        M,
        train_batcher: impl Batcher<S, <M as StepModel<B>>::Batch> + Clone + 'static,
        val_batcher:   impl Batcher<S, ValidBatch<B, M>> + Clone + 'static,
    ) -> Result<FitSummary>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + StepModel<B>,
        M::InnerModule: StepModel<B::InnerBackend>,
    {
        let train = SampleDataset::new(self.train);
        let val = SampleDataset::new(self.val);
        tracing::info!("Split: {} train, {} validation", train.len(), val.len());

        let mut train_loader = DataLoaderBuilder::new(train_batcher)
            .batch_size(self.cfg.batch_size)
            .num_workers(1);
        if let Some(seed) = self.cfg.shuffle_seed {
            train_loader = train_loader.shuffle(seed);
        }
        let train_loader = train_loader.build(train);
        let val_loader = DataLoaderBuilder::new(val_batcher)
            .batch_size(self.cfg.batch_size)
            .num_workers(1)
            .build(val);

        let options = FitOptions { epochs: self.cfg.epochs, learning_rate: self.cfg.learning_rate };
        fit::<B, M>(module, train_loader, val_loader, options, &self.run.ckpt, &self.run.metrics)
    }
}

impl BackendTask for TrainJob<'_, ClassificationSample> {
    type Output = FitSummary;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<FitSummary> {
        let train_batcher = ClassificationBatcher::<B>::new(device.clone());
        let val_batcher = ClassificationBatcher::<B::InnerBackend>::new(device.clone());

        match self.run.model.init::<B>(&device)? {
            LogicModel::RuleTaker(m) => self.fit_with::<B, _>(m, train_batcher, val_batcher),
            LogicModel::BertNot(m)   => self.fit_with::<B, _>(m, train_batcher, val_batcher),
            other => bail!("a {} model does not train on classification samples", other.kind()),
        }
    }
}

impl BackendTask for TrainJob<'_, ProverSample> {
    type Output = FitSummary;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<FitSummary> {
        let train_batcher = ProverBatcher::<B>::new(device.clone());
        let val_batcher = ProverBatcher::<B::InnerBackend>::new(device.clone());

        match self.run.model.init::<B>(&device)? {
            LogicModel::Prover(m) => self.fit_with::<B, _>(m, train_batcher, val_batcher),
            other => bail!("a {} model does not train on prover samples", other.kind()),
        }
    }
}

impl BackendTask for TrainJob<'_, Seq2SeqSample> {
    type Output = FitSummary;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<FitSummary> {
        let train_batcher = Seq2SeqBatcher::<B>::new(device.clone());
        let val_batcher = Seq2SeqBatcher::<B::InnerBackend>::new(device.clone());

        match self.run.model.init::<B>(&device)? {
            LogicModel::ProofWriter(m) => self.fit_with::<B, _>(m, train_batcher, val_batcher),
            LogicModel::Fld(m)         => self.fit_with::<B, _>(m, train_batcher, val_batcher),
            other => bail!("a {} model does not train on sequence-to-sequence samples", other.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{errors::ModelNotCompatibleError, kinds::Accelerator};
    use std::{fs, io::Write};

    fn write_lines(path: &Path, lines: &[String]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = fs::File::create(path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
    }

    fn ruletaker_corpus(root: &Path) {
        let lines: Vec<String> = (0..10)
            .map(|i| {
                format!(
                    r#"{{"id": "t{i}", "context": "The cat is big. If something is big then it is red.",
                        "questions": [{{"text": "The cat is red.", "label": {}, "meta": {{"QDep": 1}}}}]}}"#,
                    i % 2 == 0
                )
                .replace('\n', " ")
            })
            .collect();
        write_lines(&root.join("ruletaker/tiny-set/train.jsonl"), &lines);
    }

    fn proofwriter_corpus(root: &Path) {
        let lines: Vec<String> = (0..10)
            .map(|i| {
                format!(
                    r#"{{"id": "p{i}",
                        "triples": {{"triple1": {{"text": "Bob is big."}}, "triple2": {{"text": "Anne is kind."}}}},
                        "rules": {{"rule1": {{"text": "If someone is big then they are red."}}}},
                        "questions": {{"Q1": {{"question": "Bob is red.", "answer": {}, "QDep": 1,
                                             "proofs": "[(((triple1) -> rule1))]"}}}}}}"#,
                    if i % 2 == 0 { "true" } else { r#""Unknown""# }
                )
                .replace('\n', " ")
            })
            .collect();
        write_lines(&root.join("proofwriter/tiny-set/train.jsonl"), &lines);
    }

    fn te_corpus(root: &Path, corpus: &str) {
        let labels = ["entailment", "neutral", "contradiction"];
        let lines: Vec<String> = (0..9)
            .map(|i| {
                format!(
                    r#"{{"sentence1": "A woman plays violin.", "sentence2": "A person makes music.", "gold_label": "{}"}}"#,
                    labels[i % 3]
                )
            })
            .collect();
        write_lines(&root.join(corpus).join("train.jsonl"), &lines);
    }

    fn fld_corpus(root: &Path) {
        let lines: Vec<String> = (0..12)
            .map(|i| {
                format!(
                    r#"{{"prompt_serial": "$hypothesis$ = A ; $context$ = fact1: A", "proof_serial": "fact1 -> hypothesis; __PROVED__", "context": "fact1: A", "hypothesis": "A", "depth": {}}}"#,
                    i % 3
                )
            })
            .collect();
        write_lines(&root.join("fld/tiny-set/train.jsonl"), &lines);
    }

    fn tiny_cfg(root: &Path, out: &Path) -> TrainConfig {
        TrainConfig {
            data_root:        root.to_string_lossy().into_owned(),
            dataset_name:     "tiny-set".to_string(),
            saved_model_path: out.to_string_lossy().into_owned(),
            saved_model_name: "rt".to_string(),
            batch_size:       4,
            epochs:           1,
            accelerator:      Accelerator::Cpu,
            max_vocab:        100,
            ..TrainConfig::default()
        }
    }

    fn tiny_model(kind: ModelKind) -> ModelConfig {
        ModelConfig::from_preset(kind, "tiny")
            .unwrap()
            .with_max_seq_len(32)
            .with_max_target_len(16)
    }

    #[test]
    fn test_every_pipeline_rejects_other_families() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_cfg(dir.path(), dir.path());
        let model = tiny_model(ModelKind::Fld);

        let results = [
            ("ruletaker", ruletaker_pipeline(&model, &cfg)),
            ("prover", prover_pipeline(&model, &cfg)),
            ("proofwriter", proofwriter_pipeline(&model, &cfg)),
            ("bertnot", bertnot_pipeline(&model, &cfg)),
        ];
        for (pipeline, result) in results {
            let err = result.unwrap_err();
            let typed = err.downcast_ref::<ModelNotCompatibleError>().unwrap();
            assert_eq!(typed.pipeline, pipeline);
            assert_eq!(typed.found, ModelKind::Fld);
        }
    }

    #[test]
    fn test_missing_validation_split_is_carved_from_train() {
        let (train, val) = with_validation(
            (0..20).collect::<Vec<u32>>(),
            Path::new("/definitely/not/here/val.jsonl"),
            || unreachable!(),
        )
        .unwrap();
        assert_eq!(train.len(), 18);
        assert_eq!(val.len(), 2);
    }

    #[test]
    fn test_ruletaker_pipeline_trains_and_saves() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        ruletaker_corpus(data.path());
        let cfg = tiny_cfg(data.path(), out.path());

        let summary = ruletaker_pipeline(&tiny_model(ModelKind::RuleTaker), &cfg).unwrap();
        assert_eq!(summary.epochs.len(), 1);
        assert_eq!(summary.best.epoch, 1);

        for file in ["rt.mpk.gz", "rt.best.json", "rt.model.json", "rt.tokenizer.json", "rt.metrics.csv"] {
            assert!(out.path().join(file).exists(), "{file} missing");
        }
        let saved = CheckpointManager::open(out.path(), "rt").load_model_config().unwrap();
        assert!(saved.vocab_size > 0);
        assert_eq!(saved.kind, ModelKind::RuleTaker);
    }

    #[test]
    fn test_prover_pipeline_trains_and_saves() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        proofwriter_corpus(data.path());
        let cfg = TrainConfig { saved_model_name: "pr".to_string(), ..tiny_cfg(data.path(), out.path()) };

        let summary = prover_pipeline(&tiny_model(ModelKind::Prover), &cfg).unwrap();
        assert_eq!(summary.epochs.len(), 1);
        let saved = CheckpointManager::open(out.path(), "pr").load_model_config().unwrap();
        assert_eq!(saved.kind, ModelKind::Prover);
        assert_eq!(saved.num_labels, 3);
        assert!(out.path().join("pr.mpk.gz").exists());
    }

    #[test]
    fn test_proofwriter_pipeline_trains_and_saves() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        proofwriter_corpus(data.path());
        let cfg = TrainConfig { saved_model_name: "pw".to_string(), ..tiny_cfg(data.path(), out.path()) };

        let summary = proofwriter_pipeline(&tiny_model(ModelKind::ProofWriter), &cfg).unwrap();
        assert_eq!(summary.best.epoch, 1);
        let vocab = TokenizerStore::new(out.path(), "pw").load().unwrap();
        // Answer words lead every target
        assert!(vocab.token_to_id("true").is_some());
        assert!(vocab.token_to_id("unknown").is_some());
        assert!(out.path().join("pw.mpk.gz").exists());
    }

    #[test]
    fn test_bertnot_pipeline_takes_label_count_from_corpus() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        te_corpus(data.path(), "snli");
        let cfg = TrainConfig {
            dataset_name:     "snli".to_string(),
            saved_model_name: "bn".to_string(),
            ..tiny_cfg(data.path(), out.path())
        };

        // The RuleTaker-sized preset starts with 2 labels
        let model = tiny_model(ModelKind::BertNot);
        assert_eq!(model.num_labels, 2);
        bertnot_pipeline(&model, &cfg).unwrap();

        let saved = CheckpointManager::open(out.path(), "bn").load_model_config().unwrap();
        assert_eq!(saved.num_labels, 3);
    }

    #[test]
    fn test_bertnot_pipeline_rejects_unknown_corpus() {
        let data = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { dataset_name: "qnli".to_string(), ..tiny_cfg(data.path(), data.path()) };
        let err = bertnot_pipeline(&tiny_model(ModelKind::BertNot), &cfg).unwrap_err();
        assert!(err.to_string().contains("qnli"));
    }

    #[test]
    fn test_fld_pipeline_honours_max_samples() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fld_corpus(data.path());
        let cfg = TrainConfig {
            saved_model_name: "fld".to_string(),
            max_samples:      Some(5),
            ..tiny_cfg(data.path(), out.path())
        };

        let summary = fld_pipeline(&tiny_model(ModelKind::Fld), &cfg).unwrap();
        assert_eq!(summary.epochs.len(), 1);
        let saved = CheckpointManager::open(out.path(), "fld").load_model_config().unwrap();
        assert_eq!(saved.kind, ModelKind::Fld);
        assert!(out.path().join("fld.tokenizer.json").exists());
    }

    #[test]
    fn test_models_sharing_a_directory_keep_their_own_vocabulary() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        ruletaker_corpus(data.path());
        te_corpus(data.path(), "snli");

        let rt_cfg = TrainConfig { saved_model_name: "ruletaker".to_string(), ..tiny_cfg(data.path(), out.path()) };
        ruletaker_pipeline(&tiny_model(ModelKind::RuleTaker), &rt_cfg).unwrap();
        let bn_cfg = TrainConfig {
            dataset_name:     "snli".to_string(),
            saved_model_name: "bertnot".to_string(),
            ..tiny_cfg(data.path(), out.path())
        };
        bertnot_pipeline(&tiny_model(ModelKind::BertNot), &bn_cfg).unwrap();

        let bertnot = TokenizerStore::new(out.path(), "bertnot").load().unwrap();
        let ids = bertnot.encode("A woman plays violin.", false).unwrap();
        assert!(ids.get_ids().iter().all(|&id| id != crate::data::codec::UNK_ID));

        let ruletaker = TokenizerStore::new(out.path(), "ruletaker").load().unwrap();
        assert_eq!(ruletaker.token_to_id("violin"), None);
        assert!(ruletaker.token_to_id("cat").is_some());

        for file in ["ruletaker.metrics.csv", "bertnot.metrics.csv"] {
            let csv = fs::read_to_string(out.path().join(file)).unwrap();
            assert_eq!(csv.lines().count(), 2, "{file}");
        }
    }
}
