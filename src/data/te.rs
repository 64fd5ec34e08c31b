// ============================================================
// Layer 4 — Textual Entailment Datasets
// ============================================================
// SNLI, MNLI and RTE share one record shape:
//
//   {"sentence1": premise, "sentence2": hypothesis, "gold_label": "..."}
//
// (RTE uses "label" instead of "gold_label".) The negated
// variants are single-file evaluation sets in the same format,
// stored under {root}/negated/{corpus}.jsonl.
//
// Label ids:
//   SNLI / MNLI : entailment=0, neutral=1, contradiction=2
//   RTE         : entailment=0, not_entailment=1
//
// SNLI marks examples without annotator agreement with "-";
// those lines are skipped.
//
// Reference: Hosseini et al. (2021) Understanding by Understanding Not

use anyhow::{anyhow, bail, Context, Result};
use burn::data::dataset::Dataset;
use serde::Deserialize;
use serde_json::Value;
use std::{fmt, path::Path};

use crate::data::loader::{read_jsonl, split_path};
use crate::domain::{
    examples::TeItem,
    kinds::{Split, TeCorpus},
};

#[derive(Debug, Deserialize)]
struct RawPair {
    sentence1: String,
    sentence2: String,
    #[serde(alias = "gold_label")]
    label:     Value,
}

pub struct TeDataset {
    corpus:  TeCorpus,
    split:   Option<Split>,
    negated: bool,
    items:   Vec<TeItem>,
}

impl TeDataset {
    /// Load `{root}/{corpus}/{split}.jsonl`.
    pub fn new(root: &Path, corpus: TeCorpus, split: Split) -> Result<Self> {
        let path = split_path(root, corpus.name(), None, split);
        let items = load_pairs(&path, corpus)?;
        tracing::info!("{}/{}: {} pairs", corpus, split, items.len());
        Ok(Self { corpus, split: Some(split), negated: false, items })
    }

    /// Load the negated evaluation set `{root}/negated/{corpus}.jsonl`.
    pub fn negated(root: &Path, corpus: TeCorpus) -> Result<Self> {
        let path = root.join("negated").join(format!("{}.jsonl", corpus.name()));
        let items = load_pairs(&path, corpus)?;
        tracing::info!("negated {}: {} pairs", corpus, items.len());
        Ok(Self { corpus, split: None, negated: true, items })
    }

    pub fn items(&self) -> &[TeItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<TeItem> {
        self.items
    }
}

fn load_pairs(path: &Path, corpus: TeCorpus) -> Result<Vec<TeItem>> {
    let mut items = Vec::new();
    let mut skipped = 0usize;

    for record in read_jsonl::<RawPair>(path)? {
        let label = parse_label(&record.value.label, corpus).with_context(|| {
            format!("line {} of '{}'", record.line, path.display())
        })?;
        match label {
            Some(label) => items.push(TeItem {
                premise:    record.value.sentence1,
                hypothesis: record.value.sentence2,
                label,
            }),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} unlabelled pairs in '{}'", skipped, path.display());
    }
    Ok(items)
}

/// Map a raw label to its id. `Ok(None)` means "no gold label, skip".
fn parse_label(v: &Value, corpus: TeCorpus) -> Result<Option<usize>> {
    let id = match v {
        Value::String(s) if s == "-" => return Ok(None),
        Value::String(s) => match (corpus, s.as_str()) {
            (_, "entailment") => 0,
            (TeCorpus::Snli | TeCorpus::Mnli, "neutral") => 1,
            (TeCorpus::Snli | TeCorpus::Mnli, "contradiction") => 2,
            (TeCorpus::Rte, "not_entailment") => 1,
            (_, other) => bail!("unknown {} label '{}'", corpus, other),
        },
        Value::Number(n) => n
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| anyhow!("label {n} is not a non-negative integer"))?,
        other => bail!("unexpected label value {other}"),
    };

    if id >= corpus.num_labels() {
        bail!("label id {} out of range for {}", id, corpus);
    }
    Ok(Some(id))
}

impl Dataset<TeItem> for TeDataset {
    fn get(&self, index: usize) -> Option<TeItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

impl fmt::Display for TeDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.negated, self.split) {
            (true, _)           => write!(f, "Negated{}", self.corpus.name().to_uppercase()),
            (false, Some(s))    => write!(f, "{}({})", self.corpus.name().to_uppercase(), s),
            (false, None)       => write!(f, "{}", self.corpus.name().to_uppercase()),
        }
    }
}
