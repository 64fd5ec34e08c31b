// ============================================================
// Layer 4 — FLD Dataset
// ============================================================
// Formal Logic Deduction examples arrive already serialised for
// a sequence-to-sequence prover:
//
//   {"prompt_serial": "$hypothesis$ = ... ; $context$ = fact1: ...",
//    "proof_serial":  "fact1 & fact2 -> int1: ...; __PROVED__",
//    "context": "...", "hypothesis": "...", "depth": 2}
//
// depth is null for examples whose hypothesis cannot be settled.
//
// Reference: Morishita et al. (2023) Learning Deductive Reasoning
//            from Synthetic Corpus based on Formal Logic

use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::Deserialize;
use std::{fmt, path::Path};

use crate::data::loader::{read_jsonl, split_path};
use crate::domain::{examples::FldItem, kinds::Split};

#[derive(Debug, Deserialize)]
struct RawFld {
    prompt_serial: String,
    proof_serial:  String,
    #[serde(default)]
    context:       String,
    #[serde(default)]
    hypothesis:    String,
    #[serde(default)]
    depth:         Option<usize>,
}

pub struct FldDataset {
    name:  String,
    split: Split,
    items: Vec<FldItem>,
}

impl FldDataset {
    /// Load `{root}/fld/{name}/{split}.jsonl`, keeping at most `max_samples`.
    pub fn new(root: &Path, name: &str, split: Split, max_samples: Option<usize>) -> Result<Self> {
        let path = split_path(root, "fld", Some(name), split);
        let records = read_jsonl::<RawFld>(&path)?;
        let limit = max_samples.unwrap_or(usize::MAX);

        let items: Vec<FldItem> = records
            .into_iter()
            .take(limit)
            .map(|r| FldItem {
                prompt_serial: r.value.prompt_serial,
                proof_serial:  r.value.proof_serial,
                context:       r.value.context,
                hypothesis:    r.value.hypothesis,
                depth:         r.value.depth,
            })
            .collect();

        tracing::info!("FLD {}/{}: {} examples", name, split, items.len());
        Ok(Self { name: name.to_string(), split, items })
    }

    pub fn items(&self) -> &[FldItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<FldItem> {
        self.items
    }
}

impl Dataset<FldItem> for FldDataset {
    fn get(&self, index: usize) -> Option<FldItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

impl fmt::Display for FldDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FLD({}, {})", self.name, self.split)
    }
}
