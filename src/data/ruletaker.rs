// ============================================================
// Layer 4 — RuleTaker Dataset
// ============================================================
// Each corpus line is one theory with several questions:
//
//   {"id": "RelNeg-D5-12",
//    "context": "Bob is big. If something is big then it is red.",
//    "questions": [
//       {"text": "Bob is red.", "label": true, "meta": {"QDep": 1}}, ...]}
//
// The dataset flattens this into one item per question:
//   (context, question, label, depth)
//
// Reference: Clark et al. (2020) Transformers as Soft Reasoners

use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::Deserialize;
use std::{fmt, path::Path};

use crate::data::loader::{read_jsonl, split_path};
use crate::domain::{examples::RuleTakerItem, kinds::Split};

#[derive(Debug, Deserialize)]
struct RawTheory {
    context:   String,
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    text:  String,
    label: bool,
    #[serde(default)]
    meta:  RawMeta,
}

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    #[serde(rename = "QDep", default)]
    qdep: Option<usize>,
}

pub struct RuleTakerDataset {
    name:  String,
    split: Split,
    items: Vec<RuleTakerItem>,
}

impl RuleTakerDataset {
    /// Load `{root}/ruletaker/{name}/{split}.jsonl`.
    pub fn new(root: &Path, name: &str, split: Split) -> Result<Self> {
        let path = split_path(root, "ruletaker", Some(name), split);
        let records = read_jsonl::<RawTheory>(&path)?;

        let items: Vec<RuleTakerItem> = records
            .into_iter()
            .flat_map(|r| {
                let context = r.value.context;
                r.value.questions.into_iter().map(move |q| RuleTakerItem {
                    context:  context.clone(),
                    question: q.text,
                    label:    usize::from(q.label),
                    depth:    q.meta.qdep.unwrap_or(0),
                })
            })
            .collect();

        tracing::info!("RuleTaker {}/{}: {} questions", name, split, items.len());
        Ok(Self { name: name.to_string(), split, items })
    }

    pub fn items(&self) -> &[RuleTakerItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<RuleTakerItem> {
        self.items
    }
}

impl Dataset<RuleTakerItem> for RuleTakerDataset {
    fn get(&self, index: usize) -> Option<RuleTakerItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

impl fmt::Display for RuleTakerDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleTaker({}, {})", self.name, self.split)
    }
}
