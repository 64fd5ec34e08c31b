// ============================================================
// Layer 4 — ProofWriter Dataset
// ============================================================
// Corpus lines hold a theory and a keyed set of questions:
//
//   {"id": "AttNoneg-D3-100",
//    "triples":   {"triple1": {"text": "Bob is big."}, ...},
//    "rules":     {"rule1":   {"text": "Big things are red."}, ...},
//    "questions": {"Q1": {"question": "Bob is red.", "answer": true,
//                         "QDep": 1, "proofs": "[((triple1) -> rule1)]"}, ...}}
//
// Key order inside "triples" and "rules" is kept (serde_json is
// built with preserve_order) because the generative model reads
// the theory in corpus order.
//
// Reference: Tafjord et al. (2021) ProofWriter

use anyhow::{anyhow, bail, Context, Result};
use burn::data::dataset::Dataset;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{fmt, path::Path};

use crate::data::loader::{read_jsonl, split_path};
use crate::domain::{
    examples::{extract_proof_ids, Answer, ProofWriterItem},
    kinds::Split,
};

/// What the dataset is prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofWriterTask {
    /// Answer plus the full proof in one target
    ProofGenerationAll,
}

impl fmt::Display for ProofWriterTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofWriterTask::ProofGenerationAll => f.write_str("proof_generation_all"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTheory {
    #[serde(default)]
    triples:   Map<String, Value>,
    #[serde(default)]
    rules:     Map<String, Value>,
    #[serde(default)]
    questions: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    answer:   Value,
    #[serde(rename = "QDep", default)]
    qdep:     Option<usize>,
    #[serde(default)]
    proofs:   Option<String>,
}

pub struct ProofWriterDataset {
    name:  String,
    split: Split,
    task:  ProofWriterTask,
    items: Vec<ProofWriterItem>,
}

impl ProofWriterDataset {
    /// Load `{root}/proofwriter/{name}/{split}.jsonl`.
    pub fn new(root: &Path, name: &str, split: Split, task: ProofWriterTask) -> Result<Self> {
        let path = split_path(root, "proofwriter", Some(name), split);
        let records = read_jsonl::<RawTheory>(&path)?;

        let mut items = Vec::new();
        for record in records {
            let theory = record.value;
            let where_ = || format!("line {} of '{}'", record.line, path.display());

            let facts = sentence_texts(&theory.triples).with_context(where_)?;
            let rules = sentence_texts(&theory.rules).with_context(where_)?;

            for (qid, raw) in theory.questions {
                let q: RawQuestion = serde_json::from_value(raw)
                    .with_context(|| format!("question '{qid}' on {}", where_()))?;
                let answer = parse_answer(&q.answer)
                    .with_context(|| format!("question '{qid}' on {}", where_()))?;
                let proofs = q.proofs.unwrap_or_default();

                items.push(ProofWriterItem {
                    facts:     facts.clone(),
                    rules:     rules.clone(),
                    question:  q.question,
                    answer,
                    proof_ids: extract_proof_ids(&proofs),
                    proofs,
                    depth:     q.qdep.unwrap_or(0),
                });
            }
        }

        tracing::info!("ProofWriter {}/{} ({}): {} questions", name, split, task, items.len());
        Ok(Self { name: name.to_string(), split, task, items })
    }

    pub fn items(&self) -> &[ProofWriterItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ProofWriterItem> {
        self.items
    }
}

/// `{"triple1": {"text": "..."}}` → [("triple1", "...")] in key order.
fn sentence_texts(map: &Map<String, Value>) -> Result<Vec<(String, String)>> {
    map.iter()
        .map(|(id, v)| {
            let text = v
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("sentence '{id}' has no 'text' field"))?;
            Ok((id.clone(), text.to_string()))
        })
        .collect()
}

/// Answers are JSON booleans, or the string "Unknown" in open-world data.
fn parse_answer(v: &Value) -> Result<Answer> {
    match v {
        Value::Bool(true)  => Ok(Answer::True),
        Value::Bool(false) => Ok(Answer::False),
        Value::String(s)   => s.parse::<Answer>().map_err(|e| anyhow!(e)),
        other => bail!("unexpected answer value {other}"),
    }
}

impl Dataset<ProofWriterItem> for ProofWriterDataset {
    fn get(&self, index: usize) -> Option<ProofWriterItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

impl fmt::Display for ProofWriterDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProofWriter({}, {}, {})", self.name, self.split, self.task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const THEORY: &str = r#"{"id": "t1", "triples": {"triple2": {"text": "Bob is big."}, "triple1": {"text": "Anne is kind."}}, "rules": {"rule1": {"text": "Big things are red."}}, "questions": {"Q1": {"question": "Bob is red.", "answer": true, "QDep": 1, "proofs": "[((triple2) -> rule1)]"}, "Q2": {"question": "Anne is red.", "answer": "Unknown", "QDep": 0, "proofs": "None"}}}"#;

    fn corpus(body: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let split_dir = dir.path().join("proofwriter").join("depth-5");
        fs::create_dir_all(&split_dir).unwrap();
        fs::write(split_dir.join("test.jsonl"), format!("{body}\n")).unwrap();
        dir
    }

    fn load(dir: &tempfile::TempDir) -> Result<ProofWriterDataset> {
        ProofWriterDataset::new(dir.path(), "depth-5", Split::Test, ProofWriterTask::ProofGenerationAll)
    }

    #[test]
    fn test_items_keep_theory_order() {
        let dir = corpus(THEORY);
        let ds = load(&dir).unwrap();
        assert_eq!(ds.len(), 2);

        let item = ds.get(0).unwrap();
        assert_eq!(item.facts[0].0, "triple2");
        assert_eq!(item.facts[1].0, "triple1");
        assert_eq!(item.rules[0].1, "Big things are red.");
        assert_eq!(item.answer, Answer::True);
        assert_eq!(item.proof_ids, vec!["triple2", "rule1"]);
        assert_eq!(item.depth, 1);
    }

    #[test]
    fn test_unknown_answer() {
        let dir = corpus(THEORY);
        let item = load(&dir).unwrap().get(1).unwrap();
        assert_eq!(item.answer, Answer::Unknown);
        assert!(item.proof_ids.is_empty());
        assert_eq!(item.answer.label_id(), 2);
    }

    #[test]
    fn test_bad_answer_is_an_error() {
        let body = r#"{"triples": {}, "rules": {}, "questions": {"Q1": {"question": "x", "answer": 3}}}"#;
        let dir = corpus(body);
        let err = load(&dir).err().unwrap();
        assert!(format!("{err:#}").contains("Q1"));
    }

    #[test]
    fn test_display_names_the_task() {
        let dir = corpus(THEORY);
        assert_eq!(load(&dir).unwrap().to_string(), "ProofWriter(depth-5, test, proof_generation_all)");
    }
}
