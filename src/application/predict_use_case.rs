// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Runs one example through a saved checkpoint of any family:
//
//   Step 1: Rebuild the model and tokenizer from the checkpoint
//   Step 2: Check the inputs that family needs were given
//   Step 3: Predict and return a printable Prediction
//
// Facts and rules are numbered in the order given:
//   triple1, triple2, ... and rule1, rule2, ...

use anyhow::{anyhow, Result};
use burn::tensor::backend::AutodiffBackend;
use std::fmt;

use crate::application::backend::{on_accelerator, BackendTask};
use crate::data::codec::TextCodec;
use crate::domain::{
    examples::{parse_facts_rules, Answer},
    kinds::{Accelerator, ModelKind},
};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::{bertnot::TE_TASK, model::LogicModel};

#[derive(Debug, Clone, Default)]
pub struct PredictConfig {
    pub saved_model_path: String,
    pub saved_model_name: String,
    pub accelerator:      Option<Accelerator>,
    pub context:          Option<String>,
    pub question:         Option<String>,
    pub facts:            Vec<String>,
    pub rules:            Vec<String>,
    pub premise:          Option<String>,
    pub hypothesis:       Option<String>,
    pub prompt:           Option<String>,
}

/// What a model said about one example.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// A classifier label with its display name
    Label { id: usize, name: String },
    /// PRover: answer label plus the sentences it put in the proof
    Proof { answer: Answer, proof_ids: Vec<String> },
    /// Generated text
    Text(String),
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Label { id, name } => write!(f, "{name} ({id})"),
            Prediction::Proof { answer, proof_ids } => {
                write!(f, "{answer} ; proof: {}", proof_ids.join(" "))
            }
            Prediction::Text(text) => f.write_str(text),
        }
    }
}

pub struct PredictUseCase {
    config: PredictConfig,
}

impl PredictUseCase {
    pub fn new(config: PredictConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Prediction> {
        let accelerator = self.config.accelerator.unwrap_or(Accelerator::Cpu);
        on_accelerator(accelerator, PredictJob { cfg: &self.config })
    }
}

struct PredictJob<'a> {
    cfg: &'a PredictConfig,
}

impl BackendTask for PredictJob<'_> {
    type Output = Prediction;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<Prediction> {
        let cfg = self.cfg;

        // ── Step 1: Model + tokenizer ────────────────────────────────────────
        let ckpt = CheckpointManager::open(&cfg.saved_model_path, &cfg.saved_model_name);
        let (model, model_cfg) = LogicModel::<B::InnerBackend>::load(&ckpt, &device)?;
        let tokenizer = TokenizerStore::new(&cfg.saved_model_path, &cfg.saved_model_name).load()?;
        let codec = TextCodec::new(tokenizer, model_cfg.max_seq_len, model_cfg.max_target_len)?;

        // ── Step 2 + 3: Inputs and prediction ────────────────────────────────
        match &model {
            LogicModel::RuleTaker(m) => {
                let id = m.predict(&codec, required(&cfg.context, "context")?, required(&cfg.question, "question")?)?;
                Ok(label(ModelKind::RuleTaker, model_cfg.num_labels, id))
            }
            LogicModel::BertNot(m) => {
                let id = m.predict(
                    &codec,
                    required(&cfg.premise, "premise")?,
                    required(&cfg.hypothesis, "hypothesis")?,
                    TE_TASK,
                )?;
                Ok(label(ModelKind::BertNot, model_cfg.num_labels, id))
            }
            LogicModel::Prover(m) => {
                let (facts, rules) = numbered_theory(cfg)?;
                let question = required(&cfg.question, "question")?;
                let id = m.predict(&codec, &facts, &rules, question)?;
                let answer = Answer::from_label_id(id).ok_or_else(|| anyhow!("answer label {id} out of range"))?;
                let proof_ids = m.predict_proof(&codec, &facts, &rules, question)?;
                Ok(Prediction::Proof { answer, proof_ids })
            }
            LogicModel::ProofWriter(m) => {
                let context = match &cfg.context {
                    Some(context) => context.clone(),
                    None => {
                        let (facts, rules) = numbered_theory(cfg)?;
                        parse_facts_rules(&facts, &rules)
                    }
                };
                Ok(Prediction::Text(m.predict(&codec, &context, required(&cfg.question, "question")?)?))
            }
            LogicModel::Fld(m) => Ok(Prediction::Text(m.predict(&codec, required(&cfg.prompt, "prompt")?)?)),
        }
    }
}

fn required<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| anyhow!("this model needs --{flag}"))
}

type Sentences = Vec<(String, String)>;

fn numbered_theory(cfg: &PredictConfig) -> Result<(Sentences, Sentences)> {
    if cfg.facts.is_empty() && cfg.rules.is_empty() {
        return Err(anyhow!("this model needs at least one --fact or --rule"));
    }
    let number = |prefix: &str, texts: &[String]| -> Sentences {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| (format!("{prefix}{}", i + 1), text.clone()))
            .collect()
    };
    Ok((number("triple", &cfg.facts), number("rule", &cfg.rules)))
}

fn label(kind: ModelKind, num_labels: usize, id: usize) -> Prediction {
    let names: &[&str] = match (kind, num_labels) {
        (ModelKind::RuleTaker, _) => &["False", "True"],
        (_, 3)                    => &["entailment", "neutral", "contradiction"],
        _                         => &["entailment", "not_entailment"],
    };
    let name = names.get(id).map(|s| s.to_string()).unwrap_or_else(|| id.to_string());
    Prediction::Label { id, name }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theory_is_numbered_in_order() {
        let cfg = PredictConfig {
            facts: vec!["Bob is big.".into(), "Bob is red.".into()],
            rules: vec!["Big things are red.".into()],
            ..PredictConfig::default()
        };
        let (facts, rules) = numbered_theory(&cfg).unwrap();
        assert_eq!(facts[1], ("triple2".to_string(), "Bob is red.".to_string()));
        assert_eq!(rules[0].0, "rule1");
        assert!(numbered_theory(&PredictConfig::default()).is_err());
    }

    #[test]
    fn test_label_names() {
        assert_eq!(label(ModelKind::RuleTaker, 2, 1).to_string(), "True (1)");
        assert_eq!(label(ModelKind::BertNot, 3, 2).to_string(), "contradiction (2)");
        assert_eq!(label(ModelKind::BertNot, 2, 1).to_string(), "not_entailment (1)");
    }

    #[test]
    fn test_missing_input_names_the_flag() {
        let err = required(&None, "premise").unwrap_err();
        assert!(err.to_string().contains("--premise"));
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PredictConfig {
            saved_model_path: dir.path().to_string_lossy().into_owned(),
            saved_model_name: "none".into(),
            ..PredictConfig::default()
        };
        assert!(PredictUseCase::new(cfg).execute().is_err());
    }
}
