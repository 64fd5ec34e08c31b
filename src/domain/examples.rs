// ============================================================
// Layer 3 — Task Examples
// ============================================================
// One struct per task family. Each dataset class yields these
// while iterating; nothing holds on to them afterwards.
//
//   RuleTakerItem   → (context, question, label, depth)
//   ProofWriterItem → (facts, rules, question, answer, proofs, proof_ids, depth)
//   TeItem          → (premise, hypothesis, label)
//   FldItem         → (prompt_serial, proof_serial, context, hypothesis, depth)
//
// Reference: Clark et al. (2020) Transformers as Soft Reasoners
//            Tafjord et al. (2021) ProofWriter

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Label ids used by every ProofWriter-style model.
/// "False" → 0, "True" → 1, "Unknown" → 2
pub const PROOFWRITER_LABEL_TO_ID: [(&str, usize); 3] =
    [("False", 0), ("True", 1), ("Unknown", 2)];

/// Look up a ProofWriter label id by its string form.
pub fn proofwriter_label_to_id(label: &str) -> Option<usize> {
    PROOFWRITER_LABEL_TO_ID
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, id)| *id)
}

// ─── Answer ───────────────────────────────────────────────────────────────────
/// The gold answer of a ProofWriter question.
/// Closed-world datasets only ever use True/False; open-world adds Unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    True,
    False,
    Unknown,
}

impl Answer {
    pub fn label_id(self) -> usize {
        // The table always contains every variant's Display form
        proofwriter_label_to_id(&self.to_string()).unwrap_or(2)
    }

    pub fn from_label_id(id: usize) -> Option<Self> {
        match id {
            0 => Some(Answer::False),
            1 => Some(Answer::True),
            2 => Some(Answer::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Answer::True    => "True",
            Answer::False   => "False",
            Answer::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

impl FromStr for Answer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true"    => Ok(Answer::True),
            "false"   => Ok(Answer::False),
            "unknown" => Ok(Answer::Unknown),
            other     => Err(format!("unknown answer '{other}'")),
        }
    }
}

// ─── RuleTaker ────────────────────────────────────────────────────────────────
/// A rule-based QA example: is `question` true given `context`?
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTakerItem {
    pub context:  String,
    pub question: String,
    /// 0 = false, 1 = true
    pub label:    usize,
    /// Number of reasoning steps (QDep) needed to answer
    pub depth:    usize,
}

// ─── ProofWriter ──────────────────────────────────────────────────────────────
/// A proof QA example over an explicit theory of facts and rules.
/// Facts and rules keep the order they have in the corpus file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofWriterItem {
    /// (id, text) pairs, e.g. ("triple1", "The cat is big.")
    pub facts:     Vec<(String, String)>,
    /// (id, text) pairs, e.g. ("rule1", "If something is big then it is red.")
    pub rules:     Vec<(String, String)>,
    pub question:  String,
    pub answer:    Answer,
    /// Raw proof string, e.g. "[(((triple1) -> rule1))]"
    pub proofs:    String,
    /// Sentence ids used by the first proof
    pub proof_ids: Vec<String>,
    pub depth:     usize,
}

impl ProofWriterItem {
    /// Every sentence of the theory: facts first, then rules.
    pub fn sentences(&self) -> impl Iterator<Item = &(String, String)> {
        self.facts.iter().chain(self.rules.iter())
    }

    /// The generation target used by the ProofWriter model.
    pub fn target(&self) -> String {
        format!("{} ; {}", self.answer, self.proofs)
    }
}

/// Render facts then rules as "{id}: {text}", concatenated with no separator.
pub fn parse_facts_rules(facts: &[(String, String)], rules: &[(String, String)]) -> String {
    facts
        .iter()
        .chain(rules.iter())
        .map(|(id, text)| format!("{id}: {text}"))
        .collect::<Vec<_>>()
        .join("")
}

/// Extract the `triple*` / `rule*` identifiers of the first proof.
///
/// Proofs look like `[(((triple1 triple2) -> rule1))] OR [(triple3)]`;
/// only the part before the first ` OR ` is used.
pub fn extract_proof_ids(proofs: &str) -> Vec<String> {
    let first = proofs.split(" OR ").next().unwrap_or("");
    let mut ids: Vec<String> = Vec::new();

    for token in first.split(|c: char| !c.is_ascii_alphanumeric()) {
        let is_id = ["triple", "rule"].iter().any(|prefix| {
            token.starts_with(prefix)
                && token.len() > prefix.len()
                && token[prefix.len()..].chars().all(|c| c.is_ascii_digit())
        });
        if is_id && !ids.iter().any(|i| i == token) {
            ids.push(token.to_string());
        }
    }
    ids
}

// ─── Textual Entailment ───────────────────────────────────────────────────────
/// A premise / hypothesis pair with its entailment label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeItem {
    pub premise:    String,
    pub hypothesis: String,
    pub label:      usize,
}

// ─── FLD ──────────────────────────────────────────────────────────────────────
/// A Formal Logic Deduction example, already serialised for a
/// sequence-to-sequence prover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FldItem {
    pub prompt_serial: String,
    pub proof_serial:  String,
    pub context:       String,
    pub hypothesis:    String,
    pub depth:         Option<usize>,
}
