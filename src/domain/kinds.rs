// ============================================================
// Layer 3 — Kinds
// ============================================================
// Small closed sets of names used across layers. Each implements
// FromStr with a String error so clap can parse them directly
// without the application layer ever seeing clap types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The five model families the toolkit can train and evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    RuleTaker,
    Prover,
    ProofWriter,
    BertNot,
    Fld,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::RuleTaker,
        ModelKind::Prover,
        ModelKind::ProofWriter,
        ModelKind::BertNot,
        ModelKind::Fld,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::RuleTaker   => "ruletaker",
            ModelKind::Prover      => "prover",
            ModelKind::ProofWriter => "proofwriter",
            ModelKind::BertNot     => "bertnot",
            ModelKind::Fld         => "fld",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        ModelKind::ALL
            .into_iter()
            .find(|k| k.name() == lower)
            .ok_or_else(|| {
                format!(
                    "unknown model '{s}' (expected one of: ruletaker, prover, proofwriter, bertnot, fld)"
                )
            })
    }
}

/// Which burn backend to run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accelerator {
    /// NdArray backend
    Cpu,
    /// Wgpu backend
    Gpu,
}

impl FromStr for Accelerator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Accelerator::Cpu),
            "gpu" | "wgpu" | "cuda" => Ok(Accelerator::Gpu),
            other => Err(format!("unknown accelerator '{other}' (expected cpu or gpu)")),
        }
    }
}

/// A dataset split. File name on disk is `{split}.jsonl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub fn file_name(self) -> &'static str {
        match self {
            Split::Train => "train.jsonl",
            Split::Val   => "val.jsonl",
            Split::Test  => "test.jsonl",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Split::Train => "train",
            Split::Val   => "val",
            Split::Test  => "test",
        };
        f.write_str(s)
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "train"                => Ok(Split::Train),
            "val" | "dev" | "validation" => Ok(Split::Val),
            "test"                 => Ok(Split::Test),
            other => Err(format!("unknown split '{other}' (expected train, val or test)")),
        }
    }
}

/// The textual entailment corpora.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeCorpus {
    Snli,
    Mnli,
    Rte,
}

impl TeCorpus {
    pub const ALL: [TeCorpus; 3] = [TeCorpus::Snli, TeCorpus::Mnli, TeCorpus::Rte];

    pub fn name(self) -> &'static str {
        match self {
            TeCorpus::Snli => "snli",
            TeCorpus::Mnli => "mnli",
            TeCorpus::Rte  => "rte",
        }
    }

    /// SNLI and MNLI are three-way; RTE is binary.
    pub fn num_labels(self) -> usize {
        match self {
            TeCorpus::Snli | TeCorpus::Mnli => 3,
            TeCorpus::Rte => 2,
        }
    }
}

impl fmt::Display for TeCorpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TeCorpus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "snli" => Ok(TeCorpus::Snli),
            "mnli" => Ok(TeCorpus::Mnli),
            "rte"  => Ok(TeCorpus::Rte),
            other  => Err(format!("unknown entailment corpus '{other}' (expected snli, mnli or rte)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parse_and_display() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.name().parse::<ModelKind>(), Ok(kind));
            assert_eq!(kind.to_string(), kind.name());
        }
        assert_eq!("RuleTaker".parse::<ModelKind>(), Ok(ModelKind::RuleTaker));
        assert!("gpt".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_split_aliases() {
        assert_eq!("dev".parse::<Split>(), Ok(Split::Val));
        assert_eq!(Split::Test.file_name(), "test.jsonl");
    }

    #[test]
    fn test_te_corpus_labels() {
        for corpus in TeCorpus::ALL {
            assert_eq!(corpus.name().parse::<TeCorpus>(), Ok(corpus));
        }
        assert_eq!(TeCorpus::Snli.num_labels(), 3);
        assert_eq!(TeCorpus::Rte.num_labels(), 2);
    }

    #[test]
    fn test_accelerator_parse() {
        assert_eq!("cuda".parse::<Accelerator>(), Ok(Accelerator::Gpu));
        assert_eq!("CPU".parse::<Accelerator>(), Ok(Accelerator::Cpu));
    }
}
