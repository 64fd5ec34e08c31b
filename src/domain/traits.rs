// ============================================================
// Layer 3 — Core Traits
// ============================================================
// CorpusText lets the tokenizer store build one vocabulary from
// any task's training items without knowing their shape:
//
//   RuleTakerItem   → context, question, answer words
//   ProofWriterItem → every fact/rule, question, generation target
//   TeItem          → premise, hypothesis
//   FldItem         → prompt and gold proof
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::examples::{FldItem, ProofWriterItem, RuleTakerItem, TeItem};

/// Anything that contributes raw text to the tokenizer vocabulary.
pub trait CorpusText {
    fn corpus_texts(&self) -> Vec<&str>;
}

impl CorpusText for RuleTakerItem {
    fn corpus_texts(&self) -> Vec<&str> {
        vec![self.context.as_str(), self.question.as_str()]
    }
}

impl CorpusText for ProofWriterItem {
    fn corpus_texts(&self) -> Vec<&str> {
        let mut texts: Vec<&str> = self
            .sentences()
            .flat_map(|(id, text)| [id.as_str(), text.as_str()])
            .collect();
        texts.push(self.question.as_str());
        texts.push(self.proofs.as_str());
        // Answer words appear in ProofWriter targets
        texts.extend(["True", "False", "Unknown"]);
        texts
    }
}

impl CorpusText for TeItem {
    fn corpus_texts(&self) -> Vec<&str> {
        vec![self.premise.as_str(), self.hypothesis.as_str()]
    }
}

impl CorpusText for FldItem {
    fn corpus_texts(&self) -> Vec<&str> {
        vec![self.prompt_serial.as_str(), self.proof_serial.as_str()]
    }
}

/// Gather the corpus of a whole item collection.
pub fn collect_corpus<T: CorpusText>(items: &[T]) -> Vec<String> {
    items
        .iter()
        .flat_map(|i| i.corpus_texts().into_iter().map(str::to_string))
        .collect()
}
