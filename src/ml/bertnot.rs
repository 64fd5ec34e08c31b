// ============================================================
// Layer 5 — BERTNOT
// ============================================================
// Textual-entailment classifier over (premise, hypothesis).
// RTE has 2 labels, SNLI and MNLI have 3.
//
// Reference: Hosseini et al. (2021) Understanding by Understanding Not

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::data::{batcher::ClassificationBatch, codec::TextCodec};
use crate::ml::classifier::{SequenceClassifier, SequenceClassifierConfig};
use crate::ml::encoder::TextEncoderConfig;
use crate::ml::step::{StepModel, StepOutput};

/// The only prediction task a trained BERTNOT model supports.
pub const TE_TASK: &str = "te";

#[derive(Module, Debug)]
pub struct BertNot<B: Backend> {
    pub classifier: SequenceClassifier<B>,
    pub num_labels: usize,
}

impl<B: Backend> BertNot<B> {
    pub fn new(encoder: TextEncoderConfig, num_labels: usize, device: &B::Device) -> Self {
        let classifier = SequenceClassifierConfig::new(encoder, num_labels).init(device);
        Self { classifier, num_labels }
    }

    /// Entailment label of (premise, hypothesis). `task` must be "te".
    pub fn predict(&self, codec: &TextCodec, premise: &str, hypothesis: &str, task: &str) -> Result<usize> {
        if task != TE_TASK {
            bail!("BERTNOT supports the '{TE_TASK}' task only (got '{task}')");
        }
        self.classifier.predict_pair(codec, premise, hypothesis)
    }
}

impl<B: Backend> StepModel<B> for BertNot<B> {
    type Batch = ClassificationBatch<B>;

    fn step(&self, batch: Self::Batch) -> StepOutput<B> {
        self.classifier.classification_step(batch)
    }
}
