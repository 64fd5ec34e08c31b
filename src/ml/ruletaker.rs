// ============================================================
// Layer 5 — RuleTaker
// ============================================================
// Binary classifier over (theory, question): is the question
// true given the facts and rules? 0 = false, 1 = true.
//
// Reference: Clark et al. (2020) Transformers as Soft Reasoners
//            over Language

use anyhow::Result;
use burn::prelude::*;

use crate::data::{batcher::ClassificationBatch, codec::TextCodec};
use crate::ml::classifier::{SequenceClassifier, SequenceClassifierConfig};
use crate::ml::encoder::TextEncoderConfig;
use crate::ml::step::{StepModel, StepOutput};

pub const RULETAKER_LABELS: usize = 2;

#[derive(Module, Debug)]
pub struct RuleTaker<B: Backend> {
    pub classifier: SequenceClassifier<B>,
}

impl<B: Backend> RuleTaker<B> {
    pub fn new(encoder: TextEncoderConfig, device: &B::Device) -> Self {
        let classifier = SequenceClassifierConfig::new(encoder, RULETAKER_LABELS).init(device);
        Self { classifier }
    }

    pub fn predict(&self, codec: &TextCodec, context: &str, question: &str) -> Result<usize> {
        self.classifier.predict_pair(codec, context, question)
    }
}

impl<B: Backend> StepModel<B> for RuleTaker<B> {
    type Batch = ClassificationBatch<B>;

    fn step(&self, batch: Self::Batch) -> StepOutput<B> {
        self.classifier.classification_step(batch)
    }
}
