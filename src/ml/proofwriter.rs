// ============================================================
// Layer 5 — ProofWriter
// ============================================================
// Generative proof QA. The model reads
//
//   $question$ = {question} ; $context$ = triple1: ...rule1: ...
//
// and writes "{answer} ; {proof}", e.g. "True ; [(((triple1) -> rule1))]".
//
// Reference: Tafjord et al. (2021) ProofWriter: Generating
//            Implications, Proofs, and Abductive Statements

use anyhow::Result;
use burn::prelude::*;

use crate::data::{batcher::Seq2SeqBatch, codec::{proofwriter_source, TextCodec}};
use crate::ml::generator::{Seq2SeqConfig, Seq2SeqGenerator};
use crate::ml::step::{StepModel, StepOutput};

#[derive(Module, Debug)]
pub struct ProofWriter<B: Backend> {
    pub generator: Seq2SeqGenerator<B>,
}

impl<B: Backend> ProofWriter<B> {
    pub fn new(config: Seq2SeqConfig, device: &B::Device) -> Self {
        Self { generator: config.init(device) }
    }

    /// Generated "{answer} ; {proof}" text for a rendered context.
    pub fn predict(&self, codec: &TextCodec, context: &str, question: &str) -> Result<String> {
        self.generator.generate_text(codec, &proofwriter_source(context, question))
    }
}

impl<B: Backend> StepModel<B> for ProofWriter<B> {
    type Batch = Seq2SeqBatch<B>;

    fn step(&self, batch: Self::Batch) -> StepOutput<B> {
        self.generator.seq2seq_step(batch)
    }
}
