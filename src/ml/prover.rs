// ============================================================
// Layer 5 — PRover
// ============================================================
// Joint answer + proof model. One encoder pass feeds two heads:
//
//   h[CLS]          → answer head → 3 logits (False/True/Unknown)
//   h[node start]   → node head   → 1 logit per fact/rule
//
// A node is predicted to be in the proof when its logit is > 0.
//
// Loss = CE(answer) + masked BCE(nodes), where the BCE is averaged
// over real sentence nodes only:
//
//   bce = -( y·logσ(x) + (1-y)·logσ(-x) )
//
// Reference: Saha et al. (2020) PRover: Proof Generation for
//            Interpretable Reasoning over Rules

use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    nn::{loss::CrossEntropyLossConfig, Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::log_sigmoid,
};

use crate::data::{
    batcher::{ProverBatch, ProverBatcher},
    codec::{ProverInput, TextCodec},
    dataset::ProverSample,
};
use crate::domain::examples::PROOFWRITER_LABEL_TO_ID;
use crate::ml::encoder::{TextEncoder, TextEncoderConfig};
use crate::ml::step::{count_correct, StepModel, StepOutput};

pub const PROVER_LABELS: usize = PROOFWRITER_LABEL_TO_ID.len();

#[derive(Module, Debug)]
pub struct Prover<B: Backend> {
    pub encoder:     TextEncoder<B>,
    pub dropout:     Dropout,
    pub answer_head: Linear<B>,
    pub node_head:   Linear<B>,
}

pub struct ProverOutput<B: Backend> {
    /// [batch, 3]
    pub answer_logits: Tensor<B, 2>,
    /// [batch, seq_len]; only meaningful at node start positions
    pub node_logits:   Tensor<B, 2>,
}

impl<B: Backend> Prover<B> {
    pub fn new(encoder: TextEncoderConfig, device: &B::Device) -> Self {
        Self {
            dropout:     DropoutConfig::new(encoder.dropout).init(),
            answer_head: LinearConfig::new(encoder.d_model, PROVER_LABELS).init(device),
            node_head:   LinearConfig::new(encoder.d_model, 1).init(device),
            encoder:     encoder.init(device),
        }
    }

    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, pad_mask: Tensor<B, 2, Bool>) -> ProverOutput<B> {
        let [batch_size, seq_len] = input_ids.dims();
        let hidden = self.dropout.forward(self.encoder.forward(input_ids, pad_mask));

        let answer_logits = self.answer_head.forward(TextEncoder::pool_first(hidden.clone()));
        let node_logits = self.node_head.forward(hidden).reshape([batch_size, seq_len]);

        ProverOutput { answer_logits, node_logits }
    }

    /// Answer label (False=0, True=1, Unknown=2).
    pub fn predict(
        &self,
        codec:    &TextCodec,
        facts:    &[(String, String)],
        rules:    &[(String, String)],
        question: &str,
    ) -> Result<usize> {
        let (output, _) = self.run_single(codec, facts, rules, question)?;
        Ok(output.answer_logits.argmax(1).into_scalar().elem::<i64>() as usize)
    }

    /// Ids of the facts/rules scored as part of the proof, in input order.
    pub fn predict_proof(
        &self,
        codec:    &TextCodec,
        facts:    &[(String, String)],
        rules:    &[(String, String)],
        question: &str,
    ) -> Result<Vec<String>> {
        let (output, sample) = self.run_single(codec, facts, rules, question)?;
        let scores: Vec<f32> = output
            .node_logits
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read node scores: {e:?}"))?;

        Ok(sample
            .node_positions
            .iter()
            .zip(sample.node_ids)
            .filter(|(&pos, _)| scores.get(pos).is_some_and(|&s| s > 0.0))
            .map(|(_, id)| id)
            .collect())
    }

    fn run_single(
        &self,
        codec:    &TextCodec,
        facts:    &[(String, String)],
        rules:    &[(String, String)],
        question: &str,
    ) -> Result<(ProverOutput<B>, ProverInput)> {
        let input = codec.encode_prover_input(facts, rules, question)?;
        let sample = ProverSample {
            input_ids:      input.input_ids.clone(),
            attention_mask: input.attention_mask.clone(),
            label:          0,
            node_positions: input.node_positions.clone(),
            node_labels:    vec![0; input.node_positions.len()],
        };
        let device = self.answer_head.weight.val().device();
        let batch: ProverBatch<B> = ProverBatcher::new(device).batch(vec![sample]);
        Ok((self.forward(batch.input_ids, batch.pad_mask), input))
    }
}

impl<B: Backend> StepModel<B> for Prover<B> {
    type Batch = ProverBatch<B>;

    fn step(&self, batch: Self::Batch) -> StepOutput<B> {
        let output = self.forward(batch.input_ids, batch.pad_mask);
        let [batch_size, _] = output.answer_logits.dims();

        let ce = CrossEntropyLossConfig::new().init(&output.answer_logits.device());
        let answer_loss = ce.forward(output.answer_logits.clone(), batch.labels.clone());

        let x = output.node_logits;
        let y = batch.node_targets;
        let bce = (y.clone() * log_sigmoid(x.clone()) + (y.ones_like() - y) * log_sigmoid(x.neg())).neg();
        let node_count = batch.node_mask.clone().sum().clamp_min(1.0);
        let node_loss = (bce * batch.node_mask).sum() / node_count;

        StepOutput {
            loss:    answer_loss + node_loss,
            correct: count_correct(output.answer_logits, batch.labels),
            total:   batch_size,
        }
    }
}
