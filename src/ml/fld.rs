// ============================================================
// Layer 5 — FLD All-at-once Prover
// ============================================================
// Generates the whole serialised proof for an FLD prompt in one
// pass, ending with __PROVED__, __DISPROVED__ or __UNKNOWN__.
//
// Reference: Morishita et al. (2023) Learning Deductive Reasoning
//            from Synthetic Corpus based on Formal Logic

use anyhow::Result;
use burn::prelude::*;

use crate::data::{batcher::Seq2SeqBatch, codec::TextCodec};
use crate::ml::generator::{Seq2SeqConfig, Seq2SeqGenerator};
use crate::ml::step::{StepModel, StepOutput};

#[derive(Module, Debug)]
pub struct FldProver<B: Backend> {
    pub generator: Seq2SeqGenerator<B>,
}

impl<B: Backend> FldProver<B> {
    pub fn new(config: Seq2SeqConfig, device: &B::Device) -> Self {
        Self { generator: config.init(device) }
    }

    pub fn predict(&self, codec: &TextCodec, prompt: &str) -> Result<String> {
        self.generator.generate_text(codec, prompt)
    }
}

impl<B: Backend> StepModel<B> for FldProver<B> {
    type Batch = Seq2SeqBatch<B>;

    fn step(&self, batch: Self::Batch) -> StepOutput<B> {
        self.generator.seq2seq_step(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{batcher::Seq2SeqBatcher, codec::test_codec};
    use crate::ml::{
        decoder::TextDecoderConfig,
        encoder::TextEncoderConfig,
        generator::tests::always_predict,
    };
    use burn::{backend::NdArray, data::dataloader::batcher::Batcher};

    type TestBackend = NdArray;

    const PROMPT: &str = "$hypothesis$ = A ; $context$ = fact1: A";

    fn prover(codec: &TextCodec) -> FldProver<TestBackend> {
        let config = Seq2SeqConfig::new(
            TextEncoderConfig::new(codec.vocab_size(), codec.max_seq_len(), 16, 2, 1, 32, 0.0),
            TextDecoderConfig::new(codec.vocab_size(), codec.max_target_len(), 16, 2, 1, 32, 0.0),
        );
        FldProver::new(config, &Default::default())
    }

    #[test]
    fn test_step_loss_is_finite() {
        let codec = test_codec(&[PROMPT, "fact1 -> hypothesis; __PROVED__"]);
        let model = prover(&codec);
        let sample = codec.encode_seq2seq(PROMPT, "fact1 -> hypothesis; __PROVED__").unwrap();
        let batch = Seq2SeqBatcher::<TestBackend>::new(Default::default()).batch(vec![sample]);

        let out = model.step(batch);
        let loss: f32 = out.loss.into_scalar();
        assert!(loss.is_finite());
        assert!(out.total > 0);
    }

    #[test]
    fn test_predict_returns_plain_proof_text() {
        // The only corpus word gets the first free id
        let codec = test_codec(&["__PROVED__"]);
        let mut model = prover(&codec);
        always_predict(&mut model.generator, crate::infra::tokenizer_store::FIRST_WORD_ID);

        let text = model.predict(&codec, PROMPT).unwrap();
        let words: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(words.len(), codec.max_target_len() - 1);
        assert!(words.iter().all(|w| *w == "__proved__"));
        assert!(!text.contains("[BOS]") && !text.contains("[EOS]"));
    }
}
