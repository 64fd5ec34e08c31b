// ============================================================
// Layer 5 — Encoder-Decoder Generator
// ============================================================
// The T5-style backbone of the ProofWriter and FLD provers.
//
// Training uses teacher forcing: the decoder reads the gold
// target shifted right and predicts the next token everywhere
// at once.
//
// Inference is greedy: encode the source once, then repeatedly
// feed the prefix generated so far and append the argmax of the
// last position until [EOS] or the target budget is reached.

use anyhow::Result;
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::{
    batcher::{Seq2SeqBatch, Seq2SeqBatcher},
    codec::{TextCodec, BOS_ID, EOS_ID},
    dataset::Seq2SeqSample,
};
use crate::ml::decoder::{TextDecoder, TextDecoderConfig};
use crate::ml::encoder::{TextEncoder, TextEncoderConfig};
use crate::ml::step::{token_loss, StepOutput};

#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub encoder: TextEncoderConfig,
    pub decoder: TextDecoderConfig,
}

impl Seq2SeqConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2SeqGenerator<B> {
        Seq2SeqGenerator {
            encoder:        self.encoder.init(device),
            decoder:        self.decoder.init(device),
            max_target_len: self.decoder.max_target_len,
        }
    }
}

#[derive(Module, Debug)]
pub struct Seq2SeqGenerator<B: Backend> {
    pub encoder:        TextEncoder<B>,
    pub decoder:        TextDecoder<B>,
    pub max_target_len: usize,
}

impl<B: Backend> Seq2SeqGenerator<B> {
    /// → logits [batch, tgt_len, vocab_size]
    pub fn forward(&self, batch: &Seq2SeqBatch<B>) -> Tensor<B, 3> {
        let memory = self
            .encoder
            .forward(batch.source_ids.clone(), batch.source_pad_mask.clone());
        self.decoder
            .forward(batch.decoder_input.clone(), memory, batch.source_pad_mask.clone())
    }

    pub fn seq2seq_step(&self, batch: Seq2SeqBatch<B>) -> StepOutput<B> {
        let logits = self.forward(&batch);
        token_loss(logits, batch.decoder_target)
    }

    /// Greedy decoding of one encoded source. Returns the generated
    /// ids without [BOS] and without the closing [EOS].
    pub fn generate(&self, source_ids: Tensor<B, 2, Int>, source_pad_mask: Tensor<B, 2, Bool>) -> Vec<u32> {
        let device = source_ids.device();
        let memory = self.encoder.forward(source_ids, source_pad_mask.clone());

        let mut prefix: Vec<i32> = vec![BOS_ID as i32];
        // The decoder's position table has max_target_len rows and
        // the prefix always carries [BOS]
        while prefix.len() < self.max_target_len {
            let len = prefix.len();
            let input = Tensor::<B, 2, Int>::from_data(TensorData::new(prefix.clone(), [1, len]), &device);
            let logits = self.decoder.forward(input, memory.clone(), source_pad_mask.clone());
            let [_, _, vocab] = logits.dims();

            let next = logits
                .slice([0..1, len - 1..len, 0..vocab])
                .reshape([vocab])
                .argmax(0)
                .into_scalar()
                .elem::<i64>() as i32;
            if next == EOS_ID as i32 {
                break;
            }
            prefix.push(next);
        }

        prefix.into_iter().skip(1).map(|id| id as u32).collect()
    }

    /// Encode `source`, decode greedily, and detokenise.
    pub fn generate_text(&self, codec: &TextCodec, source: &str) -> Result<String> {
        let (source_ids, source_mask) = codec.encode_source(source)?;
        let sample = Seq2SeqSample { source_ids, source_mask, target_ids: vec![BOS_ID, EOS_ID] };
        let device = self.decoder.vocab_projection.weight.val().device();
        let batch: Seq2SeqBatch<B> = Seq2SeqBatcher::new(device).batch(vec![sample]);

        let ids = self.generate(batch.source_ids, batch.source_pad_mask);
        codec.decode(&ids)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::codec::test_codec;
    use burn::{backend::NdArray, module::Param};

    type TestBackend = NdArray;

    /// Make `token` the argmax at every decoder position.
    pub(crate) fn always_predict<B: Backend>(model: &mut Seq2SeqGenerator<B>, token: u32) {
        let projection = &mut model.decoder.vocab_projection;
        let [d_model, vocab] = projection.weight.dims();
        let device = projection.weight.device();
        let mut bias = vec![0.0f32; vocab];
        bias[token as usize] = 1.0;

        projection.weight = Param::from_tensor(Tensor::zeros([d_model, vocab], &device));
        projection.bias = Some(Param::from_tensor(Tensor::from_data(TensorData::new(bias, [vocab]), &device)));
    }

    fn source(device: &<TestBackend as Backend>::Device) -> (Tensor<TestBackend, 2, Int>, Tensor<TestBackend, 2, Bool>) {
        let ids = Tensor::<TestBackend, 2, Int>::from_data(TensorData::new(vec![110i32, 111, 102, 0, 0, 0], [1, 6]), device);
        let mask = ids.clone().equal_elem(0);
        (ids, mask)
    }

    fn config(vocab: usize, src: usize, tgt: usize) -> Seq2SeqConfig {
        Seq2SeqConfig::new(
            TextEncoderConfig::new(vocab, src, 16, 2, 1, 32, 0.0),
            TextDecoderConfig::new(vocab, tgt, 16, 2, 1, 32, 0.0),
        )
    }

    #[test]
    fn test_step_loss_and_counts() {
        let device = Default::default();
        let model = config(120, 6, 5).init::<TestBackend>(&device);
        let batch = Seq2SeqBatcher::<TestBackend>::new(device).batch(vec![
            Seq2SeqSample {
                source_ids:  vec![110, 111, 102, 0, 0, 0],
                source_mask: vec![1, 1, 1, 0, 0, 0],
                target_ids:  vec![BOS_ID, 112, EOS_ID, 0, 0],
            },
        ]);

        let out = model.seq2seq_step(batch);
        let loss: f32 = out.loss.into_scalar();
        assert!(loss.is_finite());
        // 112 and [EOS] are the only real targets
        assert_eq!(out.total, 2);
    }

    #[test]
    fn test_generation_respects_budget() {
        let device = Default::default();
        let model = config(120, 6, 5).init::<TestBackend>(&device);
        let ids = Tensor::<TestBackend, 2, Int>::from_data(TensorData::new(vec![110i32, 111, 102, 0, 0, 0], [1, 6]), &device);
        let mask = ids.clone().equal_elem(0);

        let out = model.generate(ids, mask);
        assert!(out.len() < 5);
        assert!(!out.contains(&EOS_ID));
    }

    #[test]
    fn test_generation_stops_at_eos() {
        let device = Default::default();
        let mut model = config(120, 6, 8).init::<TestBackend>(&device);
        always_predict(&mut model, EOS_ID);

        let (ids, mask) = source(&device);
        assert!(model.generate(ids, mask).is_empty());
    }

    #[test]
    fn test_generation_without_eos_fills_the_budget() {
        let device = Default::default();
        let mut model = config(120, 6, 8).init::<TestBackend>(&device);
        always_predict(&mut model, 110);

        let (ids, mask) = source(&device);
        // [BOS] takes one of the eight positions
        assert_eq!(model.generate(ids, mask), vec![110; 7]);
    }

    #[test]
    fn test_generate_text_runs_end_to_end() {
        let device = Default::default();
        let codec = test_codec(&["$question$ = Bob is red . ; $context$ = triple1 : Bob is red .", "True ; triple1"]);
        let model = config(codec.vocab_size(), codec.max_seq_len(), codec.max_target_len()).init::<TestBackend>(&device);

        let text = model.generate_text(&codec, "$question$ = Bob is red .").unwrap();
        assert!(text.split_whitespace().count() < codec.max_target_len());
    }
}
