// ============================================================
// Layer 5 — Sequence Classifier
// ============================================================
// Encoder + [CLS] pooling + linear head. RuleTaker and BERTNOT
// are both this model with a different number of labels.
//
//   [CLS] a [SEP] b [SEP] → encoder → h[CLS] → dropout → Linear → logits

use anyhow::Result;
use burn::{
    data::dataloader::batcher::Batcher,
    nn::{loss::CrossEntropyLossConfig, Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
};

use crate::data::{
    batcher::{ClassificationBatch, ClassificationBatcher},
    codec::TextCodec,
};
use crate::ml::encoder::{TextEncoder, TextEncoderConfig};
use crate::ml::step::{count_correct, StepOutput};

#[derive(Config, Debug)]
pub struct SequenceClassifierConfig {
    pub encoder:    TextEncoderConfig,
    pub num_labels: usize,
}

impl SequenceClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SequenceClassifier<B> {
        SequenceClassifier {
            encoder: self.encoder.init(device),
            dropout: DropoutConfig::new(self.encoder.dropout).init(),
            head:    LinearConfig::new(self.encoder.d_model, self.num_labels).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct SequenceClassifier<B: Backend> {
    pub encoder: TextEncoder<B>,
    pub dropout: Dropout,
    pub head:    Linear<B>,
}

impl<B: Backend> SequenceClassifier<B> {
    /// → logits [batch, num_labels]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 2> {
        let hidden = self.encoder.forward(input_ids, pad_mask);
        let pooled = TextEncoder::pool_first(hidden);
        self.head.forward(self.dropout.forward(pooled))
    }

    pub fn classification_step(&self, batch: ClassificationBatch<B>) -> StepOutput<B> {
        let logits = self.forward(batch.input_ids, batch.pad_mask);
        let [batch_size, _] = logits.dims();

        let ce = CrossEntropyLossConfig::new().init(&logits.device());
        let loss = ce.forward(logits.clone(), batch.labels.clone());

        StepOutput { loss, correct: count_correct(logits, batch.labels), total: batch_size }
    }

    /// Predicted label of a single (a, b) pair.
    pub fn predict_pair(&self, codec: &TextCodec, a: &str, b: &str) -> Result<usize> {
        let device = self.head.weight.val().device();
        let sample = codec.encode_classification(a, b, 0)?;
        let batch: ClassificationBatch<B> = ClassificationBatcher::new(device).batch(vec![sample]);

        let logits = self.forward(batch.input_ids, batch.pad_mask);
        Ok(logits.argmax(1).into_scalar().elem::<i64>() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_logits_shape_and_finite_loss() {
        let device = Default::default();
        let cfg = SequenceClassifierConfig::new(TextEncoderConfig::new(30, 8, 16, 2, 1, 32, 0.0), 3);
        let model = cfg.init::<TestBackend>(&device);

        let ids = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![101i32, 5, 102, 6, 102, 0, 0, 0], [1, 8]),
            &device,
        );
        let mask = ids.clone().equal_elem(0);
        let labels = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![2i32], [1]), &device);

        assert_eq!(model.forward(ids.clone(), mask.clone()).dims(), [1, 3]);

        let out = model.classification_step(ClassificationBatch { input_ids: ids, pad_mask: mask, labels });
        let loss: f32 = out.loss.into_scalar();
        assert!(loss.is_finite());
        assert_eq!(out.total, 1);
        assert!(out.correct <= 1);
    }
}
