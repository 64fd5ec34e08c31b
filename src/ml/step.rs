// ============================================================
// Layer 5 — Step Trait
// ============================================================
// The one seam between task models and the fit loop. A model
// turns one batch into a loss plus how many of its predictions
// were right; the same step serves training, validation and
// testing. The loop decides whether to backpropagate.
//
// What counts as a prediction depends on the model:
//   classifiers → one label per example
//   PRover      → the answer label per example
//   generators  → every non-pad target token

use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};
use std::fmt::Debug;

use crate::data::codec::PAD_ID;

/// Loss and accuracy counts for one batch.
#[derive(Debug, Clone)]
pub struct StepOutput<B: Backend> {
    /// Scalar loss, shape [1]
    pub loss:    Tensor<B, 1>,
    pub correct: usize,
    pub total:   usize,
}

pub trait StepModel<B: Backend>: Module<B> {
    type Batch: Send + Clone + Debug + 'static;

    fn step(&self, batch: Self::Batch) -> StepOutput<B>;
}

/// Number of rows whose argmax matches the label.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> usize {
    let [batch_size, _] = logits.dims();
    let preds = logits.argmax(1).reshape([batch_size]);
    preds.equal(labels).int().sum().into_scalar().elem::<i64>() as usize
}

/// Cross-entropy over [batch, len, vocab] logits ignoring [PAD]
/// targets, and the (correct, total) count over non-pad tokens.
pub fn token_loss<B: Backend>(logits: Tensor<B, 3>, targets: Tensor<B, 2, Int>) -> StepOutput<B> {
    let [batch_size, len, vocab] = logits.dims();
    let flat_logits  = logits.reshape([batch_size * len, vocab]);
    let flat_targets = targets.reshape([batch_size * len]);

    let ce = CrossEntropyLossConfig::new()
        .with_pad_tokens(Some(vec![PAD_ID as usize]))
        .init(&flat_logits.device());
    let loss = ce.forward(flat_logits.clone(), flat_targets.clone());

    let real  = flat_targets.clone().equal_elem(PAD_ID as i32).bool_not();
    let preds = flat_logits.argmax(1).reshape([batch_size * len]);
    let hits  = preds.equal(flat_targets).int() * real.clone().int();

    StepOutput {
        loss,
        correct: hits.sum().into_scalar().elem::<i64>() as usize,
        total:   real.int().sum().into_scalar().elem::<i64>() as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_count_correct() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.9f32, 0.1, 0.2, 0.8, 0.7, 0.3], [3, 2]),
            &device,
        );
        let labels = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![0i32, 1, 1], [3]), &device);
        assert_eq!(count_correct(logits, labels), 2);
    }

    #[test]
    fn test_token_loss_skips_padding() {
        let device = Default::default();
        // vocab of 3; second position is padding
        let logits = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(vec![0.0f32, 5.0, 0.0, 5.0, 0.0, 0.0], [1, 2, 3]),
            &device,
        );
        let targets = Tensor::<TestBackend, 2, Int>::from_data(TensorData::new(vec![1i32, 0], [1, 2]), &device);

        let out = token_loss(logits, targets);
        assert_eq!(out.total, 1);
        assert_eq!(out.correct, 1);
        let loss: f32 = out.loss.into_scalar();
        assert!(loss.is_finite() && loss < 0.1);
    }
}
