// ============================================================
// Layer 4 — Batchers
// ============================================================
// Implement Burn's Batcher trait for the three sample shapes:
//
//   ClassificationSample → ClassificationBatch  (RuleTaker, BERTNOT)
//   ProverSample         → ProverBatch          (PRover)
//   Seq2SeqSample        → Seq2SeqBatch         (ProofWriter, FLD)
//
// Every sample is already padded by the codec, so batching is
// flatten + reshape:
//   Vec of N samples, each of length S → tensor [N, S]
//
// Padding masks are Bool tensors where `true` marks a [PAD]
// position, which is the convention Burn's attention expects.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::{ClassificationSample, ProverSample, Seq2SeqSample};

// ─── Tensor Helpers ───────────────────────────────────────────────────────────

/// Stack equal-length u32 rows into an Int tensor [rows, len].
fn int_matrix<B: Backend, R: AsRef<[u32]>>(rows: &[R], device: &B::Device) -> Tensor<B, 2, Int> {
    let len = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
    let flat: Vec<i32> = rows
        .iter()
        .flat_map(|r| r.as_ref().iter().map(|&x| x as i32))
        .collect();
    Tensor::from_data(TensorData::new(flat, [rows.len(), len]), device)
}

fn int_vector<B: Backend>(values: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let flat: Vec<i32> = values.iter().map(|&x| x as i32).collect();
    Tensor::from_data(TensorData::new(flat, [values.len()]), device)
}

/// Attention mask (1 = real, 0 = pad) → Bool pad mask (true = pad).
fn pad_mask<B: Backend>(attention: Tensor<B, 2, Int>) -> Tensor<B, 2, Bool> {
    attention.equal_elem(0)
}

// ─── Classification ───────────────────────────────────────────────────────────
/// A batch of sequence-pair classification samples.
#[derive(Debug, Clone)]
pub struct ClassificationBatch<B: Backend> {
    /// [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,
    /// [batch_size, seq_len], true at [PAD]
    pub pad_mask:  Tensor<B, 2, Bool>,
    /// [batch_size]
    pub labels:    Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct ClassificationBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ClassificationBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ClassificationSample, ClassificationBatch<B>> for ClassificationBatcher<B> {
    fn batch(&self, items: Vec<ClassificationSample>) -> ClassificationBatch<B> {
        let ids:    Vec<&[u32]> = items.iter().map(|s| s.input_ids.as_slice()).collect();
        let masks:  Vec<&[u32]> = items.iter().map(|s| s.attention_mask.as_slice()).collect();
        let labels: Vec<usize>  = items.iter().map(|s| s.label).collect();

        ClassificationBatch {
            input_ids: int_matrix(&ids, &self.device),
            pad_mask:  pad_mask(int_matrix(&masks, &self.device)),
            labels:    int_vector(&labels, &self.device),
        }
    }
}

// ─── PRover ───────────────────────────────────────────────────────────────────
/// A batch of PRover samples. Node targets live on the token grid:
/// node_mask is 1.0 at every sentence start, node_targets is 1.0
/// where that sentence belongs to the proof.
#[derive(Debug, Clone)]
pub struct ProverBatch<B: Backend> {
    pub input_ids:    Tensor<B, 2, Int>,
    pub pad_mask:     Tensor<B, 2, Bool>,
    /// [batch_size] answer ids (False=0, True=1, Unknown=2)
    pub labels:       Tensor<B, 1, Int>,
    /// [batch_size, seq_len]
    pub node_targets: Tensor<B, 2>,
    /// [batch_size, seq_len]
    pub node_mask:    Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct ProverBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ProverBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ProverSample, ProverBatch<B>> for ProverBatcher<B> {
    fn batch(&self, items: Vec<ProverSample>) -> ProverBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map(|s| s.input_ids.len()).unwrap_or(0);

        let ids:    Vec<&[u32]> = items.iter().map(|s| s.input_ids.as_slice()).collect();
        let masks:  Vec<&[u32]> = items.iter().map(|s| s.attention_mask.as_slice()).collect();
        let labels: Vec<usize>  = items.iter().map(|s| s.label).collect();

        // Scatter node labels onto the token grid
        let mut targets = vec![0.0f32; batch_size * seq_len];
        let mut mask    = vec![0.0f32; batch_size * seq_len];
        for (row, sample) in items.iter().enumerate() {
            for (&pos, &label) in sample.node_positions.iter().zip(&sample.node_labels) {
                if pos < seq_len {
                    mask[row * seq_len + pos]    = 1.0;
                    targets[row * seq_len + pos] = f32::from(label);
                }
            }
        }

        ProverBatch {
            input_ids:    int_matrix(&ids, &self.device),
            pad_mask:     pad_mask(int_matrix(&masks, &self.device)),
            labels:       int_vector(&labels, &self.device),
            node_targets: Tensor::from_data(TensorData::new(targets, [batch_size, seq_len]), &self.device),
            node_mask:    Tensor::from_data(TensorData::new(mask, [batch_size, seq_len]), &self.device),
        }
    }
}

// ─── Seq2Seq ──────────────────────────────────────────────────────────────────
/// A batch of generation samples. The decoder sees the target
/// shifted right by one:
///   decoder_input  = target[.. T-1]   ([BOS] a b c)
///   decoder_target = target[1 ..]     (a b c [EOS])
#[derive(Debug, Clone)]
pub struct Seq2SeqBatch<B: Backend> {
    pub source_ids:      Tensor<B, 2, Int>,
    pub source_pad_mask: Tensor<B, 2, Bool>,
    pub decoder_input:   Tensor<B, 2, Int>,
    pub decoder_target:  Tensor<B, 2, Int>,
}

#[derive(Clone, Debug)]
pub struct Seq2SeqBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> Seq2SeqBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<Seq2SeqSample, Seq2SeqBatch<B>> for Seq2SeqBatcher<B> {
    fn batch(&self, items: Vec<Seq2SeqSample>) -> Seq2SeqBatch<B> {
        let src:    Vec<&[u32]> = items.iter().map(|s| s.source_ids.as_slice()).collect();
        let masks:  Vec<&[u32]> = items.iter().map(|s| s.source_mask.as_slice()).collect();
        let inputs: Vec<&[u32]> = items
            .iter()
            .map(|s| &s.target_ids[..s.target_ids.len().saturating_sub(1)])
            .collect();
        let targets: Vec<&[u32]> = items
            .iter()
            .map(|s| &s.target_ids[1.min(s.target_ids.len())..])
            .collect();

        Seq2SeqBatch {
            source_ids:      int_matrix(&src, &self.device),
            source_pad_mask: pad_mask(int_matrix(&masks, &self.device)),
            decoder_input:   int_matrix(&inputs, &self.device),
            decoder_target:  int_matrix(&targets, &self.device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::ElementConversion;

    type TestBackend = NdArray;

    #[test]
    fn test_classification_batch_shapes() {
        let device = Default::default();
        let batcher = ClassificationBatcher::<TestBackend>::new(device);
        let items = vec![
            ClassificationSample { input_ids: vec![101, 5, 102, 0], attention_mask: vec![1, 1, 1, 0], label: 1 },
            ClassificationSample { input_ids: vec![101, 6, 7, 102], attention_mask: vec![1, 1, 1, 1], label: 0 },
        ];
        let batch = batcher.batch(items);
        assert_eq!(batch.input_ids.dims(), [2, 4]);
        assert_eq!(batch.labels.dims(), [2]);

        let padded: i64 = batch.pad_mask.int().sum().into_scalar().elem::<i64>();
        assert_eq!(padded, 1);
    }

    #[test]
    fn test_prover_batch_scatters_nodes() {
        let device = Default::default();
        let batcher = ProverBatcher::<TestBackend>::new(device);
        let items = vec![ProverSample {
            input_ids:      vec![101, 5, 102, 10, 11, 20, 102, 0],
            attention_mask: vec![1, 1, 1, 1, 1, 1, 1, 0],
            label:          1,
            node_positions: vec![3, 5],
            node_labels:    vec![0, 1],
        }];
        let batch = batcher.batch(items);

        let mask: Vec<f32> = batch.node_mask.into_data().to_vec::<f32>().unwrap();
        let tgt:  Vec<f32> = batch.node_targets.into_data().to_vec::<f32>().unwrap();
        assert_eq!(mask, vec![0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(tgt,  vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_seq2seq_shifts_target() {
        let device = Default::default();
        let batcher = Seq2SeqBatcher::<TestBackend>::new(device);
        let items = vec![Seq2SeqSample {
            source_ids:  vec![7, 8, 102, 0],
            source_mask: vec![1, 1, 1, 0],
            target_ids:  vec![104, 9, 105, 0],
        }];
        let batch = batcher.batch(items);
        assert_eq!(batch.decoder_input.dims(), [1, 3]);

        let input:  Vec<i64> = batch.decoder_input.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        let target: Vec<i64> = batch.decoder_target.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(input,  vec![104, 9, 105]);
        assert_eq!(target, vec![9, 105, 0]);
    }
}
