// ============================================================
// Layer 4 — Encoded Samples
// ============================================================
// Fixed-length id vectors produced by the TextCodec, and the
// in-memory dataset the DataLoaders read them from.

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One encoded classification example.
/// Sequence format: [CLS] a [SEP] b [SEP] [PAD]...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
}

/// One encoded PRover example: a classification sample plus the
/// start position of every sentence node and whether it is in the proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProverSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
    pub node_positions: Vec<usize>,
    pub node_labels:    Vec<u8>,
}

/// One encoded sequence-to-sequence example.
/// target_ids is [BOS] target [EOS] [PAD]...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seq2SeqSample {
    pub source_ids:  Vec<u32>,
    pub source_mask: Vec<u32>,
    pub target_ids:  Vec<u32>,
}

/// An in-memory dataset of already-encoded samples.
pub struct SampleDataset<S> {
    samples: Vec<S>,
}

impl<S> SampleDataset<S> {
    pub fn new(samples: Vec<S>) -> Self {
        Self { samples }
    }
}

impl<S: Clone + Send + Sync> Dataset<S> for SampleDataset<S> {
    fn get(&self, index: usize) -> Option<S> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
