// ============================================================
// Layer 5 — Transformer Encoder
// ============================================================
// Shared by every model family. Each layer is post-norm:
//
//   x ─ self-attention (pad-masked) ─ add & norm
//     ─ position-wise feed-forward  ─ add & norm
//
// The input is token embeddings plus learned position
// embeddings; the decoder reuses the same Embeddings module.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need
//            Devlin et al. (2019) BERT

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig, Embedding, EmbeddingConfig, LayerNorm, LayerNormConfig,
        transformer::{PositionWiseFeedForward, PositionWiseFeedForwardConfig},
    },
    prelude::*,
};

#[derive(Config, Debug)]
pub struct TextEncoderConfig {
    pub vocab_size:  usize,
    /// Rows of the position table; longer inputs cannot be embedded
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    pub dropout:     f64,
}

impl TextEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TextEncoder<B> {
        TextEncoder {
            embeddings: Embeddings::new(self.vocab_size, self.max_seq_len, self.d_model, self.dropout, device),
            layers: (0..self.num_layers)
                .map(|_| EncoderLayer {
                    attention:      attention(self.d_model, self.num_heads, self.dropout, device),
                    attention_norm: LayerNormConfig::new(self.d_model).init(device),
                    feed_forward:   feed_forward(self.d_model, self.d_ff, self.dropout, device),
                    output_norm:    LayerNormConfig::new(self.d_model).init(device),
                    residual_drop:  DropoutConfig::new(self.dropout).init(),
                })
                .collect(),
            final_norm: LayerNormConfig::new(self.d_model).init(device),
        }
    }
}

pub(crate) fn attention<B: Backend>(
    d_model:   usize,
    num_heads: usize,
    dropout:   f64,
    device:    &B::Device,
) -> MultiHeadAttention<B> {
    MultiHeadAttentionConfig::new(d_model, num_heads)
        .with_dropout(dropout)
        .init(device)
}

pub(crate) fn feed_forward<B: Backend>(
    d_model: usize,
    d_ff:    usize,
    dropout: f64,
    device:  &B::Device,
) -> PositionWiseFeedForward<B> {
    PositionWiseFeedForwardConfig::new(d_model, d_ff)
        .with_dropout(dropout)
        .init(device)
}

/// Token plus learned position embeddings, then dropout.
#[derive(Module, Debug)]
pub struct Embeddings<B: Backend> {
    tokens:    Embedding<B>,
    positions: Embedding<B>,
    dropout:   Dropout,
}

impl<B: Backend> Embeddings<B> {
    pub fn new(vocab_size: usize, max_len: usize, d_model: usize, dropout: f64, device: &B::Device) -> Self {
        Self {
            tokens:    EmbeddingConfig::new(vocab_size, d_model).init(device),
            positions: EmbeddingConfig::new(max_len, d_model).init(device),
            dropout:   DropoutConfig::new(dropout).init(),
        }
    }

    /// [batch, len] ids → [batch, len, d_model]
    pub fn forward(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, len] = ids.dims();
        let index = Tensor::<B, 1, Int>::arange(0..len as i64, &ids.device())
            .unsqueeze::<2>()
            .expand([batch_size, len]);
        let summed = self.tokens.forward(ids) + self.positions.forward(index);
        self.dropout.forward(summed)
    }
}

/// `norm(x + dropout(sublayer))`
pub(crate) fn add_and_norm<B: Backend>(
    norm:     &LayerNorm<B>,
    dropout:  &Dropout,
    x:        Tensor<B, 3>,
    sublayer: Tensor<B, 3>,
) -> Tensor<B, 3> {
    norm.forward(x + dropout.forward(sublayer))
}

#[derive(Module, Debug)]
pub struct EncoderLayer<B: Backend> {
    pub attention:      MultiHeadAttention<B>,
    pub attention_norm: LayerNorm<B>,
    pub feed_forward:   PositionWiseFeedForward<B>,
    pub output_norm:    LayerNorm<B>,
    pub residual_drop:  Dropout,
}

impl<B: Backend> EncoderLayer<B> {
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attended = self
            .attention
            .forward(MhaInput::self_attn(x.clone()).mask_pad(pad_mask))
            .context;
        let x = add_and_norm(&self.attention_norm, &self.residual_drop, x, attended);

        let transformed = self.feed_forward.forward(x.clone());
        add_and_norm(&self.output_norm, &self.residual_drop, x, transformed)
    }
}

#[derive(Module, Debug)]
pub struct TextEncoder<B: Backend> {
    pub embeddings: Embeddings<B>,
    pub layers:     Vec<EncoderLayer<B>>,
    pub final_norm: LayerNorm<B>,
}

impl<B: Backend> TextEncoder<B> {
    /// input_ids: [batch, seq_len], pad_mask true at [PAD]
    /// → hidden states [batch, seq_len, d_model]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let hidden = self
            .layers
            .iter()
            .fold(self.embeddings.forward(input_ids), |x, layer| layer.forward(x, pad_mask.clone()));
        self.final_norm.forward(hidden)
    }

    /// Hidden state of the first ([CLS]) token: [batch, d_model].
    pub fn pool_first(hidden: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch_size, _, d_model] = hidden.dims();
        hidden
            .slice([0..batch_size, 0..1, 0..d_model])
            .reshape([batch_size, d_model])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_encoder_output_shape() {
        let device = Default::default();
        let encoder = TextEncoderConfig::new(50, 16, 32, 4, 2, 64, 0.0).init::<TestBackend>(&device);

        let ids = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![101i32, 7, 8, 102, 0, 0, 101, 9, 102, 0, 0, 0], [2, 6]),
            &device,
        );
        let mask = ids.clone().equal_elem(0);
        let hidden = encoder.forward(ids, mask);
        assert_eq!(hidden.dims(), [2, 6, 32]);

        let pooled = TextEncoder::pool_first(hidden);
        assert_eq!(pooled.dims(), [2, 32]);
    }

    #[test]
    fn test_padding_does_not_leak_into_real_tokens() {
        let device = Default::default();
        let encoder = TextEncoderConfig::new(50, 8, 16, 2, 1, 32, 0.0).init::<TestBackend>(&device);

        let a = Tensor::<TestBackend, 2, Int>::from_data(TensorData::new(vec![101i32, 7, 102, 0], [1, 4]), &device);
        let b = Tensor::<TestBackend, 2, Int>::from_data(TensorData::new(vec![101i32, 7, 102, 0], [1, 4]), &device);
        let mask_a = a.clone().equal_elem(0);
        // Same real tokens, but the pad slot holds a different id
        let b = b.slice_assign([0..1, 3..4], Tensor::from_data(TensorData::new(vec![9i32], [1, 1]), &device));

        let ha = TextEncoder::pool_first(encoder.forward(a, mask_a.clone()));
        let hb = TextEncoder::pool_first(encoder.forward(b, mask_a));
        let diff: f32 = (ha - hb).abs().max().into_scalar();
        assert!(diff < 1e-5, "pad content changed [CLS] by {diff}");
    }
}
