// ============================================================
// Layer 5 — Transformer Decoder
// ============================================================
// Decoder half of the encoder-decoder generators:
//
//   y ─ causal self-attention            ─ add & norm
//     ─ cross-attention over encoder memory ─ add & norm
//     ─ position-wise feed-forward       ─ add & norm
//     ─ projection to vocabulary logits
//
// Position i never attends to j > i.
//
// Reference: Vaswani et al. (2017) §3.1 (Decoder)
//            Raffel et al. (2020) T5

use burn::{
    nn::{
        attention::{generate_autoregressive_mask, MhaInput, MultiHeadAttention},
        Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear, LinearConfig,
        transformer::PositionWiseFeedForward,
    },
    prelude::*,
};

use crate::ml::encoder::{add_and_norm, attention, feed_forward, Embeddings};

#[derive(Config, Debug)]
pub struct TextDecoderConfig {
    pub vocab_size:     usize,
    /// Longest target, [BOS] and [EOS] included
    pub max_target_len: usize,
    pub d_model:        usize,
    pub num_heads:      usize,
    pub num_layers:     usize,
    pub d_ff:           usize,
    pub dropout:        f64,
}

impl TextDecoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TextDecoder<B> {
        let layers = (0..self.num_layers)
            .map(|_| DecoderLayer {
                self_attention:  attention(self.d_model, self.num_heads, self.dropout, device),
                self_norm:       LayerNormConfig::new(self.d_model).init(device),
                cross_attention: attention(self.d_model, self.num_heads, self.dropout, device),
                cross_norm:      LayerNormConfig::new(self.d_model).init(device),
                feed_forward:    feed_forward(self.d_model, self.d_ff, self.dropout, device),
                output_norm:     LayerNormConfig::new(self.d_model).init(device),
                residual_drop:   DropoutConfig::new(self.dropout).init(),
            })
            .collect();

        TextDecoder {
            embeddings: Embeddings::new(self.vocab_size, self.max_target_len, self.d_model, self.dropout, device),
            layers,
            final_norm:       LayerNormConfig::new(self.d_model).init(device),
            vocab_projection: LinearConfig::new(self.d_model, self.vocab_size).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct DecoderLayer<B: Backend> {
    pub self_attention:  MultiHeadAttention<B>,
    pub self_norm:       LayerNorm<B>,
    pub cross_attention: MultiHeadAttention<B>,
    pub cross_norm:      LayerNorm<B>,
    pub feed_forward:    PositionWiseFeedForward<B>,
    pub output_norm:     LayerNorm<B>,
    pub residual_drop:   Dropout,
}

impl<B: Backend> DecoderLayer<B> {
    pub fn forward(
        &self,
        y:           Tensor<B, 3>,
        memory:      Tensor<B, 3>,
        memory_pad:  Tensor<B, 2, Bool>,
        causal_mask: Tensor<B, 3, Bool>,
    ) -> Tensor<B, 3> {
        let attended = self
            .self_attention
            .forward(MhaInput::self_attn(y.clone()).mask_attn(causal_mask))
            .context;
        let y = add_and_norm(&self.self_norm, &self.residual_drop, y, attended);

        let read = self
            .cross_attention
            .forward(MhaInput::new(y.clone(), memory.clone(), memory).mask_pad(memory_pad))
            .context;
        let y = add_and_norm(&self.cross_norm, &self.residual_drop, y, read);

        let transformed = self.feed_forward.forward(y.clone());
        add_and_norm(&self.output_norm, &self.residual_drop, y, transformed)
    }
}

#[derive(Module, Debug)]
pub struct TextDecoder<B: Backend> {
    pub embeddings:       Embeddings<B>,
    pub layers:           Vec<DecoderLayer<B>>,
    pub final_norm:       LayerNorm<B>,
    pub vocab_projection: Linear<B>,
}

impl<B: Backend> TextDecoder<B> {
    /// decoder_input: [batch, tgt_len], memory: [batch, src_len, d_model]
    /// → logits [batch, tgt_len, vocab_size]
    pub fn forward(
        &self,
        decoder_input: Tensor<B, 2, Int>,
        memory:        Tensor<B, 3>,
        memory_pad:    Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let [batch_size, tgt_len] = decoder_input.dims();
        let causal_mask = generate_autoregressive_mask::<B>(batch_size, tgt_len, &decoder_input.device());

        let mut y = self.embeddings.forward(decoder_input);
        for layer in &self.layers {
            y = layer.forward(y, memory.clone(), memory_pad.clone(), causal_mask.clone());
        }
        self.vocab_projection.forward(self.final_norm.forward(y))
    }
}
