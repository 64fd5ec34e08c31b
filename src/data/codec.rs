// ============================================================
// Layer 4 — Text Codec (collators)
// ============================================================
// Turns task items into fixed-length token id samples and turns
// generated ids back into text. This plays the role collators
// play in other frameworks, except that padding is done here,
// once, so the batchers only have to stack rows.
//
// Layouts:
//
//   pair      [CLS] a [SEP] b [SEP] [PAD]...            (max_seq_len)
//   prover    [CLS] question [SEP] s1 s2 ... sN [SEP]   (max_seq_len)
//             └ node i starts at node_positions[i]
//   source    text [SEP] [PAD]...                       (max_seq_len)
//   target    [BOS] text [EOS] [PAD]...                 (max_target_len)
//
// When a pair is too long the first segment (context/premise) is
// cut first; the second is only cut if it alone needs more than
// half the budget.
//
// Reference: Devlin et al. (2019) BERT input format
//            Saha et al. (2020) PRover node encoding

use anyhow::{anyhow, ensure, Result};
use tokenizers::Tokenizer;

use crate::data::dataset::{ClassificationSample, ProverSample, Seq2SeqSample};
use crate::domain::examples::ProofWriterItem;

// ─── Special Token Ids ────────────────────────────────────────────────────────
// Fixed ids shared with the tokenizer store (BERT convention + BOS/EOS).
pub const PAD_ID:  u32 = 0;
pub const UNK_ID:  u32 = 1;
pub const CLS_ID:  u32 = 101;
pub const SEP_ID:  u32 = 102;
pub const MASK_ID: u32 = 103;
pub const BOS_ID:  u32 = 104;
pub const EOS_ID:  u32 = 105;

/// Source text for the generative ProofWriter model.
pub fn proofwriter_source(context: &str, question: &str) -> String {
    format!("$question$ = {question} ; $context$ = {context}")
}

/// Encoded PRover input before labels are attached.
#[derive(Debug, Clone)]
pub struct ProverInput {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub node_positions: Vec<usize>,
    /// Sentence id of every node that fit, in order
    pub node_ids:       Vec<String>,
}

pub struct TextCodec {
    tokenizer:      Tokenizer,
    max_seq_len:    usize,
    max_target_len: usize,
}

impl TextCodec {
    pub fn new(tokenizer: Tokenizer, max_seq_len: usize, max_target_len: usize) -> Result<Self> {
        ensure!(max_seq_len >= 8, "max_seq_len must be at least 8 (got {max_seq_len})");
        ensure!(max_target_len >= 3, "max_target_len must be at least 3 (got {max_target_len})");
        Ok(Self { tokenizer, max_seq_len, max_target_len })
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    pub fn max_target_len(&self) -> usize {
        self.max_target_len
    }

    /// Embedding rows needed to cover every id (ids are not contiguous).
    pub fn vocab_size(&self) -> usize {
        self.tokenizer
            .get_vocab(true)
            .values()
            .max()
            .map_or(0, |&max| max as usize + 1)
    }

    /// Token ids of `text` with no special tokens added.
    pub fn tokenize(&self, text: &str) -> Result<Vec<u32>> {
        let enc = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
        Ok(enc.get_ids().to_vec())
    }

    /// Decode generated ids, dropping special tokens.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let text = self
            .tokenizer
            .decode(ids, true)
            .map_err(|e| anyhow!("Decode error: {e}"))?;
        Ok(text.trim().to_string())
    }

    pub fn encode_pair(&self, a: &str, b: &str) -> Result<(Vec<u32>, Vec<u32>)> {
        let a_ids = self.tokenize(a)?;
        let b_ids = self.tokenize(b)?;
        Ok(layout_pair(&a_ids, &b_ids, self.max_seq_len))
    }

    pub fn encode_classification(&self, a: &str, b: &str, label: usize) -> Result<ClassificationSample> {
        let (input_ids, attention_mask) = self.encode_pair(a, b)?;
        Ok(ClassificationSample { input_ids, attention_mask, label })
    }

    pub fn encode_prover_input(
        &self,
        facts:    &[(String, String)],
        rules:    &[(String, String)],
        question: &str,
    ) -> Result<ProverInput> {
        let question_ids = self.tokenize(question)?;
        let mut sentences = Vec::with_capacity(facts.len() + rules.len());
        for (id, text) in facts.iter().chain(rules.iter()) {
            sentences.push((id.clone(), self.tokenize(text)?));
        }
        Ok(layout_prover(&question_ids, &sentences, self.max_seq_len))
    }

    pub fn encode_prover(&self, item: &ProofWriterItem) -> Result<ProverSample> {
        let input = self.encode_prover_input(&item.facts, &item.rules, &item.question)?;
        let node_labels = input
            .node_ids
            .iter()
            .map(|id| u8::from(item.proof_ids.contains(id)))
            .collect();

        Ok(ProverSample {
            input_ids:      input.input_ids,
            attention_mask: input.attention_mask,
            label:          item.answer.label_id(),
            node_positions: input.node_positions,
            node_labels,
        })
    }

    /// Encoder input for the generative models.
    pub fn encode_source(&self, source: &str) -> Result<(Vec<u32>, Vec<u32>)> {
        let ids = self.tokenize(source)?;
        Ok(layout_source(&ids, self.max_seq_len))
    }

    pub fn encode_seq2seq(&self, source: &str, target: &str) -> Result<Seq2SeqSample> {
        let (source_ids, source_mask) = self.encode_source(source)?;
        let target_ids = layout_target(&self.tokenize(target)?, self.max_target_len);
        Ok(Seq2SeqSample { source_ids, source_mask, target_ids })
    }
}

// ─── Layout Helpers ───────────────────────────────────────────────────────────
// Pure functions over id slices so the layouts can be tested
// without a trained tokenizer.

/// Pad `ids` to `len` and build the matching attention mask.
fn pad(mut ids: Vec<u32>, len: usize) -> (Vec<u32>, Vec<u32>) {
    ids.truncate(len);
    let real = ids.len();
    let mut mask = vec![1u32; real];
    ids.resize(len, PAD_ID);
    mask.resize(len, 0);
    (ids, mask)
}

/// [CLS] a [SEP] b [SEP], truncating `a` before `b`.
pub fn layout_pair(a: &[u32], b: &[u32], max_len: usize) -> (Vec<u32>, Vec<u32>) {
    let budget = max_len.saturating_sub(3);
    let b_keep = b.len().min((budget / 2).max(budget.saturating_sub(a.len())));
    let a_keep = a.len().min(budget - b_keep);

    let mut ids = Vec::with_capacity(max_len);
    ids.push(CLS_ID);
    ids.extend_from_slice(&a[..a_keep]);
    ids.push(SEP_ID);
    ids.extend_from_slice(&b[..b_keep]);
    ids.push(SEP_ID);
    pad(ids, max_len)
}

/// [CLS] question [SEP] s1 ... sN [SEP]; sentences that do not fit
/// whole are dropped along with everything after them.
pub fn layout_prover(question: &[u32], sentences: &[(String, Vec<u32>)], max_len: usize) -> ProverInput {
    let budget = max_len.saturating_sub(3);
    let q_keep = question.len().min(budget / 2);

    let mut ids = Vec::with_capacity(max_len);
    ids.push(CLS_ID);
    ids.extend_from_slice(&question[..q_keep]);
    ids.push(SEP_ID);

    let mut node_positions = Vec::new();
    let mut node_ids = Vec::new();
    for (id, sent) in sentences {
        if sent.is_empty() {
            continue;
        }
        // Leave room for the closing [SEP]
        if ids.len() + sent.len() + 1 > max_len {
            break;
        }
        node_positions.push(ids.len());
        node_ids.push(id.clone());
        ids.extend_from_slice(sent);
    }
    ids.push(SEP_ID);

    let (input_ids, attention_mask) = pad(ids, max_len);
    ProverInput { input_ids, attention_mask, node_positions, node_ids }
}

/// text [SEP], padded.
pub fn layout_source(ids: &[u32], max_len: usize) -> (Vec<u32>, Vec<u32>) {
    let keep = ids.len().min(max_len - 1);
    let mut out = Vec::with_capacity(max_len);
    out.extend_from_slice(&ids[..keep]);
    out.push(SEP_ID);
    pad(out, max_len)
}

/// [BOS] text [EOS], padded.
pub fn layout_target(ids: &[u32], max_len: usize) -> Vec<u32> {
    let keep = ids.len().min(max_len - 2);
    let mut out = Vec::with_capacity(max_len);
    out.push(BOS_ID);
    out.extend_from_slice(&ids[..keep]);
    out.push(EOS_ID);
    pad(out, max_len).0
}

/// A small codec over a word-level vocabulary built from `texts`.
#[cfg(test)]
pub(crate) fn test_codec(texts: &[&str]) -> TextCodec {
    let corpus: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
    let tokenizer = crate::infra::tokenizer_store::build_word_level(&corpus, 200).unwrap();
    TextCodec::new(tokenizer, 32, 16).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_layout_and_padding() {
        let (ids, mask) = layout_pair(&[10, 11], &[20], 8);
        assert_eq!(ids, vec![CLS_ID, 10, 11, SEP_ID, 20, SEP_ID, PAD_ID, PAD_ID]);
        assert_eq!(mask, vec![1, 1, 1, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_pair_truncates_first_segment_first() {
        let context: Vec<u32> = (200..220).collect();
        let question = vec![30, 31, 32];
        let (ids, mask) = layout_pair(&context, &question, 10);
        assert_eq!(ids.len(), 10);
        assert!(mask.iter().all(|&m| m == 1));
        // the whole question survives at the end
        assert_eq!(ids[0], CLS_ID);
        assert_eq!(ids[5], SEP_ID);
        assert_eq!(&ids[6..], &[30, 31, 32, SEP_ID]);
    }

    #[test]
    fn test_pair_question_capped_at_half_budget() {
        let context: Vec<u32> = (200..220).collect();
        let question: Vec<u32> = (300..320).collect();
        let (ids, _) = layout_pair(&context, &question, 11);
        // budget 8 → 4 context + 4 question
        assert_eq!(ids, vec![CLS_ID, 200, 201, 202, 203, SEP_ID, 300, 301, 302, 303, SEP_ID]);
    }

    #[test]
    fn test_prover_layout_positions() {
        let sentences = vec![
            ("triple1".to_string(), vec![10, 11]),
            ("rule1".to_string(), vec![20, 21, 22]),
            ("rule2".to_string(), vec![30, 31, 32, 33]),
        ];
        let input = layout_prover(&[5], &sentences, 12);
        // [CLS] 5 [SEP] 10 11 20 21 22 [SEP] pad...
        assert_eq!(input.node_positions, vec![3, 5]);
        assert_eq!(input.node_ids, vec!["triple1", "rule1"]);
        assert_eq!(input.input_ids[3], 10);
        assert_eq!(input.input_ids[8], SEP_ID);
        assert_eq!(input.attention_mask.iter().sum::<u32>(), 9);
    }

    #[test]
    fn test_source_and_target_layouts() {
        let (src, mask) = layout_source(&[7, 8, 9], 5);
        assert_eq!(src, vec![7, 8, 9, SEP_ID, PAD_ID]);
        assert_eq!(mask, vec![1, 1, 1, 1, 0]);

        let tgt = layout_target(&[7, 8, 9, 10], 5);
        assert_eq!(tgt, vec![BOS_ID, 7, 8, 9, EOS_ID]);
    }

    #[test]
    fn test_proofwriter_source_format() {
        assert_eq!(
            proofwriter_source("triple1: Bob is big.", "Bob is big."),
            "$question$ = Bob is big. ; $context$ = triple1: Bob is big."
        );
    }

    #[test]
    fn test_codec_encodes_prover_item() {
        use crate::domain::examples::Answer;

        let codec = test_codec(&["Bob is big.", "Bob is red.", "If someone is big then they are red."]);
        let item = ProofWriterItem {
            facts:     vec![("triple1".into(), "Bob is big.".into())],
            rules:     vec![("rule1".into(), "If someone is big then they are red.".into())],
            question:  "Bob is red.".into(),
            answer:    Answer::True,
            proofs:    "[(((triple1) -> rule1))]".into(),
            proof_ids: vec!["triple1".into(), "rule1".into()],
            depth:     1,
        };
        let sample = codec.encode_prover(&item).unwrap();
        assert_eq!(sample.input_ids.len(), 32);
        assert_eq!(sample.node_labels, vec![1, 1]);
        assert_eq!(sample.label, Answer::True.label_id());
        // "bob is red ." then [SEP] → first node right after it
        assert_eq!(sample.node_positions[0], 6);
    }

    #[test]
    fn test_decode_skips_specials() {
        let codec = test_codec(&["Bob is red"]);
        let mut ids = vec![BOS_ID];
        ids.extend(codec.tokenize("Bob is red").unwrap());
        ids.extend([EOS_ID, PAD_ID]);
        assert_eq!(codec.decode(&ids).unwrap(), "bob is red");
        assert!(codec.vocab_size() > EOS_ID as usize);
    }
}
