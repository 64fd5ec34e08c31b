// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Word-level vocabulary kept beside the checkpoint as
// {saved_model_path}/{name}.tokenizer.json, one per model name,
// so models sharing a directory never share a vocabulary.
//
// Training always counts its own corpus and overwrites the file;
// evaluation and prediction load it back.
//
// The vocabulary is assembled as tokenizer JSON and parsed with
// Tokenizer::from_str; the WordLevel trainer in tokenizers 0.15
// does not fit the ModelWrapper bound.
//
// Words are counted with the Whitespace pre-tokenizer's split
// (word runs and punctuation runs), so proof symbols such as
// "->", "&" and "__proved__" get ids of their own. The normalizer
// lowercases without folding accents, matching that split.

use anyhow::{anyhow, Context, Result};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokenizers::Tokenizer;

use crate::data::codec::{BOS_ID, CLS_ID, EOS_ID, MASK_ID, PAD_ID, SEP_ID, UNK_ID};
use crate::domain::proof_metrics::split_runs;

/// First id handed to a corpus word.
pub const FIRST_WORD_ID: u32 = EOS_ID + 1;

const SPECIAL_TOKENS: [(&str, u32); 7] = [
    ("[PAD]",  PAD_ID),
    ("[UNK]",  UNK_ID),
    ("[CLS]",  CLS_ID),
    ("[SEP]",  SEP_ID),
    ("[MASK]", MASK_ID),
    ("[BOS]",  BOS_ID),
    ("[EOS]",  EOS_ID),
];

pub struct TokenizerStore {
    dir:  PathBuf,
    name: String,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self { dir: dir.into(), name: name.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.tokenizer.json", self.name))
    }

    /// Count `texts` and write a fresh tokenizer, replacing any
    /// earlier one saved under this name.
    pub fn build(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        let path = self.path();
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let tokenizer = build_word_level(texts, vocab_size)?;
        tokenizer
            .save(&path, true)
            .map_err(|e| anyhow!("Cannot write '{}': {e}", path.display()))?;

        tracing::info!(
            requested = vocab_size,
            entries = tokenizer.get_vocab_size(true),
            "wrote tokenizer to '{}'",
            path.display()
        );
        Ok(tokenizer)
    }

    pub fn load(&self) -> Result<Tokenizer> {
        load_tokenizer(&self.path())
    }
}

fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    Tokenizer::from_file(path)
        .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))
}

/// Build a word-level tokenizer in memory.
pub fn build_word_level(texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
    let json = tokenizer_json(texts, vocab_size);
    Tokenizer::from_str(&json.to_string()).map_err(|e| anyhow!("Cannot build tokenizer: {e}"))
}

/// The `vocab_size - 7` most frequent pre-tokens, most frequent first.
/// Ties are broken alphabetically so the same corpus always gets the
/// same ids.
fn top_words(texts: &[String], vocab_size: usize) -> Vec<String> {
    let mut counts = HashMap::<String, usize>::new();
    texts
        .iter()
        .flat_map(|text| split_runs(text))
        .for_each(|word| *counts.entry(word).or_default() += 1);

    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|(wa, ca), (wb, cb)| cb.cmp(ca).then_with(|| wa.cmp(wb)));
    ranked
        .into_iter()
        .take(vocab_size.saturating_sub(SPECIAL_TOKENS.len()))
        .map(|(word, _)| word)
        .collect()
}

fn tokenizer_json(texts: &[String], vocab_size: usize) -> serde_json::Value {
    // Special tokens keep fixed ids matching the BERT convention
    let mut vocab = serde_json::Map::new();
    for (content, id) in SPECIAL_TOKENS {
        vocab.insert(content.to_string(), serde_json::json!(id));
    }

    let words = top_words(texts, vocab_size)
        .into_iter()
        .filter(|w| SPECIAL_TOKENS.iter().all(|(special, _)| special != w));
    for (word, id) in words.zip(FIRST_WORD_ID..) {
        vocab.insert(word, serde_json::json!(id));
    }

    let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
        .iter()
        .map(|(content, id)| {
            serde_json::json!({
                "id": id, "content": content,
                "single_word": false, "lstrip": false, "rstrip": false,
                "normalized": false, "special": true
            })
        })
        .collect();

    serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": added_tokens,
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": false,
            "lowercase": true
        },
        "pre_tokenizer": {
            "type": "Whitespace"
        },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": "[UNK]"
        }
    })
}
