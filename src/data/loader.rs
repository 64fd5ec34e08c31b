// ============================================================
// Layer 4 — JSON Lines Loader
// ============================================================
// Every corpus in this toolkit ships as JSON Lines: one JSON
// object per line. The loader deserialises each line into a
// task-specific raw record and attaches the file and line number
// to any failure, so a bad corpus is easy to fix by hand.
//
// Blank lines are skipped; anything else must parse.
//
// Reference: Rust Book §9 (Error Handling)
//            serde_json documentation

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::kinds::Split;

/// A parsed line together with where it came from.
#[derive(Debug, Clone)]
pub struct Record<T> {
    pub line:  usize,
    pub value: T,
}

/// Read and deserialise every non-blank line of a JSON Lines file.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<Record<T>>> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open corpus file '{}'", path.display()))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line
            .with_context(|| format!("Cannot read line {} of '{}'", line_no, path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str::<T>(&line).with_context(|| {
            format!("Malformed record on line {} of '{}'", line_no, path.display())
        })?;
        records.push(Record { line: line_no, value });
    }

    tracing::debug!("Read {} records from '{}'", records.len(), path.display());
    Ok(records)
}

/// `{root}/{corpus}/{name}/{split}.jsonl`, or `{root}/{corpus}/{split}.jsonl`
/// when the corpus has no named variants.
pub fn split_path(root: &Path, corpus: &str, name: Option<&str>, split: Split) -> PathBuf {
    let mut path = root.join(corpus);
    if let Some(name) = name {
        path = path.join(name);
    }
    path.join(split.file_name())
}
