// ============================================================
// Layer 6 — Result Files
// ============================================================
// Evaluation scripts leave their numbers on disk:
//
//   {name}.txt          ← a single float, e.g. "0.8125"
//   fld_results.json    ← {"D-all.proof_accuracy": 0.5, ...}
//
// JSON results use sorted keys and a 4-space indent; non-ASCII
// characters are written as-is rather than escaped.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
};

/// Writes result files into one output directory.
pub struct ResultWriter {
    dir: PathBuf,
}

impl ResultWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create results directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Write `score` to `{dir}/{stem}.txt`. NaN is written as "NaN".
    pub fn write_score(&self, stem: &str, score: f64) -> Result<PathBuf> {
        let path = self.dir.join(format!("{stem}.txt"));
        fs::write(&path, format_score(score))
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::info!("{stem}: {}", format_score(score));
        Ok(path)
    }

    /// Write a flat metric map to `{dir}/{file_name}`.
    pub fn write_json(&self, file_name: &str, values: &BTreeMap<String, f64>) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        fs::write(&path, to_pretty_json(values)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::info!("Wrote {} metrics to '{}'", values.len(), path.display());
        Ok(path)
    }
}

fn format_score(score: f64) -> String {
    if score.is_nan() { "NaN".to_string() } else { score.to_string() }
}

/// serde_json has no NaN, so non-finite values become null.
fn to_pretty_json(values: &BTreeMap<String, f64>) -> Result<Vec<u8>> {
    let finite: BTreeMap<&str, Option<f64>> = values
        .iter()
        .map(|(k, v)| (k.as_str(), v.is_finite().then_some(*v)))
        .collect();

    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    finite.serialize(&mut ser)?;
    Ok(out)
}
