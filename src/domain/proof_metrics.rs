// ============================================================
// Layer 3 — FLD Proof Metrics
// ============================================================
// Scores a generated FLD proof against its gold serialisation.
//
//   proof_accuracy  — normalised exact match of the whole proof
//   answer_accuracy — the final __PROVED__ / __DISPROVED__ /
//                     __UNKNOWN__ marker matches
//
// Normalisation lowercases and splits into word runs and
// punctuation runs, which is how the word-level tokenizer sees
// text, so a decoded prediction compares equal to its source.

use std::collections::BTreeMap;

const MARKERS: [&str; 3] = ["__proved__", "__disproved__", "__unknown__"];

/// Lowercased word runs (alphanumeric or `_`) and punctuation runs,
/// in order. This matches the tokenizer's pre-tokenisation.
pub fn split_runs(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_is_word = false;

    for c in text.to_lowercase().chars() {
        if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        let is_word = c.is_alphanumeric() || c == '_';
        if !current.is_empty() && is_word != current_is_word {
            tokens.push(std::mem::take(&mut current));
        }
        current_is_word = is_word;
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Lowercase and re-join word / punctuation runs with single spaces.
pub fn normalize_proof(text: &str) -> String {
    split_runs(text).join(" ")
}

/// The last answer marker in a proof, if any.
pub fn answer_marker(text: &str) -> Option<&'static str> {
    let normalized = normalize_proof(text);
    normalized
        .split(' ')
        .rev()
        .find_map(|tok| MARKERS.iter().find(|m| **m == tok).copied())
}

/// Per-example metrics for one prediction.
pub fn compute_proof_metrics(prediction: &str, reference: &str) -> BTreeMap<String, f64> {
    let proof_match = normalize_proof(prediction) == normalize_proof(reference);
    let gold_marker = answer_marker(reference);
    let answer_match = gold_marker.is_some() && answer_marker(prediction) == gold_marker;

    let mut m = BTreeMap::new();
    m.insert("proof_accuracy".to_string(),  if proof_match  { 1.0 } else { 0.0 });
    m.insert("answer_accuracy".to_string(), if answer_match { 1.0 } else { 0.0 });
    m
}

/// Collects metric values under `D-all.{metric}` and `D-{depth}.{metric}`.
#[derive(Debug, Default, Clone)]
pub struct ProofMetricAccumulator {
    values: BTreeMap<String, Vec<f64>>,
}

impl ProofMetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, depth: Option<usize>, metrics: &BTreeMap<String, f64>) {
        let depth_key = depth.map(|d| d.to_string()).unwrap_or_else(|| "None".to_string());
        for bucket in ["all".to_string(), depth_key] {
            for (name, value) in metrics {
                self.values
                    .entry(format!("D-{bucket}.{name}"))
                    .or_default()
                    .push(*value);
            }
        }
    }

    /// Mean of every collected series, keyed and sorted by name.
    pub fn means(&self) -> BTreeMap<String, f64> {
        self.values
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.iter().sum::<f64>() / v.len() as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_splits_punctuation() {
        assert_eq!(
            normalize_proof("fact1 & fact2 -> int1: {A}{a}; __PROVED__"),
            "fact1 & fact2 -> int1 : { a }{ a }; __proved__"
        );
    }

    #[test]
    fn test_exact_match_ignores_spacing_and_case() {
        let m = compute_proof_metrics("fact1 -> hypothesis ; __proved__", "fact1->hypothesis; __PROVED__");
        assert_eq!(m["proof_accuracy"], 1.0);
        assert_eq!(m["answer_accuracy"], 1.0);
    }

    #[test]
    fn test_answer_match_without_proof_match() {
        let m = compute_proof_metrics("fact2 -> hypothesis; __DISPROVED__", "fact1 -> hypothesis; __DISPROVED__");
        assert_eq!(m["proof_accuracy"], 0.0);
        assert_eq!(m["answer_accuracy"], 1.0);
    }

    #[test]
    fn test_missing_marker_never_matches() {
        let m = compute_proof_metrics("", "");
        assert_eq!(m["answer_accuracy"], 0.0);
    }

    #[test]
    fn test_accumulator_keys_and_means() {
        let mut acc = ProofMetricAccumulator::new();
        acc.add(Some(1), &compute_proof_metrics("a __PROVED__", "a __PROVED__"));
        acc.add(None, &compute_proof_metrics("b __UNKNOWN__", "a __PROVED__"));

        let means = acc.means();
        assert_eq!(means["D-all.proof_accuracy"], 0.5);
        assert_eq!(means["D-1.proof_accuracy"], 1.0);
        assert_eq!(means["D-None.answer_accuracy"], 0.0);
        assert_eq!(means.len(), 6);
    }
}
