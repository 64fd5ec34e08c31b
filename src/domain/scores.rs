// ============================================================
// Layer 3 — Score Aggregation
// ============================================================
// Accuracy over label arrays, overall and bucketed by the
// reasoning depth of each question.
//
// Depths 0..=6 are always reported so result files line up
// across datasets; deeper questions open their own bucket.

use std::collections::BTreeMap;

/// Fraction of positions where `preds[i] == trues[i]`.
/// Returns NaN when there is nothing to score.
pub fn accuracy_score(preds: &[usize], trues: &[usize]) -> f64 {
    debug_assert_eq!(preds.len(), trues.len(), "prediction/label length mismatch");
    let total = preds.len().min(trues.len());
    if total == 0 {
        return f64::NAN;
    }
    let correct = preds.iter().zip(trues).filter(|(p, t)| p == t).count();
    correct as f64 / total as f64
}

/// The depth buckets every report contains.
pub const REPORTED_DEPTHS: std::ops::RangeInclusive<usize> = 0..=6;

/// Predictions and gold labels, overall and per depth.
#[derive(Debug, Clone)]
pub struct DepthScores {
    preds:    Vec<usize>,
    trues:    Vec<usize>,
    by_depth: BTreeMap<usize, (Vec<usize>, Vec<usize>)>,
}

impl DepthScores {
    pub fn new() -> Self {
        let by_depth = REPORTED_DEPTHS.map(|d| (d, (Vec::new(), Vec::new()))).collect();
        Self { preds: Vec::new(), trues: Vec::new(), by_depth }
    }

    pub fn push(&mut self, depth: usize, pred: usize, truth: usize) {
        let bucket = self.by_depth.entry(depth).or_default();
        bucket.0.push(pred);
        bucket.1.push(truth);
        self.preds.push(pred);
        self.trues.push(truth);
    }

    pub fn len(&self) -> usize {
        self.preds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preds.is_empty()
    }

    pub fn overall(&self) -> f64 {
        accuracy_score(&self.preds, &self.trues)
    }

    /// (depth, accuracy) in ascending depth order.
    pub fn per_depth(&self) -> Vec<(usize, f64)> {
        self.by_depth
            .iter()
            .map(|(d, (p, t))| (*d, accuracy_score(p, t)))
            .collect()
    }
}

impl Default for DepthScores {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_on_fixed_arrays() {
        assert_eq!(accuracy_score(&[1, 0, 1, 1], &[1, 1, 1, 0]), 0.5);
        assert_eq!(accuracy_score(&[2, 2], &[2, 2]), 1.0);
    }

    #[test]
    fn test_accuracy_empty_is_nan() {
        assert!(accuracy_score(&[], &[]).is_nan());
    }

    #[test]
    fn test_depth_buckets_always_present() {
        let scores = DepthScores::new();
        let depths: Vec<usize> = scores.per_depth().into_iter().map(|(d, _)| d).collect();
        assert_eq!(depths, vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(scores.overall().is_nan());
    }

    #[test]
    fn test_depth_scores_bucket_and_total() {
        let mut scores = DepthScores::new();
        scores.push(0, 1, 1);
        scores.push(0, 0, 1);
        scores.push(3, 2, 2);
        scores.push(9, 1, 0);

        let per: BTreeMap<usize, f64> = scores.per_depth().into_iter().collect();
        assert_eq!(per[&0], 0.5);
        assert_eq!(per[&3], 1.0);
        assert_eq!(per[&9], 0.0);
        assert!(per[&5].is_nan());
        assert_eq!(scores.overall(), 0.5);
        assert_eq!(scores.len(), 4);
    }
}
