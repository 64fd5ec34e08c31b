// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Used when a corpus ships without a val split: the training
// items are shuffled with a fixed seed and the tail becomes the
// validation set. The same seed always yields the same split,
// so a run can be repeated.
//
// Split ratio: 90% training, 10% validation (VAL_FRACTION)
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

pub const VAL_FRACTION: f64 = 0.1;
pub const SPLIT_SEED:   u64 = 42;

/// Shuffle `items` with `seed` and split into (train, validation).
///
/// At least one item goes to validation whenever there are two or
/// more items, so tiny corpora still produce a val_loss.
pub fn carve_validation<T>(mut items: Vec<T>, val_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let total   = items.len();
    let mut val = ((total as f64) * val_fraction).round() as usize;
    if total >= 2 {
        val = val.clamp(1, total - 1);
    } else {
        val = 0;
    }

    let val_items = items.split_off(total - val);

    tracing::debug!(
        "Carved validation split: {} training, {} validation",
        items.len(),
        val_items.len(),
    );

    (items, val_items)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = carve_validation(items, VAL_FRACTION, SPLIT_SEED);
        assert_eq!(train.len(), 90);
        assert_eq!(val.len(),   10);
    }

    #[test]
    fn test_same_seed_same_split() {
        let (_, a) = carve_validation((0..50).collect::<Vec<usize>>(), 0.2, 7);
        let (_, b) = carve_validation((0..50).collect::<Vec<usize>>(), 0.2, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_items_preserved() {
        let (mut train, val) = carve_validation((0..37).collect::<Vec<usize>>(), VAL_FRACTION, SPLIT_SEED);
        train.extend(val);
        train.sort();
        assert_eq!(train, (0..37).collect::<Vec<_>>());
    }

    #[test]
    fn test_tiny_inputs() {
        let (train, val) = carve_validation(vec![1, 2], VAL_FRACTION, SPLIT_SEED);
        assert_eq!((train.len(), val.len()), (1, 1));

        let (train, val) = carve_validation(vec![1], VAL_FRACTION, SPLIT_SEED);
        assert_eq!((train.len(), val.len()), (1, 0));

        let (train, val) = carve_validation(Vec::<usize>::new(), VAL_FRACTION, SPLIT_SEED);
        assert!(train.is_empty() && val.is_empty());
    }
}
