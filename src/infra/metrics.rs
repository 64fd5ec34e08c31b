// ============================================================
// Layer 6 — Epoch Metrics Log
// ============================================================
// fit() appends one CSV row per epoch to
// {saved_model_path}/{name}.metrics.csv:
//
//   epoch,train_loss,val_loss,val_acc
//   1,1.098612,1.054300,0.412000
//   2,0.890100,0.854300,0.584000
//
// val_acc is label accuracy for the classifiers and non-pad
// token accuracy for the generators. Each training run starts
// the file over, since it trains from freshly initialised weights.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const CSV_HEADER: &str = "epoch,train_loss,val_loss,val_acc";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based
    pub epoch:      usize,
    pub train_loss: f64,
    /// NaN when the validation set is empty
    pub val_loss:   f64,
    /// NaN when nothing was scored
    pub val_acc:    f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, val_acc: f64) -> Self {
        Self { epoch, train_loss, val_loss, val_acc }
    }

    /// Should this epoch replace the kept checkpoint?
    /// Without a usable best (first epoch, or NaN losses) any epoch wins.
    pub fn is_improvement(&self, best_val_loss: Option<f64>) -> bool {
        match best_val_loss {
            Some(best) if !best.is_nan() => self.val_loss < best,
            _ => true,
        }
    }

    fn csv_row(&self) -> String {
        format!("{},{:.6},{:.6},{:.6}", self.epoch, self.train_loss, self.val_loss, self.val_acc)
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Start `{dir}/{name}.metrics.csv` with just the header.
    pub fn new(dir: &Path, name: &str) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;
        let csv_path = dir.join(format!("{name}.metrics.csv"));

        fs::write(&csv_path, format!("{CSV_HEADER}\n"))
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        Ok(Self { csv_path })
    }

    pub fn log(&self, metrics: &EpochMetrics) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;
        writeln!(file, "{}", metrics.csv_row())?;
        tracing::debug!(path = %self.csv_path.display(), "{}", metrics.csv_row());
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improvement_rules() {
        let m = EpochMetrics::new(2, 2.5, 2.3, 0.2);
        assert!(m.is_improvement(Some(3.0)));
        assert!(!m.is_improvement(Some(2.0)));
        assert!(!m.is_improvement(Some(2.3)));
        assert!(m.is_improvement(None));
        assert!(m.is_improvement(Some(f64::NAN)));
    }

    #[test]
    fn test_rows_append_after_header() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path(), "rt").unwrap();
        logger.log(&EpochMetrics::new(1, 1.0, 0.5, 0.25)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.8, 0.4, 0.5)).unwrap();

        let text = fs::read_to_string(dir.path().join("rt.metrics.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![CSV_HEADER, "1,1.000000,0.500000,0.250000", "2,0.800000,0.400000,0.500000"]);
    }

    #[test]
    fn test_each_model_gets_its_own_log_and_runs_start_over() {
        let dir = tempfile::tempdir().unwrap();
        let first = MetricsLogger::new(dir.path(), "ruletaker").unwrap();
        first.log(&EpochMetrics::new(1, 1.0, 0.5, 0.25)).unwrap();

        let other = MetricsLogger::new(dir.path(), "bertnot").unwrap();
        assert_eq!(fs::read_to_string(other.csv_path()).unwrap().lines().count(), 1);
        assert_eq!(fs::read_to_string(first.csv_path()).unwrap().lines().count(), 2);

        let rerun = MetricsLogger::new(dir.path(), "ruletaker").unwrap();
        assert_eq!(fs::read_to_string(rerun.csv_path()).unwrap(), format!("{CSV_HEADER}\n"));
    }
}
