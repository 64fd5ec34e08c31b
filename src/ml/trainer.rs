// ============================================================
// Layer 5 — Fit Loop
// ============================================================
// Generic fit loop over any StepModel: one Adam pass over the
// training loader, then a no-dropout pass over the validation
// loader on the inner backend.
//
// After every epoch the validation loss is compared with the best
// so far and only an improvement overwrites the kept weights, so
// exactly one checkpoint exists when fit returns.

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::DataLoader,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::sync::Arc;

use crate::infra::{
    checkpoint::{BestCheckpoint, CheckpointManager},
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::step::StepModel;

/// Batch type the validation loader must produce for model `M`.
pub type ValidBatch<B, M> =
    <<M as AutodiffModule<B>>::InnerModule as StepModel<<B as AutodiffBackend>::InnerBackend>>::Batch;

#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    pub epochs:        usize,
    pub learning_rate: f64,
}

/// What the kept checkpoint contains after `fit`.
#[derive(Debug, Clone)]
pub struct FitSummary {
    pub best:   BestCheckpoint,
    pub epochs: Vec<EpochMetrics>,
}

pub fn fit<B, M>(
    mut model:    M,
    train_loader: Arc<dyn DataLoader<<M as StepModel<B>>::Batch>>,
    val_loader:   Arc<dyn DataLoader<ValidBatch<B, M>>>,
    options:      FitOptions,
    ckpt:         &CheckpointManager,
    metrics:      &MetricsLogger,
) -> Result<FitSummary>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + StepModel<B>,
    M::InnerModule: StepModel<B::InnerBackend>,
{
    ensure!(options.epochs > 0, "epochs must be at least 1");

    let mut optim = AdamConfig::new().with_epsilon(1e-8).init::<B, M>();
    let mut best: Option<BestCheckpoint> = None;
    let mut history = Vec::with_capacity(options.epochs);

    for epoch in 1..=options.epochs {
        let mut train_loss = Running::default();
        for batch in train_loader.iter() {
            let out = model.step(batch);
            train_loss.add(out.loss.clone().into_scalar().elem::<f64>());
            let grads = GradientsParams::from_grads(out.loss.backward(), &model);
            model = optim.step(options.learning_rate, model, grads);
        }

        let frozen = model.valid();
        let (val_loss, val_acc) = validate::<B::InnerBackend, _>(&frozen, val_loader.as_ref());
        let row = EpochMetrics::new(epoch, train_loss.mean(), val_loss, val_acc);

        tracing::info!(
            epoch,
            of = options.epochs,
            "train_loss={:.4} val_loss={:.4} val_acc={:.1}%",
            row.train_loss,
            row.val_loss,
            row.val_acc * 100.0,
        );
        metrics.log(&row)?;

        // A kept checkpoint without a val_loss compares as NaN and is always replaced
        let best_loss = best.as_ref().map(|b| b.val_loss.unwrap_or(f64::NAN));
        if row.is_improvement(best_loss) {
            let kept = BestCheckpoint {
                epoch,
                val_loss: (!row.val_loss.is_nan()).then_some(row.val_loss),
            };
            ckpt.save_best::<B::InnerBackend, _>(&frozen, &kept)?;
            tracing::info!(epoch, "checkpoint replaced");
            best = Some(kept);
        }
        history.push(row);
    }

    let best = best.ok_or_else(|| anyhow::anyhow!("no epoch produced a checkpoint"))?;
    tracing::info!(best_epoch = best.epoch, "fit finished");
    Ok(FitSummary { best, epochs: history })
}

/// Mean loss and accuracy over one pass of `loader`; NaN when empty.
fn validate<B, M>(model: &M, loader: &dyn DataLoader<M::Batch>) -> (f64, f64)
where
    B: Backend,
    M: StepModel<B>,
{
    let mut loss = Running::default();
    let (mut correct, mut total) = (0usize, 0usize);
    for batch in loader.iter() {
        let out = model.step(batch);
        loss.add(out.loss.into_scalar().elem::<f64>());
        correct += out.correct;
        total += out.total;
    }
    let acc = if total > 0 { correct as f64 / total as f64 } else { f64::NAN };
    (loss.mean(), acc)
}

#[derive(Default)]
struct Running {
    sum:   f64,
    count: usize,
}

impl Running {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count > 0 { self.sum / self.count as f64 } else { f64::NAN }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{Autodiff, NdArray},
        data::dataloader::DataLoaderBuilder,
    };

    use crate::data::{
        batcher::ClassificationBatcher,
        dataset::{ClassificationSample, SampleDataset},
    };
    use crate::ml::{encoder::TextEncoderConfig, ruletaker::RuleTaker};

    type TrainBackend = Autodiff<NdArray>;

    fn samples() -> Vec<ClassificationSample> {
        (0..6)
            .map(|i| ClassificationSample {
                input_ids:      vec![101, 10 + (i % 2) as u32, 102, 12, 102, 0],
                attention_mask: vec![1, 1, 1, 1, 1, 0],
                label:          i % 2,
            })
            .collect()
    }

    #[test]
    fn test_fit_keeps_one_checkpoint_and_logs_every_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let model = RuleTaker::<TrainBackend>::new(TextEncoderConfig::new(20, 6, 16, 2, 1, 32, 0.0), &device);

        let train_loader = DataLoaderBuilder::new(ClassificationBatcher::<TrainBackend>::new(device.clone()))
            .batch_size(2)
            .shuffle(42)
            .build(SampleDataset::new(samples()));
        let val_loader = DataLoaderBuilder::new(ClassificationBatcher::<NdArray>::new(device.clone()))
            .batch_size(3)
            .build(SampleDataset::new(samples()));

        let ckpt = CheckpointManager::new(dir.path(), "rt").unwrap();
        let metrics = MetricsLogger::new(dir.path(), "rt").unwrap();
        let options = FitOptions { epochs: 2, learning_rate: 1e-3 };

        let summary = fit::<TrainBackend, _>(model, train_loader, val_loader, options, &ckpt, &metrics).unwrap();
        assert_eq!(summary.epochs.len(), 2);
        assert!(summary.best.epoch >= 1 && summary.best.epoch <= 2);
        assert!(dir.path().join("rt.mpk.gz").exists());
        assert_eq!(ckpt.load_best().unwrap(), summary.best);

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }
}
