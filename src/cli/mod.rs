// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
//
// Three commands are supported:
//   1. `train`    — trains a model with one of the pipelines
//   2. `evaluate` — scores a checkpoint, writes result files
//   3. `predict`  — runs one example through a checkpoint
//
// A model handed to the wrong pipeline is reported here and
// the process exits with a failure code.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PredictArgs, TrainArgs};

use crate::domain::errors::ModelNotCompatibleError;

#[derive(Parser, Debug)]
#[command(
    name = "logitorch",
    version = "0.1.0",
    about = "Train and evaluate neural models on textual logical-reasoning tasks."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        let result = match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
        };

        if let Err(err) = &result {
            if let Some(incompatible) = err.downcast_ref::<ModelNotCompatibleError>() {
                eprintln!("{incompatible}");
            }
        }
        result
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let model = args.model_config()?;
    let pipeline = args.pipeline();
    let use_case = TrainUseCase::new(args.into(), model, pipeline);
    let summary = use_case.execute()?;

    match summary.best.val_loss {
        Some(loss) => println!("Training complete. Best epoch {} (val_loss {:.4}).", summary.best.epoch, loss),
        None => println!("Training complete. Kept epoch {} (no validation loss).", summary.best.epoch),
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let paths = EvaluateUseCase::new(args.into()).execute()?;
    for path in &paths {
        println!("{}", path.display());
    }
    println!("Wrote {} result files.", paths.len());
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let prediction = PredictUseCase::new(args.into()).execute()?;
    println!("\nPrediction: {prediction}");
    Ok(())
}
