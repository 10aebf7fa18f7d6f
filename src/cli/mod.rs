// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All experiment logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — train an autoencoder and sweep its BER
//   2. `evaluate` — reload a finished run and sweep again

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "autoencoder-link",
    version = "0.1.0",
    about = "Train an autoencoder over a Rayleigh fading + AWGN channel and measure BER vs SNR."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case; nothing is computed here.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => Self::run_train(args),
            Commands::Evaluate(args) => Self::run_evaluate(args),
        }
    }

    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        let config = args.into();
        let outcome = TrainUseCase::new(config).execute()?;

        println!(
            "Training complete. {} BER points written to '{}'.",
            outcome.curve.len(),
            outcome.run_dir.display()
        );
        Ok(())
    }

    fn run_evaluate(args: EvaluateArgs) -> Result<()> {
        use crate::application::evaluate_use_case::EvaluateUseCase;

        tracing::info!("Evaluating run: {}", args.run_dir);

        let run_dir   = args.run_dir.clone();
        let overrides = args.into();
        let curve     = EvaluateUseCase::new(&run_dir, overrides).execute()?;

        println!("Evaluation complete. {} BER points written to '{}'.", curve.len(), run_dir);
        Ok(())
    }
}
