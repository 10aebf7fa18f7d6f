// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the `train` and `evaluate` subcommands and their
// flags. Defaults mirror LinkConfig::default().

use clap::{Args, Subcommand};

use crate::application::evaluate_use_case::EvaluateOverrides;
use crate::domain::config::{LinkConfig, SnrSweep};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train an autoencoder, then sweep BER over SNR
    Train(TrainArgs),

    /// Sweep BER again for a finished training run
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Number of distinct messages M (a power of two, k = log2 M bits)
    #[arg(long, default_value_t = 16)]
    pub num_messages: usize,

    /// Number of real channel uses n per message
    #[arg(long, default_value_t = 2)]
    pub num_channels: usize,

    /// Design Eb/No in dB; sets the training channel
    #[arg(long, default_value_t = 7.0, allow_hyphen_values = true)]
    pub eb_no_db: f64,

    #[arg(long, default_value_t = 50_000)]
    pub train_size: usize,

    #[arg(long, default_value_t = 5_000)]
    pub val_size: usize,

    #[arg(long, default_value_t = 50_000)]
    pub test_size: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    #[command(flatten)]
    pub sweep: SweepArgs,

    /// Seed for data, channel draws and weight init; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Parent directory for timestamped run directories
    #[arg(long, default_value = "runs")]
    pub output_dir: String,
}

/// SNR grid of the BER sweep, in dB
#[derive(Args, Debug, Clone, Copy)]
pub struct SweepArgs {
    #[arg(long, default_value_t = -15.0, allow_hyphen_values = true)]
    pub snr_start: f64,

    #[arg(long, default_value_t = 15.0, allow_hyphen_values = true)]
    pub snr_end: f64,

    #[arg(long, default_value_t = 0.5)]
    pub snr_step: f64,
}

impl From<SweepArgs> for SnrSweep {
    fn from(a: SweepArgs) -> Self {
        SnrSweep {
            start_db: a.snr_start,
            end_db:   a.snr_end,
            step_db:  a.snr_step,
        }
    }
}

/// The application layer never sees clap types.
impl From<TrainArgs> for LinkConfig {
    fn from(a: TrainArgs) -> Self {
        LinkConfig {
            num_messages:  a.num_messages,
            num_channels:  a.num_channels,
            eb_no_db:      a.eb_no_db,
            train_size:    a.train_size,
            val_size:      a.val_size,
            test_size:     a.test_size,
            batch_size:    a.batch_size,
            epochs:        a.epochs,
            learning_rate: a.lr,
            sweep:         a.sweep.into(),
            seed:          a.seed,
            output_dir:    a.output_dir,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Run directory written by `train`
    #[arg(long)]
    pub run_dir: String,

    /// Replace the stored test-set size
    #[arg(long)]
    pub test_size: Option<usize>,

    #[arg(long, allow_hyphen_values = true)]
    pub snr_start: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub snr_end: Option<f64>,

    #[arg(long)]
    pub snr_step: Option<f64>,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl From<EvaluateArgs> for EvaluateOverrides {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateOverrides {
            snr_start: a.snr_start,
            snr_end:   a.snr_end,
            snr_step:  a.snr_step,
            test_size: a.test_size,
            seed:      a.seed,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::Cli;

    #[test]
    fn test_train_defaults_match_link_config() {
        let cli = Cli::try_parse_from(["autoencoder-link", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: LinkConfig = args.into();
        let def = LinkConfig::default();

        assert_eq!(cfg.num_messages, def.num_messages);
        assert_eq!(cfg.num_channels, def.num_channels);
        assert_eq!(cfg.eb_no_db, def.eb_no_db);
        assert_eq!(cfg.train_size, def.train_size);
        assert_eq!(cfg.learning_rate, def.learning_rate);
        assert_eq!(cfg.sweep, def.sweep);
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn test_train_accepts_negative_snr_and_seed() {
        let cli = Cli::try_parse_from([
            "autoencoder-link", "train",
            "--num-messages", "4", "--eb-no-db", "-3", "--snr-start", "-5", "--seed", "9",
        ]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: LinkConfig = args.into();

        assert_eq!(cfg.num_messages, 4);
        assert_eq!(cfg.eb_no_db, -3.0);
        assert_eq!(cfg.sweep.start_db, -5.0);
        assert_eq!(cfg.seed, Some(9));
    }

    #[test]
    fn test_evaluate_overrides() {
        let cli = Cli::try_parse_from(["autoencoder-link", "evaluate", "--run-dir", "runs/x"]).unwrap();
        let Commands::Evaluate(args) = cli.command else { panic!("expected evaluate") };
        let o: EvaluateOverrides = args.into();
        assert!(o.snr_start.is_none() && o.snr_end.is_none() && o.snr_step.is_none());

        let cli = Cli::try_parse_from([
            "autoencoder-link", "evaluate", "--run-dir", "runs/x", "--snr-step", "1",
        ]).unwrap();
        let Commands::Evaluate(args) = cli.command else { panic!("expected evaluate") };
        let o: EvaluateOverrides = args.into();
        assert_eq!(o.snr_step, Some(1.0));
        assert_eq!(o.snr_start, None);
        assert_eq!(o.snr_end, None);
    }
}
