// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Reloads a finished training run and sweeps its BER again,
// optionally over a different SNR grid or test-set size.
//
//   Step 1: Read link_config.json, apply overrides
//   Step 2: Rebuild the model and load the latest weights
//   Step 3: Draw a fresh test set
//   Step 4: Sweep and write the BER plot / table

use anyhow::Result;
use std::path::PathBuf;

use crate::data::{dataset::MessageDataset, source::{seeded_rng, UniformMessageSource}};
use crate::domain::{ber::BerCurve, config::{LinkConfig, SnrSweep}};
use crate::infra::{checkpoint::CheckpointManager, report::BerReport};
use crate::ml::{evaluator::run_sweep, model::{Autoencoder, AutoencoderConfig}, InferBackend};

/// Values that replace the stored configuration for this evaluation
#[derive(Debug, Clone, Default)]
pub struct EvaluateOverrides {
    pub snr_start: Option<f64>,
    pub snr_end:   Option<f64>,
    pub snr_step:  Option<f64>,
    pub test_size: Option<usize>,
    pub seed:      Option<u64>,
}

impl EvaluateOverrides {
    /// Each given value replaces its stored counterpart; the rest of
    /// the run's sweep is kept.
    pub fn apply(&self, mut cfg: LinkConfig) -> LinkConfig {
        cfg.sweep = SnrSweep {
            start_db: self.snr_start.unwrap_or(cfg.sweep.start_db),
            end_db:   self.snr_end.unwrap_or(cfg.sweep.end_db),
            step_db:  self.snr_step.unwrap_or(cfg.sweep.step_db),
        };
        if let Some(test_size) = self.test_size {
            cfg.test_size = test_size;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        cfg
    }
}

pub struct EvaluateUseCase {
    run_dir:   PathBuf,
    overrides: EvaluateOverrides,
}

impl EvaluateUseCase {
    pub fn new(run_dir: impl Into<PathBuf>, overrides: EvaluateOverrides) -> Self {
        Self { run_dir: run_dir.into(), overrides }
    }

    pub fn execute(&self) -> Result<BerCurve> {
        // ── Step 1: Configuration ─────────────────────────────────────────────
        let ckpt = CheckpointManager::open(&self.run_dir)?;
        let cfg  = self.overrides.apply(ckpt.load_config()?);
        cfg.validate()?;

        // ── Step 2: Model ─────────────────────────────────────────────────────
        let device = Default::default();
        let model: Autoencoder<InferBackend> =
            AutoencoderConfig::new(cfg.num_messages, cfg.num_channels).init(&device);
        let model = ckpt.load_model(model, &device)?;
        tracing::info!("Model loaded from '{}'", self.run_dir.display());

        // ── Step 3: Test set ──────────────────────────────────────────────────
        let mut rng    = seeded_rng(cfg.seed);
        let mut source = UniformMessageSource::new(&cfg, seeded_rng(cfg.seed.map(|s| s.wrapping_add(2))));
        let test_set   = MessageDataset::generate(&mut source, cfg.test_size, cfg.num_messages)?;

        // ── Step 4: Sweep + artefacts ─────────────────────────────────────────
        let curve = run_sweep(&model, &test_set, &cfg.noise_params(), &cfg.sweep, &device, &mut rng)?;
        BerReport::new(ckpt.dir(), &cfg).save(&curve)?;

        Ok(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let stored = SnrSweep { start_db: 0.0, end_db: 10.0, step_db: 1.0 };
        let base   = LinkConfig { test_size: 100, seed: Some(1), sweep: stored, ..Default::default() };

        let cfg = EvaluateOverrides::default().apply(base.clone());
        assert_eq!(cfg.sweep, stored);
        assert_eq!(cfg.test_size, 100);
        assert_eq!(cfg.seed, Some(1));

        let cfg = EvaluateOverrides { test_size: Some(7), seed: Some(9), ..Default::default() }.apply(base);
        assert_eq!(cfg.test_size, 7);
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.sweep, stored);
    }

    #[test]
    fn test_single_sweep_override_keeps_stored_bounds() {
        let stored = SnrSweep { start_db: -4.0, end_db: 8.0, step_db: 1.0 };
        let base   = LinkConfig { sweep: stored, ..Default::default() };

        let cfg = EvaluateOverrides { snr_step: Some(0.25), ..Default::default() }.apply(base);
        assert_eq!(cfg.sweep, SnrSweep { start_db: -4.0, end_db: 8.0, step_db: 0.25 });
    }

    #[test]
    fn test_missing_run_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let uc  = EvaluateUseCase::new(dir.path().join("missing"), EvaluateOverrides::default());
        assert!(uc.execute().is_err());
    }
}
