// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Runs the whole experiment in order:
//
//   Step 1: Validate the configuration       (Layer 3 - domain)
//   Step 2: Create the run directory         (Layer 6 - infra)
//   Step 3: Draw train / val / test sets     (Layer 4 - data)
//   Step 4: Train through the design channel (Layer 5 - ml)
//   Step 5: Sweep BER over SNR               (Layer 5 - ml)
//   Step 6: Write BER plot and table         (Layer 6 - infra)
//
// The three datasets are independent draws from the same
// source, not slices of one pool.

use anyhow::Result;
use burn::{module::AutodiffModule, tensor::backend::Backend};
use std::path::PathBuf;

use crate::data::{dataset::MessageDataset, source::{seeded_rng, UniformMessageSource}};
use crate::domain::{ber::BerCurve, config::LinkConfig};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    report::BerReport,
};
use crate::ml::{
    channel::ChannelModel,
    evaluator::run_sweep,
    trainer::run_training,
    InferBackend, TrainBackend,
};

pub struct TrainUseCase {
    config: LinkConfig,
}

/// What a finished run leaves behind
pub struct TrainOutcome {
    pub run_dir: PathBuf,
    pub curve:   BerCurve,
}

impl TrainUseCase {
    pub fn new(config: LinkConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainOutcome> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;
        let noise = cfg.noise_params();
        tracing::info!(
            "Link: M={} (k={} bits), n={} channels, R={}, Eb/No={} dB, beta_variance={:.6}",
            cfg.num_messages, cfg.bits_per_message(), cfg.num_channels,
            cfg.code_rate(), cfg.eb_no_db, noise.beta_variance
        );

        let mut rng = seeded_rng(cfg.seed);
        if let Some(seed) = cfg.seed {
            TrainBackend::seed(seed);
        }

        // ── Step 2: Run directory ─────────────────────────────────────────────
        let ckpt_manager = CheckpointManager::new_run(&cfg.output_dir)?;
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(ckpt_manager.dir())?;

        // ── Step 3: Datasets ──────────────────────────────────────────────────
        let mut source = UniformMessageSource::new(cfg, seeded_rng(cfg.seed.map(|s| s.wrapping_add(1))));
        let train_set  = MessageDataset::generate(&mut source, cfg.train_size, cfg.num_messages)?;
        let val_set    = MessageDataset::generate(&mut source, cfg.val_size,   cfg.num_messages)?;
        let test_set   = MessageDataset::generate(&mut source, cfg.test_size,  cfg.num_messages)?;
        tracing::info!(
            "Datasets: {} train, {} validation, {} test",
            cfg.train_size, cfg.val_size, cfg.test_size
        );

        // ── Step 4: Train ─────────────────────────────────────────────────────
        let device  = Default::default();
        let channel = ChannelModel::for_training(&noise)?;
        let (model, history) = run_training::<TrainBackend, _>(
            cfg, &channel, train_set, val_set, &ckpt_manager, &metrics, &device, &mut rng,
        )?;
        if let Some(last) = history.last() {
            tracing::info!(
                "Final epoch {}: val_loss={:.4}, val_acc={:.1}%",
                last.epoch, last.val_loss, last.val_acc * 100.0
            );
        }

        // ── Step 5: BER sweep on the frozen model ─────────────────────────────
        let frozen = model.valid();
        let curve  = run_sweep::<InferBackend, _>(&frozen, &test_set, &noise, &cfg.sweep, &device, &mut rng)?;

        if let Some(ber) = curve.ber_near(cfg.eb_no_db) {
            tracing::info!("BER at the design SNR ({} dB): {:.6}", cfg.eb_no_db, ber);
        }

        // ── Step 6: Artefacts ─────────────────────────────────────────────────
        BerReport::new(ckpt_manager.dir(), cfg).save(&curve)?;

        Ok(TrainOutcome { run_dir: ckpt_manager.dir().to_path_buf(), curve })
    }
}
