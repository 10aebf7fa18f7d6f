// ============================================================
// Layer 5 — Training Loop
// ============================================================
// End-to-end training of encoder → channel → decoder with Adam
// and categorical cross-entropy.
//
//   - Training runs on an AutodiffBackend; the channel stage
//     draws fresh fading + noise for every batch
//   - model.valid() returns the model on the inner backend with
//     BatchNorm switched to running statistics
//   - Validation goes through the fading stage only: Gaussian
//     noise is a training-time regulariser, no gradients
//   - Weights and one metrics row are written after every epoch
//
// Any NaN/Inf loss or a batch whose width disagrees with M
// aborts the run.

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::Rng;

use crate::data::{batcher::{MessageBatch, MessageBatcher}, dataset::MessageDataset};
use crate::domain::{config::LinkConfig, error::LinkError};
use crate::infra::{checkpoint::CheckpointManager, metrics::{EpochMetrics, MetricsLogger}};
use crate::ml::channel::ChannelModel;
use crate::ml::model::{Autoencoder, AutoencoderConfig};

/// Train a fresh autoencoder and return it with its per-epoch history.
#[allow(clippy::too_many_arguments)]
pub fn run_training<B: AutodiffBackend, R: Rng>(
    cfg:           &LinkConfig,
    channel:       &ChannelModel,
    train_dataset: MessageDataset,
    val_dataset:   MessageDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
    device:        &B::Device,
    rng:           &mut R,
) -> Result<(Autoencoder<B>, Vec<EpochMetrics>)> {
    let m = cfg.num_messages;
    for (name, ds) in [("training", &train_dataset), ("validation", &val_dataset)] {
        if ds.num_messages() != m {
            return Err(LinkError::shape_mismatch(
                format!("{name} set"),
                &[m],
                &[ds.num_messages()],
            ).into());
        }
    }

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = AutoencoderConfig::new(m, cfg.num_channels);
    let mut model: Autoencoder<B> = model_cfg.init(device);
    tracing::info!(
        "Model ready: ({}, {}) autoencoder, {} parameters",
        cfg.num_channels, cfg.bits_per_message(), model.num_params()
    );

    let val_channel = channel.without_noise();
    tracing::info!(
        "Training channel: Rayleigh scale {:.6}, noise std {:.6} (validation: no noise)",
        channel.fading_scale(), channel.noise_std()
    );

    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_batcher = MessageBatcher::<B>::new(device.clone(), m);
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed.unwrap_or(42))
        .build(train_dataset);

    let val_batcher = MessageBatcher::<B::InnerBackend>::new(device.clone(), m);
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .build(val_dataset);

    let mut history       = Vec::with_capacity(cfg.epochs);
    let mut best_val_loss = f64::INFINITY;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;
        let mut train_correct  = 0usize;
        let mut train_total    = 0usize;

        for batch in train_loader.iter() {
            check_batch(&batch, m, "training batch")?;

            let output = model.forward_through(batch.indices, channel, rng)?;
            let loss   = model.loss(&output, batch.targets.clone());

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            LinkError::check_finite(format!("training loss, epoch {epoch}"), loss_val)?;
            train_loss_sum += loss_val;
            train_batches  += 1;

            train_total   += batch.targets.dims()[0];
            train_correct += count_correct(output.predicted(), batch.targets);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut val_correct  = 0usize;
        let mut val_total    = 0usize;

        for batch in val_loader.iter() {
            check_batch(&batch, m, "validation batch")?;

            let output = model_valid.forward_through(batch.indices, &val_channel, rng)?;
            let loss: f64 = model_valid
                .loss(&output, batch.targets.clone())
                .into_scalar()
                .elem::<f64>();
            LinkError::check_finite(format!("validation loss, epoch {epoch}"), loss)?;
            val_loss_sum += loss;
            val_batches  += 1;

            val_total   += batch.targets.dims()[0];
            val_correct += count_correct(output.predicted(), batch.targets);
        }

        let row = EpochMetrics::new(
            epoch,
            mean(train_loss_sum, train_batches),
            ratio(train_correct, train_total),
            mean(val_loss_sum, val_batches),
            ratio(val_correct, val_total),
        );

        println!(
            "Epoch {:>3}/{} | loss={:.4} | acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
            epoch, cfg.epochs, row.train_loss, row.train_acc * 100.0,
            row.val_loss, row.val_acc * 100.0,
        );

        if row.is_improvement(best_val_loss) {
            best_val_loss = row.val_loss;
            tracing::info!("New best validation loss {:.4} at epoch {}", best_val_loss, epoch);
        }

        metrics.log(&row)?;
        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
        history.push(row);
    }

    tracing::info!("Training complete! Metrics in '{}'", metrics.csv_path().display());
    Ok((model, history))
}

/// Fail fast when a batch is not [batch, M]
fn check_batch<B: Backend>(batch: &MessageBatch<B>, m: usize, context: &str) -> Result<(), LinkError> {
    let [rows, width] = batch.one_hot.dims();
    if width != m || batch.indices.dims() != [rows, 1] {
        return Err(LinkError::shape_mismatch(context, &[rows, m], &[rows, width]));
    }
    Ok(())
}

fn count_correct<B: Backend>(predicted: Tensor<B, 1, Int>, targets: Tensor<B, 1, Int>) -> usize {
    predicted.equal(targets).int().sum().into_scalar().elem::<i64>() as usize
}

fn mean(sum: f64, count: usize) -> f64 {
    if count > 0 { sum / count as f64 } else { f64::NAN }
}

fn ratio(correct: usize, total: usize) -> f64 {
    if total > 0 { correct as f64 / total as f64 } else { 0.0 }
}
