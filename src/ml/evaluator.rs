// ============================================================
// Layer 5 — BER Evaluation Sweep
// ============================================================
// Measures end-to-end error rate of a frozen autoencoder over
// a grid of SNR values.
//
// For every SNR point, in ascending order:
//   1. predict: run the frozen model through the fading stage
//      of the channel (no Gaussian noise at inference) and take
//      the decoder's distributions                     [N, M]
//   2. fade  : multiply by (1 - f), f ~ Rayleigh, one f per column
//   3. noise : add N(0, 1 / (2 R snr)) per element
//   4. round to the nearest integer
//   5. compare element-wise with the one-hot labels and average
//
// The impairment is applied to the predicted distributions,
// after the decoder, and the rounded values are compared with
// the one-hot labels directly (no argmax decoding).
//
// The inference fading is random, so predictions are recomputed
// at every SNR point, each with its own fading draw, and every
// point's impairment is drawn independently as well.
// Nothing is returned unless every point succeeds.

use anyhow::Result;
use burn::prelude::*;
use rand::Rng;

use crate::data::{batcher::MessageBatcher, dataset::MessageDataset};
use crate::domain::{
    ber::{BerCurve, BerPoint},
    config::{NoiseParams, SnrSweep},
    error::LinkError,
};
use crate::ml::channel::ChannelModel;
use crate::ml::model::Autoencoder;

const PREDICT_BATCH: usize = 1024;

/// Run the frozen model over `dataset` through `channel`; returns
/// row-major [N, M] probabilities. Each prediction batch draws its
/// own channel realisation.
pub fn predict<B: Backend, R: Rng + ?Sized>(
    model:   &Autoencoder<B>,
    dataset: &MessageDataset,
    channel: &ChannelModel,
    device:  &B::Device,
    rng:     &mut R,
) -> Result<Vec<f32>> {
    use burn::data::dataloader::batcher::Batcher;

    let m       = dataset.num_messages();
    let batcher = MessageBatcher::<B>::new(device.clone(), m);
    let mut out = Vec::with_capacity(dataset.messages().len() * m);

    for chunk in dataset.messages().chunks(PREDICT_BATCH) {
        let batch = batcher.batch(chunk.to_vec());
        let probs = model.forward_through(batch.indices, channel, rng)?.probabilities();

        let [rows, width] = probs.dims();
        if width != m {
            return Err(LinkError::shape_mismatch("decoder output", &[rows, m], &[rows, width]).into());
        }

        let values: Vec<f32> = probs
            .into_data()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("Cannot read predictions back from the device: {e:?}"))?;
        out.extend(values);
    }

    if let Some(bad) = out.iter().find(|v| !v.is_finite()) {
        return Err(LinkError::NumericInstability {
            context: "decoder predictions".to_string(),
            value:   *bad as f64,
        }.into());
    }

    Ok(out)
}

/// Fraction of positions where `received` differs from `labels`
pub fn error_rate(received: &[f32], labels: &[f32]) -> Result<f64, LinkError> {
    if received.len() != labels.len() || labels.is_empty() {
        return Err(LinkError::shape_mismatch("error rate", &[labels.len()], &[received.len()]));
    }
    let errors = received
        .iter()
        .zip(labels)
        .filter(|(r, l)| r != l)
        .count();
    Ok(errors as f64 / labels.len() as f64)
}

/// For every SNR of `sweep`: ask `predictions` for a fresh row-major
/// [N, width] prediction matrix, impair it at that SNR and measure
/// disagreement with `labels`.
pub fn sweep_predictions<R, F>(
    mut predictions: F,
    labels:          &[f32],
    width:           usize,
    params:          &NoiseParams,
    sweep:           &SnrSweep,
    rng:             &mut R,
) -> Result<BerCurve>
where
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> Result<Vec<f32>>,
{
    sweep.validate()?;

    let mut points = Vec::with_capacity(sweep.num_points());

    for snr_db in sweep.points_db() {
        let mut signal = predictions(&mut *rng)?;
        if signal.len() != labels.len() {
            return Err(LinkError::shape_mismatch(
                format!("predictions at {snr_db} dB"),
                &[labels.len() / width.max(1), width],
                &[signal.len()],
            ).into());
        }

        let channel = ChannelModel::at_snr(params, snr_db)?;
        channel.apply_in_place(&mut signal, width, rng)?;

        for v in signal.iter_mut() {
            *v = v.round();
        }

        let ber = error_rate(&signal, labels)?;
        println!("SNR: {snr_db}, BER: {ber:.12}");
        points.push(BerPoint { snr_db, ber });
    }

    Ok(BerCurve::new(points)?)
}

/// Sweep the channel over SNR, predicting the test set anew at every point.
pub fn run_sweep<B: Backend, R: Rng + ?Sized>(
    model:    &Autoencoder<B>,
    test_set: &MessageDataset,
    params:   &NoiseParams,
    sweep:    &SnrSweep,
    device:   &B::Device,
    rng:      &mut R,
) -> Result<BerCurve> {
    tracing::info!(
        "BER sweep: {} test messages, {} SNR points from {} to {} dB",
        test_set.messages().len(), sweep.num_points(), sweep.start_db, sweep.end_db
    );

    let inference = ChannelModel::for_training(params)?.without_noise();
    let labels    = test_set.one_hot_labels();

    sweep_predictions(
        |rng: &mut R| predict(model, test_set, &inference, device, rng),
        &labels,
        test_set.num_messages(),
        params,
        sweep,
        rng,
    )
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use rand::{rngs::StdRng, SeedableRng};

    use crate::data::source::UniformMessageSource;
    use crate::domain::config::LinkConfig;
    use crate::ml::model::AutoencoderConfig;

    fn perfect_predictions(m: usize, n: usize, seed: u64) -> (Vec<f32>, usize) {
        let cfg        = LinkConfig { num_messages: m, ..Default::default() };
        let mut source = UniformMessageSource::new(&cfg, StdRng::seed_from_u64(seed));
        let ds         = MessageDataset::generate(&mut source, n, m).unwrap();
        (ds.one_hot_labels(), m)
    }

    #[test]
    fn test_error_rate_counts_disagreements() {
        let labels   = [1.0, 0.0, 0.0, 1.0];
        let received = [1.0, 1.0, 0.0, 0.0];
        assert_eq!(error_rate(&received, &labels).unwrap(), 0.5);
        assert!(error_rate(&received[..3], &labels).is_err());
    }

    #[test]
    fn test_curve_length_and_range() {
        let (labels, m) = perfect_predictions(16, 500, 1);
        let params      = NoiseParams::from_design(7.0, 4, 2);
        let sweep       = SnrSweep::default();
        let mut rng     = StdRng::seed_from_u64(2);

        let curve = sweep_predictions(|_| Ok(labels.clone()), &labels, m, &params, &sweep, &mut rng).unwrap();
        assert_eq!(curve.len(), sweep.num_points());
        for (p, snr) in curve.points().iter().zip(sweep.points_db()) {
            assert_eq!(p.snr_db, snr);
            assert!((0.0..=1.0).contains(&p.ber));
        }
    }

    #[test]
    fn test_ber_falls_as_snr_rises_on_average() {
        let (labels, m) = perfect_predictions(16, 2000, 3);
        let params      = NoiseParams::from_design(7.0, 4, 2);
        let sweep       = SnrSweep::default();

        // Aggregate over several seeds, compare low-SNR and high-SNR halves
        let mut low  = 0.0;
        let mut high = 0.0;
        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(100 + seed);
            let curve   = sweep_predictions(|_| Ok(labels.clone()), &labels, m, &params, &sweep, &mut rng).unwrap();
            let half    = curve.len() / 2;
            low  += curve.points()[..half].iter().map(|p| p.ber).sum::<f64>() / half as f64;
            high += curve.points()[half + 1..].iter().map(|p| p.ber).sum::<f64>() / half as f64;
        }
        assert!(low > high, "low-SNR mean {low} should exceed high-SNR mean {high}");
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let params  = NoiseParams::from_design(7.0, 4, 2);
        let mut rng = StdRng::seed_from_u64(4);
        let err     = sweep_predictions(|_| Ok(vec![0.0; 8]), &[0.0; 16], 4, &params, &SnrSweep::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<LinkError>(), Some(LinkError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_predictions_are_recomputed_at_every_snr_point() {
        let (labels, m) = perfect_predictions(4, 50, 8);
        let params      = NoiseParams::from_design(7.0, 2, 2);
        let sweep       = SnrSweep { start_db: 0.0, end_db: 3.0, step_db: 1.0 };
        let mut rng     = StdRng::seed_from_u64(9);

        let mut calls = 0;
        let curve = sweep_predictions(
            |_| { calls += 1; Ok(labels.clone()) },
            &labels, m, &params, &sweep, &mut rng,
        ).unwrap();
        assert_eq!(calls, 4);
        assert_eq!(curve.len(), 4);
    }

    #[test]
    fn test_predict_returns_distributions() {
        let device     = Default::default();
        let cfg        = LinkConfig { num_messages: 8, ..Default::default() };
        let model      = AutoencoderConfig::new(8, 2).init::<NdArray>(&device);
        let mut source = UniformMessageSource::new(&cfg, StdRng::seed_from_u64(5));
        let ds         = MessageDataset::generate(&mut source, 1500, 8).unwrap();

        let channel    = ChannelModel::for_training(&cfg.noise_params()).unwrap().without_noise();
        let mut rng    = StdRng::seed_from_u64(10);

        let probs = predict(&model, &ds, &channel, &device, &mut rng).unwrap();
        assert_eq!(probs.len(), 1500 * 8);
        for row in probs.chunks(8) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_inference_fading_is_redrawn_between_predictions() {
        let device     = Default::default();
        let cfg        = LinkConfig { num_messages: 8, ..Default::default() };
        let model      = AutoencoderConfig::new(8, 2).init::<NdArray>(&device);
        let mut source = UniformMessageSource::new(&cfg, StdRng::seed_from_u64(11));
        let ds         = MessageDataset::generate(&mut source, 64, 8).unwrap();
        let mut rng    = StdRng::seed_from_u64(12);

        let fading = ChannelModel::for_training(&cfg.noise_params()).unwrap().without_noise();
        let a = predict(&model, &ds, &fading, &device, &mut rng).unwrap();
        let b = predict(&model, &ds, &fading, &device, &mut rng).unwrap();
        assert_ne!(a, b);

        let clean = ChannelModel::disabled();
        let c = predict(&model, &ds, &clean, &device, &mut rng).unwrap();
        let d = predict(&model, &ds, &clean, &device, &mut rng).unwrap();
        assert_eq!(c, d);
    }

    #[test]
    fn test_run_sweep_on_untrained_model() {
        let device     = Default::default();
        let cfg        = LinkConfig { num_messages: 4, num_channels: 2, ..Default::default() };
        let model      = AutoencoderConfig::new(4, 2).init::<NdArray>(&device);
        let mut source = UniformMessageSource::new(&cfg, StdRng::seed_from_u64(6));
        let ds         = MessageDataset::generate(&mut source, 200, 4).unwrap();
        let sweep      = SnrSweep { start_db: -2.0, end_db: 2.0, step_db: 1.0 };
        let mut rng    = StdRng::seed_from_u64(7);

        let curve = run_sweep(&model, &ds, &cfg.noise_params(), &sweep, &device, &mut rng).unwrap();
        assert_eq!(curve.len(), 5);
    }
}
