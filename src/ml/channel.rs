// ============================================================
// Layer 5 — Channel Model
// ============================================================
// Simulates a physical channel on a batch of real-valued
// signal rows [batch, width]:
//
//   1. Rayleigh fading    y = x * (1 - f)     f ~ Rayleigh(scale), one f per column
//   2. Gaussian noise     y = y + w           w ~ N(0, std²), one w per element
//
// The same draw feeds two front ends:
//   - apply_tensor(): a training stage between encoder and
//     decoder. Fading and noise are built as detached constant
//     tensors, so gradients only flow through the arithmetic.
//   - apply_in_place(): a pure function over a row-major f32
//     slice, used by the evaluation sweep.
//
// Scale parameters:
//   training    fading = beta_variance, std = sqrt(beta_variance)
//   inference   fading = beta_variance, no noise (validation and
//               the predictions fed to the sweep)
//   evaluation  fading = beta_variance, std = sqrt(1 / (2 R snr))
//
// beta_variance is used directly as the Rayleigh scale (not its
// square root) so BER curves stay comparable with earlier runs.
//
// No state is kept between calls; randomness comes from the
// generator the caller passes in.

use burn::prelude::*;
use rand::Rng;
use rand_distr::{Distribution, Normal, Weibull};

use crate::domain::{config::NoiseParams, error::LinkError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelModel {
    fading_scale: f64,
    noise_std:    f64,
}

/// One realisation of the channel for a [rows, width] signal
#[derive(Debug, Clone)]
pub struct ChannelDraw {
    /// One fading sample per column — length `width`
    pub fading: Vec<f32>,
    /// One noise sample per element — length `rows * width`, row-major
    pub noise:  Vec<f32>,
}

impl ChannelModel {
    pub fn new(fading_scale: f64, noise_std: f64) -> Result<Self, LinkError> {
        if !(fading_scale.is_finite() && fading_scale >= 0.0) {
            return Err(LinkError::InvalidArgument(format!(
                "Rayleigh scale must be finite and non-negative, got {fading_scale}"
            )));
        }
        if !(noise_std.is_finite() && noise_std >= 0.0) {
            return Err(LinkError::InvalidArgument(format!(
                "noise std must be finite and non-negative, got {noise_std}"
            )));
        }
        Ok(Self { fading_scale, noise_std })
    }

    /// Channel at the design Eb/No, used while training
    pub fn for_training(params: &NoiseParams) -> Result<Self, LinkError> {
        Self::new(params.fading_scale(), params.design_noise_std())
    }

    /// Channel at a swept SNR, used by the evaluation sweep
    pub fn at_snr(params: &NoiseParams, snr_db: f64) -> Result<Self, LinkError> {
        Self::new(params.fading_scale(), params.noise_std_at(snr_db))
    }

    /// The same fading with the Gaussian stage switched off.
    /// Noise only exists while training; fading stays active at inference.
    pub fn without_noise(&self) -> Self {
        Self { fading_scale: self.fading_scale, noise_std: 0.0 }
    }

    /// Identity channel: no fading, no noise
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self { fading_scale: 0.0, noise_std: 0.0 }
    }

    pub fn fading_scale(&self) -> f64 {
        self.fading_scale
    }

    pub fn noise_std(&self) -> f64 {
        self.noise_std
    }

    /// Draw fading and noise for a [rows, width] signal.
    pub fn draw<R: Rng + ?Sized>(&self, rows: usize, width: usize, rng: &mut R) -> Result<ChannelDraw, LinkError> {
        let fading = if self.fading_scale > 0.0 {
            // Rayleigh(σ) is Weibull with shape 2 and scale σ·√2
            let rayleigh = Weibull::new(self.fading_scale * std::f64::consts::SQRT_2, 2.0)
                .map_err(|e| LinkError::InvalidArgument(format!("Rayleigh scale: {e}")))?;
            (0..width).map(|_| rayleigh.sample(rng) as f32).collect()
        } else {
            vec![0.0; width]
        };

        let noise = if self.noise_std > 0.0 {
            let gaussian = Normal::new(0.0, self.noise_std)
                .map_err(|e| LinkError::InvalidArgument(format!("noise std: {e}")))?;
            (0..rows * width).map(|_| gaussian.sample(rng) as f32).collect()
        } else {
            vec![0.0; rows * width]
        };

        Ok(ChannelDraw { fading, noise })
    }

    /// Impair a row-major [rows, width] buffer in place.
    pub fn apply_in_place<R: Rng + ?Sized>(
        &self,
        signal: &mut [f32],
        width:  usize,
        rng:    &mut R,
    ) -> Result<(), LinkError> {
        if width == 0 || signal.len() % width != 0 {
            return Err(LinkError::shape_mismatch(
                "channel input",
                &[signal.len() / width.max(1), width],
                &[signal.len()],
            ));
        }
        let rows = signal.len() / width;
        let draw = self.draw(rows, width, rng)?;

        for (i, value) in signal.iter_mut().enumerate() {
            *value = *value * (1.0 - draw.fading[i % width]) + draw.noise[i];
        }
        Ok(())
    }

    /// Impair a [batch, width] tensor. The random draws are detached
    /// constants; output has the input's shape.
    pub fn apply_tensor<B: Backend, R: Rng + ?Sized>(
        &self,
        signal: Tensor<B, 2>,
        rng:    &mut R,
    ) -> Result<Tensor<B, 2>, LinkError> {
        let [rows, width] = signal.dims();
        let device        = signal.device();
        let draw          = self.draw(rows, width, rng)?;

        let fading = Tensor::<B, 2>::from_data(TensorData::new(draw.fading, [1, width]), &device)
            .detach();
        let noise  = Tensor::<B, 2>::from_data(TensorData::new(draw.noise, [rows, width]), &device)
            .detach();

        // (1 - f) broadcasts over the batch dimension
        let gain = fading.neg() + 1.0;
        Ok(signal * gain + noise)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use rand::{rngs::StdRng, SeedableRng};

    type TestBackend = NdArray;

    fn design_params() -> NoiseParams {
        NoiseParams::from_design(7.0, 4, 2)
    }

    #[test]
    fn test_tensor_output_shape_matches_input() {
        let mut rng = StdRng::seed_from_u64(0);
        let channel = ChannelModel::for_training(&design_params()).unwrap();
        let device  = Default::default();

        for (rows, width) in [(1, 1), (64, 2), (7, 16), (128, 5)] {
            let x = Tensor::<TestBackend, 2>::ones([rows, width], &device);
            let y = channel.apply_tensor(x, &mut rng).unwrap();
            assert_eq!(y.dims(), [rows, width]);
        }
    }

    #[test]
    fn test_slice_output_length_matches_input() {
        let mut rng    = StdRng::seed_from_u64(1);
        let channel    = ChannelModel::at_snr(&design_params(), 0.0).unwrap();
        let mut signal = vec![0.5f32; 3 * 16];
        channel.apply_in_place(&mut signal, 16, &mut rng).unwrap();
        assert_eq!(signal.len(), 48);
    }

    #[test]
    fn test_rejects_ragged_slice() {
        let mut rng    = StdRng::seed_from_u64(2);
        let mut signal = vec![0.0f32; 10];
        let result     = ChannelModel::disabled().apply_in_place(&mut signal, 3, &mut rng);
        assert!(matches!(result, Err(LinkError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_disabled_channel_is_identity() {
        let mut rng    = StdRng::seed_from_u64(3);
        let original   = vec![0.1f32, -2.0, 3.5, 0.0, 1.0, 7.25];
        let mut signal = original.clone();
        ChannelModel::disabled().apply_in_place(&mut signal, 3, &mut rng).unwrap();
        assert_eq!(signal, original);

        let device = Default::default();
        let x = Tensor::<TestBackend, 2>::from_data(TensorData::new(original.clone(), [2, 3]), &device);
        let y: Vec<f32> = ChannelModel::disabled()
            .apply_tensor(x, &mut rng)
            .unwrap()
            .into_data()
            .to_vec()
            .unwrap();
        assert_eq!(y, original);
    }

    #[test]
    fn test_fading_is_shared_across_rows() {
        // Noise off: every row of a constant signal sees the same gain per column
        let mut rng    = StdRng::seed_from_u64(4);
        let channel    = ChannelModel::new(0.5, 0.0).unwrap();
        let mut signal = vec![1.0f32; 4 * 3];
        channel.apply_in_place(&mut signal, 3, &mut rng).unwrap();
        for row in signal.chunks(3) {
            assert_eq!(row, &signal[0..3]);
        }
    }

    #[test]
    fn test_two_calls_draw_independently() {
        let mut rng = StdRng::seed_from_u64(5);
        let channel = ChannelModel::for_training(&design_params()).unwrap();
        let mut a   = vec![1.0f32; 32];
        let mut b   = vec![1.0f32; 32];
        channel.apply_in_place(&mut a, 2, &mut rng).unwrap();
        channel.apply_in_place(&mut b, 2, &mut rng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rayleigh_draw_matches_scale() {
        // Rayleigh(σ) has mean σ·sqrt(π/2)
        let mut rng = StdRng::seed_from_u64(6);
        let sigma   = 0.3;
        let draw    = ChannelModel::new(sigma, 0.0).unwrap().draw(1, 200_000, &mut rng).unwrap();
        let mean    = draw.fading.iter().map(|&f| f as f64).sum::<f64>() / draw.fading.len() as f64;
        let expected = sigma * (std::f64::consts::PI / 2.0).sqrt();
        assert!((mean - expected).abs() < 0.01, "mean = {mean}, expected = {expected}");
        assert!(draw.fading.iter().all(|&f| f >= 0.0));
    }

    #[test]
    fn test_noise_draw_matches_std() {
        let mut rng = StdRng::seed_from_u64(7);
        let std     = 0.4;
        let draw    = ChannelModel::new(0.0, std).unwrap().draw(1000, 100, &mut rng).unwrap();
        let n       = draw.noise.len() as f64;
        let mean    = draw.noise.iter().map(|&w| w as f64).sum::<f64>() / n;
        let var     = draw.noise.iter().map(|&w| (w as f64 - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 0.01);
        assert!((var.sqrt() - std).abs() < 0.01);
    }

    #[test]
    fn test_without_noise_keeps_fading_only() {
        let channel = ChannelModel::for_training(&design_params()).unwrap();
        let quiet   = channel.without_noise();
        assert_eq!(quiet.fading_scale(), channel.fading_scale());
        assert_eq!(quiet.noise_std(), 0.0);

        // Constant rows stay identical to each other: no per-element noise
        let mut rng    = StdRng::seed_from_u64(9);
        let mut signal = vec![1.0f32; 5 * 4];
        quiet.apply_in_place(&mut signal, 4, &mut rng).unwrap();
        for row in signal.chunks(4) {
            assert_eq!(row, &signal[0..4]);
        }
        assert!(signal.iter().any(|&v| v != 1.0));
    }

    #[test]
    fn test_rejects_negative_parameters() {
        assert!(ChannelModel::new(-1.0, 0.0).is_err());
        assert!(ChannelModel::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_gradient_flows_through_signal_only() {
        type Ad = Autodiff<NdArray>;
        let mut rng = StdRng::seed_from_u64(8);
        let device  = Default::default();
        let channel = ChannelModel::new(0.2, 0.1).unwrap();

        let x = Tensor::<Ad, 2>::ones([4, 2], &device).require_grad();
        let y = channel.apply_tensor(x.clone(), &mut rng).unwrap();
        let grads = y.sum().backward();

        // d(sum)/dx = (1 - f) per column, identical down each column
        let grad: Vec<f32> = x.grad(&grads).unwrap().into_data().to_vec().unwrap();
        assert_eq!(grad.len(), 8);
        for row in grad.chunks(2) {
            assert_eq!(row, &grad[0..2]);
        }
        assert!(grad.iter().all(|&g| g <= 1.0));
    }
}
