// ============================================================
// Layer 3 — Link Configuration
// ============================================================
// One immutable object holding every constant of a run.
// It is passed by reference into every component constructor,
// so several configurations can live in one process.
//
// Derived quantities:
//   k             = log2(M)              bits per message
//   R             = k / num_channels     code rate
//   Eb/No         = 10^(Eb_No_dB / 10)   dB → linear
//   beta_variance = 1 / (2 R Eb/No)
//
// Saved as JSON next to the checkpoints so a run can be
// reloaded and re-evaluated later.

use serde::{Deserialize, Serialize};

use crate::domain::error::LinkError;

/// Upper bound on the number of swept SNR values
pub const MAX_SWEEP_POINTS: usize = 10_000;

// Absorbs float error when the step divides the range exactly
const POINT_EPSILON: f64 = 1e-9;

// ─── SnrSweep ────────────────────────────────────────────────────────────────
/// Linearly spaced SNR grid (in dB) used by the evaluation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnrSweep {
    pub start_db: f64,
    pub end_db:   f64,
    pub step_db:  f64,
}

impl Default for SnrSweep {
    fn default() -> Self {
        Self { start_db: -15.0, end_db: 15.0, step_db: 0.5 }
    }
}

impl SnrSweep {
    pub fn validate(&self) -> Result<(), LinkError> {
        if !(self.start_db.is_finite() && self.end_db.is_finite() && self.step_db.is_finite()) {
            return Err(LinkError::Configuration(format!(
                "SNR sweep bounds must be finite, got {:?}", self
            )));
        }
        if self.step_db <= 0.0 {
            return Err(LinkError::Configuration(format!(
                "SNR sweep step must be positive, got {} dB", self.step_db
            )));
        }
        if self.end_db < self.start_db {
            return Err(LinkError::Configuration(format!(
                "SNR sweep end ({} dB) is below its start ({} dB)",
                self.end_db, self.start_db
            )));
        }
        let steps = self.steps();
        if steps >= MAX_SWEEP_POINTS as f64 {
            return Err(LinkError::Configuration(format!(
                "SNR sweep from {} to {} dB at {} dB steps exceeds {} points",
                self.start_db, self.end_db, self.step_db, MAX_SWEEP_POINTS
            )));
        }
        Ok(())
    }

    /// Whole steps that fit between start and end
    fn steps(&self) -> f64 {
        ((self.end_db - self.start_db) / self.step_db + POINT_EPSILON).floor()
    }

    /// Number of points with start + i*step <= end.
    /// -15..15 at 0.5 dB gives 61 points.
    pub fn num_points(&self) -> usize {
        self.steps() as usize + 1
    }

    /// Ascending SNR values in dB.
    /// Computed as start + i*step rather than by accumulation.
    pub fn points_db(&self) -> Vec<f64> {
        (0..self.num_points())
            .map(|i| self.start_db + i as f64 * self.step_db)
            .collect()
    }
}

// ─── NoiseParams ─────────────────────────────────────────────────────────────
/// Channel noise parameters derived from the design Eb/No and code rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParams {
    pub code_rate:     f64,
    pub eb_no_db:      f64,
    pub beta_variance: f64,
}

impl NoiseParams {
    pub fn from_design(eb_no_db: f64, bits_per_message: usize, num_channels: usize) -> Self {
        let code_rate     = bits_per_message as f64 / num_channels as f64;
        let eb_no         = db_to_linear(eb_no_db);
        let beta_variance = 1.0 / (2.0 * code_rate * eb_no);
        Self { code_rate, eb_no_db, beta_variance }
    }

    /// Rayleigh scale used for fading, at train and evaluation time alike.
    /// This is beta_variance itself, not its square root.
    pub fn fading_scale(&self) -> f64 {
        self.beta_variance
    }

    /// Gaussian noise std at the design SNR (training time)
    pub fn design_noise_std(&self) -> f64 {
        self.beta_variance.sqrt()
    }

    /// Gaussian noise std at an arbitrary SNR (evaluation time)
    pub fn noise_std_at(&self, snr_db: f64) -> f64 {
        let snr = db_to_linear(snr_db);
        (1.0 / (2.0 * self.code_rate * snr)).sqrt()
    }
}

pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

// ─── LinkConfig ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// M — number of distinct messages, must be a power of two
    pub num_messages:  usize,
    /// n — channel uses per message
    pub num_channels:  usize,
    /// Design Eb/No used by the channel during training
    pub eb_no_db:      f64,
    pub train_size:    usize,
    pub val_size:      usize,
    pub test_size:     usize,
    pub batch_size:    usize,
    pub epochs:        usize,
    pub learning_rate: f64,
    pub sweep:         SnrSweep,
    /// Fixes data, channel draws and weight init when set
    pub seed:          Option<u64>,
    /// Parent directory of the timestamped run directories
    pub output_dir:    String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            num_messages:  16,
            num_channels:  2,
            eb_no_db:      7.0,
            train_size:    50_000,
            val_size:      5_000,
            test_size:     50_000,
            batch_size:    64,
            epochs:        10,
            learning_rate: 1e-3,
            sweep:         SnrSweep::default(),
            seed:          None,
            output_dir:    "runs".to_string(),
        }
    }
}

impl LinkConfig {
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.num_messages < 2 || !self.num_messages.is_power_of_two() {
            return Err(LinkError::Configuration(format!(
                "number of messages M must be a power of two >= 2, got {}",
                self.num_messages
            )));
        }
        if self.num_channels == 0 {
            return Err(LinkError::Configuration(
                "number of channels per message must be at least 1".to_string(),
            ));
        }
        if !self.eb_no_db.is_finite() {
            return Err(LinkError::Configuration(format!(
                "design Eb/No must be finite, got {}", self.eb_no_db
            )));
        }

        for (name, value) in [
            ("train_size", self.train_size),
            ("val_size",   self.val_size),
            ("test_size",  self.test_size),
            ("batch_size", self.batch_size),
            ("epochs",     self.epochs),
        ] {
            if value == 0 {
                return Err(LinkError::Configuration(format!("{name} must be positive")));
            }
        }

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(LinkError::Configuration(format!(
                "learning rate must be positive, got {}", self.learning_rate
            )));
        }

        self.sweep.validate()
    }

    /// k = log2(M)
    pub fn bits_per_message(&self) -> usize {
        self.num_messages.trailing_zeros() as usize
    }

    /// R = k / n
    pub fn code_rate(&self) -> f64 {
        self.bits_per_message() as f64 / self.num_channels as f64
    }

    pub fn noise_params(&self) -> NoiseParams {
        NoiseParams::from_design(self.eb_no_db, self.bits_per_message(), self.num_channels)
    }
}
