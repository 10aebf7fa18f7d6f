// ============================================================
// Layer 3 — BER Curve
// ============================================================
// The output of the evaluation sweep: one (SNR, BER) point per
// swept SNR value, kept in sweep order (ascending SNR).
// Built once, never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::domain::error::LinkError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BerPoint {
    pub snr_db: f64,
    pub ber:    f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BerCurve {
    points: Vec<BerPoint>,
}

impl BerCurve {
    /// Build a curve, checking every BER is in [0, 1] and the SNRs ascend
    pub fn new(points: Vec<BerPoint>) -> Result<Self, LinkError> {
        for p in &points {
            LinkError::check_finite(format!("BER at {} dB", p.snr_db), p.ber)?;
            if !(0.0..=1.0).contains(&p.ber) {
                return Err(LinkError::InvalidArgument(format!(
                    "BER {} at {} dB is outside [0, 1]", p.ber, p.snr_db
                )));
            }
        }
        if points.windows(2).any(|w| w[1].snr_db <= w[0].snr_db) {
            return Err(LinkError::InvalidArgument(
                "BER curve SNR values must be strictly ascending".to_string(),
            ));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[BerPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// BER at the swept point closest to `snr_db`
    pub fn ber_near(&self, snr_db: f64) -> Option<f64> {
        self.points
            .iter()
            .min_by(|a, b| {
                (a.snr_db - snr_db).abs().total_cmp(&(b.snr_db - snr_db).abs())
            })
            .map(|p| p.ber)
    }
}
