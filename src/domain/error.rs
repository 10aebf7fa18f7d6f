// ============================================================
// Layer 3 — Link Errors
// ============================================================
// Every failure in the core is fatal to the current run.
// Variants carry the offending shape or value so the
// operator can see what went wrong without a debugger.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    /// A configuration value is out of range (M not a power of two,
    /// zero-sized dataset, malformed sweep, ...)
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A call argument is out of range
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A batch or signal does not have the dimensionality the link expects
    #[error("shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context:  String,
        expected: Vec<usize>,
        actual:   Vec<usize>,
    },

    /// NaN or Inf showed up in a loss or a prediction
    #[error("numeric instability in {context}: value {value}")]
    NumericInstability {
        context: String,
        value:   f64,
    },
}

impl LinkError {
    pub fn shape_mismatch(
        context:  impl Into<String>,
        expected: &[usize],
        actual:   &[usize],
    ) -> Self {
        Self::ShapeMismatch {
            context:  context.into(),
            expected: expected.to_vec(),
            actual:   actual.to_vec(),
        }
    }

    /// Returns an error if `value` is not finite
    pub fn check_finite(context: impl Into<String>, value: f64) -> Result<f64, Self> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Self::NumericInstability { context: context.into(), value })
        }
    }
}
