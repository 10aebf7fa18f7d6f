// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================

use crate::domain::error::LinkError;
use crate::domain::message::Message;

// ─── MessageSource ────────────────────────────────────────────────────────────
/// Anything that can produce a batch of independent messages.
///
/// Implementations:
///   - UniformMessageSource → uniform draws over M with replacement
pub trait MessageSource {
    /// Draw `count` messages. `count == 0` is an InvalidArgument.
    fn generate(&mut self, count: usize) -> Result<Vec<Message>, LinkError>;
}
