// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
//
//   UniformMessageSource  → random messages over [0, M)
//       │
//       ▼
//   MessageDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   MessageBatcher        → stacks messages into tensor batches
//       │
//       ▼
//   DataLoader            → feeds batches to the training loop

/// Uniform random message generation
pub mod source;

/// Implements Burn's Dataset trait for messages
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
