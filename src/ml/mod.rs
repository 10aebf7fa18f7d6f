// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn-specific code lives here:
//
//   channel.rs    — Rayleigh fading + Gaussian noise, as a
//                   training stage on tensors and as a pure
//                   function on slices for the BER sweep
//
//   model.rs      — the encoder / decoder autoencoder
//
//   trainer.rs    — epoch loop: forward through the channel,
//                   cross-entropy, Adam step, validation,
//                   checkpoint + metrics per epoch
//
//   evaluator.rs  — BER sweep over SNR on a frozen model

pub mod channel;
pub mod model;
pub mod trainer;
pub mod evaluator;

/// Backend used for inference and as the inner backend of training
#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;
#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

/// Backend with autodiff, used for training
pub type TrainBackend = burn::backend::Autodiff<InferBackend>;
