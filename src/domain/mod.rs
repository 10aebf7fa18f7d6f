// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe the link being simulated:
// the configuration, the noise parameters derived from it,
// the messages that cross the link and the BER curve that
// comes out the other end.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// Link configuration, SNR sweep and derived noise parameters
pub mod config;

// Error taxonomy shared by every layer
pub mod error;

// A single message and its one-hot form
pub mod message;

// (SNR, BER) pairs produced by the evaluation sweep
pub mod ber;

// Core abstractions (traits) that other layers implement
pub mod traits;
