// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for one goal at a time.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing (that's Layer 1)
//   - Only workflow coordination

// Generate data, train, sweep BER, write artefacts
pub mod train_use_case;

// Reload a finished run and sweep BER again
pub mod evaluate_use_case;
