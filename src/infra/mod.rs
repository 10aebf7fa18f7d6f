// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem:
//
//   checkpoint.rs  — run directory, model weights (CompactRecorder),
//                    link_config.json, latest_epoch.json
//
//   metrics.rs     — per-epoch loss / accuracy appended to metrics.csv
//
//   report.rs      — BER plot (plotters) and BER table

/// Run directory and model checkpoints
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// BER plot and table
pub mod report;
