// ============================================================
// Layer 6 — BER Report
// ============================================================
// Persists a finished BER curve into the run directory:
//
//   plot_ber_{Eb_No_dB}dB_k={k}bits.png   log-scale BER vs SNR (dB)
//   ber_{Eb_No_dB}dB_k={k}bits.csv        snr_db,ber rows in sweep order
//
// The y axis is fixed to [1e-6, 1]. Points with BER = 0 have no
// place on a log axis and are left out of the plot (they stay in
// the CSV).

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use plotters::prelude::*;

use crate::domain::{ber::BerCurve, config::LinkConfig};

const PLOT_SIZE: (u32, u32) = (1000, 700);
const BER_FLOOR: f64        = 1e-6;

pub struct BerReport {
    dir:   PathBuf,
    stem:  String,
    title: String,
}

impl BerReport {
    pub fn new(dir: impl AsRef<Path>, cfg: &LinkConfig) -> Self {
        let k = cfg.bits_per_message();
        Self {
            dir:   dir.as_ref().to_path_buf(),
            stem:  format!("{}dB_k={}bits", cfg.eb_no_db, k),
            title: format!("Autoencoder: Trained at {} dB_{} bits", cfg.eb_no_db, k),
        }
    }

    pub fn plot_path(&self) -> PathBuf {
        self.dir.join(format!("plot_ber_{}.png", self.stem))
    }

    pub fn table_path(&self) -> PathBuf {
        self.dir.join(format!("ber_{}.csv", self.stem))
    }

    /// Write both the table and the plot
    pub fn save(&self, curve: &BerCurve) -> Result<()> {
        if curve.is_empty() {
            anyhow::bail!("BER curve has no points, nothing written to '{}'", self.dir.display());
        }
        self.save_table(curve)?;
        self.save_plot(curve)?;
        tracing::info!("BER plot saved to '{}'", self.plot_path().display());
        Ok(())
    }

    pub fn save_table(&self, curve: &BerCurve) -> Result<()> {
        let mut csv = String::from("snr_db,ber\n");
        for p in curve.points() {
            csv.push_str(&format!("{},{:.12}\n", p.snr_db, p.ber));
        }
        let path = self.table_path();
        fs::write(&path, csv)
            .with_context(|| format!("Cannot write BER table to '{}'", path.display()))
    }

    pub fn save_plot(&self, curve: &BerCurve) -> Result<()> {
        let path = self.plot_path();
        let draw_err = |e: &dyn std::fmt::Display| {
            anyhow::anyhow!("Cannot draw BER plot '{}': {e}", path.display())
        };

        let (x_min, x_max) = snr_range(curve);

        let root = BitMapBackend::new(&path, PLOT_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|e| draw_err(&e))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, (BER_FLOOR..1.0f64).log_scale())
            .map_err(|e| draw_err(&e))?;

        chart
            .configure_mesh()
            .x_desc("SNR (dB)")
            .y_desc("BER")
            .draw()
            .map_err(|e| draw_err(&e))?;

        chart
            .draw_series(
                curve.points()
                    .iter()
                    .filter(|p| p.ber > 0.0)
                    .map(|p| Circle::new((p.snr_db, p.ber), 4, BLUE.filled())),
            )
            .map_err(|e| draw_err(&e))?;

        root.present().map_err(|e| draw_err(&e))?;
        Ok(())
    }
}

/// x range of the plot; a single-point curve gets ±1 dB around it
fn snr_range(curve: &BerCurve) -> (f64, f64) {
    let points = curve.points();
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if last.snr_db > first.snr_db => (first.snr_db, last.snr_db),
        (Some(only), _) => (only.snr_db - 1.0, only.snr_db + 1.0),
        _ => (-1.0, 1.0),
    }
}
