// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores autoencoder weights using Burn's
// CompactRecorder, inside one directory per training run.
//
// Run directory layout:
//   runs/
//     19-10-2026_14-03-27/      ← created when training starts
//       link_config.json        ← full LinkConfig of the run
//       model_epoch_1.mpk.gz    ← weights after epoch 1
//       model_epoch_2.mpk.gz
//       ...
//       latest_epoch.json       ← number of the newest epoch
//       metrics.csv             ← see metrics.rs
//       plot_ber_7dB_k=4bits.png
//       ber_7dB_k=4bits.csv
//
// The config is needed to rebuild the exact architecture
// (M, num_channels) before loading weights into it.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::domain::config::LinkConfig;
use crate::ml::model::Autoencoder;

const CONFIG_FILE: &str = "link_config.json";
const LATEST_FILE: &str = "latest_epoch.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Use `dir` as the run directory, creating it if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create run directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Create a fresh `<base>/<DD-MM-YYYY_HH-MM-SS>` run directory
    pub fn new_run(base: impl AsRef<Path>) -> Result<Self> {
        let stamp = chrono::Local::now().format("%d-%m-%Y_%H-%M-%S").to_string();
        let dir   = base.as_ref().join(stamp);
        tracing::info!("Run directory: '{}'", dir.display());
        Self::new(dir)
    }

    /// Open an existing run directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            anyhow::bail!("Run directory '{}' does not exist", dir.display());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save weights for `epoch` to {dir}/model_epoch_{epoch}.mpk.gz
    /// and point latest_epoch.json at it.
    pub fn save_model<B: Backend>(&self, model: &Autoencoder<B>, epoch: usize) -> Result<()> {
        // Recorder adds the extension
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join(LATEST_FILE);
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", latest_path.display()))?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the latest epoch's weights into `model`.
    /// `model` must have the architecture the checkpoint was saved from.
    pub fn load_model<B: Backend>(
        &self,
        model:  Autoencoder<B>,
        device: &B::Device,
    ) -> Result<Autoencoder<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Has this run finished an epoch?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &LinkConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved link config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<LinkConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. Is this a training run directory?",
                    path.display()
                )
            })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }

    /// Epoch number stored in latest_epoch.json
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join(LATEST_FILE);

        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'", path.display()))?;

        Ok(serde_json::from_str::<usize>(&s)?)
    }
}
