//! Shared CLI helpers used across multiple commands.

use std::path::Path;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use nuclear_config::{LatticeConfig, default_config_path};
use nuclear_core::{ChannelLattice, ChannelLayout, LaneFn, ProcessResult, ThreadOptions};

/// Load the lattice configuration.
///
/// Searches in this order:
/// 1. The explicit `--config` path
/// 2. The user config file, if present
/// 3. Built-in defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<LatticeConfig> {
    if let Some(path) = path {
        tracing::debug!(path = %path.display(), "loading lattice config");
        return Ok(LatticeConfig::load(path)?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        tracing::debug!(path = %default_path.display(), "loading user lattice config");
        return Ok(LatticeConfig::load(&default_path)?);
    }

    Ok(LatticeConfig::default())
}

/// Build a stopped channel lattice from a validated configuration.
pub fn build_lattice(config: &LatticeConfig, lane_fn: Option<LaneFn>) -> anyhow::Result<ChannelLattice> {
    config.validate()?;
    let layout = ChannelLayout::new(
        config.in_channels as usize,
        config.out_channels as usize,
        config.period_frames as usize,
    );
    let threads = ThreadOptions {
        name_prefix: config.threads.name_prefix.clone(),
        stack_size: config.threads.stack_size,
    };
    Ok(ChannelLattice::with_options(layout, threads, lane_fn)?)
}

/// Lane function applying a fixed gain, or `None` for unity.
pub fn gain_lane(gain_db: f32) -> Option<LaneFn> {
    if gain_db == 0.0 {
        return None;
    }
    let gain = db_to_linear(gain_db);
    Some(Arc::new(move |_lane, samples: &mut [f32]| -> ProcessResult {
        for sample in samples.iter_mut() {
            *sample *= gain;
        }
        Ok(())
    }))
}

/// Progress bar shared by long-running commands.
pub fn progress_bar(len: u64) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    Ok(pb)
}

pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}

pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0, f32::max)
}
