//! Lattice configuration file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate_config};

/// Shape and threading of a channel lattice.
///
/// # TOML Format
///
/// ```toml
/// name = "stereo"
/// in_channels = 2
/// out_channels = 2
/// period_frames = 256
/// sample_rate = 48000
///
/// [threads]
/// name_prefix = "nuclear"
/// stack_size = 262144
/// ```
///
/// Missing keys take their [`Default`] values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LatticeConfig {
    /// Name of the configuration.
    pub name: String,

    /// Interleaved input channels (`1..=128`).
    pub in_channels: u32,

    /// Interleaved output channels (`1..=128`).
    pub out_channels: u32,

    /// Frames per tick (`1..=65536`).
    pub period_frames: u32,

    /// Sample rate hint in Hz, used for WAV output and latency reporting.
    pub sample_rate: u32,

    /// Worker-thread options.
    pub threads: ThreadConfig,
}

/// Worker-thread options shared by every node of the lattice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ThreadConfig {
    /// Prefix for worker thread names.
    pub name_prefix: String,

    /// Worker stack size in bytes; platform default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_size: Option<usize>,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            name: "stereo".to_string(),
            in_channels: 2,
            out_channels: 2,
            period_frames: 256,
            sample_rate: 48000,
            threads: ThreadConfig::default(),
        }
    }
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            name_prefix: "nuclear".to_string(),
            stack_size: None,
        }
    }
}

impl LatticeConfig {
    /// Create a configuration with the given name and default values.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set input and output channel counts.
    pub fn with_channels(mut self, in_channels: u32, out_channels: u32) -> Self {
        self.in_channels = in_channels;
        self.out_channels = out_channels;
        self
    }

    /// Set the period size in frames.
    pub fn with_period(mut self, period_frames: u32) -> Self {
        self.period_frames = period_frames;
        self
    }

    /// Set the sample rate hint.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Number of wired lanes: `min(in_channels, out_channels)`.
    pub fn lanes(&self) -> u32 {
        self.in_channels.min(self.out_channels)
    }

    /// Duration of one period in milliseconds at the configured sample rate.
    pub fn period_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        f64::from(self.period_frames) * 1000.0 / f64::from(self.sample_rate)
    }

    /// Check every field against its accepted range.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(self)
    }

    /// Load and validate a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: LatticeConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Save to `path` only if nothing exists there yet, unless `force` is set.
    pub fn save_new(&self, path: impl AsRef<Path>, force: bool) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        self.save(path)
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_takes_defaults() {
        let config = LatticeConfig::from_toml("in_channels = 4\n").unwrap();
        assert_eq!(config.in_channels, 4);
        assert_eq!(config.out_channels, 2);
        assert_eq!(config.threads.name_prefix, "nuclear");
        assert_eq!(config.lanes(), 2);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = LatticeConfig::from_toml("in_chanels = 4\n");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn out_of_range_is_a_validation_error() {
        let result = LatticeConfig::from_toml("period_frames = 0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = LatticeConfig::new("octo").with_channels(8, 6).with_period(128);
        config.threads.stack_size = Some(512 * 1024);
        let text = config.to_toml().unwrap();
        assert!(text.contains("[threads]"));
        assert_eq!(LatticeConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn absent_stack_size_is_not_written() {
        let text = LatticeConfig::default().to_toml().unwrap();
        assert!(!text.contains("stack_size"));
    }

    #[test]
    fn period_duration() {
        let config = LatticeConfig::default().with_period(480).with_sample_rate(48000);
        assert!((config.period_ms() - 10.0).abs() < 1e-9);
    }
}
