//! Configuration management for nuclear lattices.
//!
//! A lattice configuration fixes the channel layout, period size and worker
//! thread options of a channel lattice. It is stored as TOML, validated on
//! load, and defaults to `<config dir>/nuclear/lattice.toml`.
//!
//! # Example
//!
//! ```rust,no_run
//! use nuclear_config::{LatticeConfig, default_config_path};
//!
//! let config = LatticeConfig::new("surround").with_channels(6, 6).with_period(512);
//! config.save(default_config_path()).unwrap();
//!
//! let loaded = LatticeConfig::load(default_config_path()).unwrap();
//! assert_eq!(loaded.lanes(), 6);
//! ```

mod config;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

/// Range checks for configuration values.
pub mod validation;

pub use config::{LatticeConfig, ThreadConfig};
pub use error::ConfigError;
pub use paths::{CONFIG_FILE_NAME, default_config_path, user_config_dir};
pub use validation::{
    MAX_CHANNELS, MAX_PERIOD_FRAMES, ValidationError, ValidationResult, validate_config,
};
