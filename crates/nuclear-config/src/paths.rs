//! Platform-specific configuration paths.
//!
//! - Linux: `~/.config/nuclear/`
//! - macOS: `~/Library/Application Support/nuclear/`
//! - Windows: `%APPDATA%\nuclear\`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "nuclear";

/// File name of the default lattice configuration.
pub const CONFIG_FILE_NAME: &str = "lattice.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the path used when no `--config` is given.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}
