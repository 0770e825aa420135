//! Default paths for wardend components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/appwarden/config.toml` or `~/.config/appwarden/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the config path
pub const APPWARDEN_CONFIG_ENV: &str = "APPWARDEN_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "appwarden";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$APPWARDEN_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/appwarden/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/appwarden/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(APPWARDEN_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_dir().join(CONFIG_FILENAME)
}

/// Get the config directory without checking the override variable.
pub fn config_dir() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/etc").join(APP_DIR)
}
