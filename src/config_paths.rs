//! Centralized configuration paths for shellflow
//!
//! All config files live under:
//! - Unix/macOS: `~/.config/shellflow/`
//! - Windows: `%APPDATA%\shellflow\`
//!
//! This module is the single source of truth for config paths.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

const APP_DIR: &str = "shellflow";

/// File name prefix of the daily-rotated log files
pub const LOG_FILE_PREFIX: &str = "shellflow-keys.log";

/// Base config directory for shellflow
///
/// Unix/macOS:
///   - If XDG_CONFIG_HOME is set: `$XDG_CONFIG_HOME/shellflow`
///   - Else: `~/.config/shellflow`
///
/// Windows:
///   - `%APPDATA%\shellflow`
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_DIR))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|config| config.join(APP_DIR))
    }
}

/// Candidate user mapping files in a config dir, most preferred first
pub const MAPPINGS_FILE_NAMES: [&str; 3] = ["mappings.yaml", "mappings.jsonc", "mappings.json"];

/// `~/.config/shellflow/mappings.yaml`, or the first JSON variant that exists
pub fn mappings_file() -> Option<PathBuf> {
    config_dir().map(|dir| mappings_file_in(&dir))
}

/// First existing mappings file inside `dir`, defaulting to `mappings.yaml`
pub fn mappings_file_in(dir: &Path) -> PathBuf {
    MAPPINGS_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
        .unwrap_or_else(|| dir.join(MAPPINGS_FILE_NAMES[0]))
}

/// `~/.config/shellflow/keys.yaml`
pub fn keys_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("keys.yaml"))
}

/// `~/.config/shellflow/logs/`
pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("logs"))
}

fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))
}

/// Ensure the base config dir exists, returning it
pub fn ensure_config_dir() -> Result<PathBuf, String> {
    let dir = config_dir().ok_or_else(|| "No config directory available".to_string())?;
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Ensure logs dir exists, returning it
pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    let config = ensure_config_dir()?;
    let logs = config.join("logs");
    ensure_dir(&logs)?;
    Ok(logs)
}
