//! Engine configuration
//!
//! Stored in `~/.config/shellflow/keys.yaml`:
//!
//! ```yaml
//! platform: other          # mac | other; detected when absent
//! alias_ctrl_to_cmd: true  # off macOS, retry unbound ctrl chords as cmd
//! strict: false            # reject the whole user file on any error
//! mappings_path: ~/dotfiles/shellflow-mappings.yaml
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::keymap::{MappingsSource, Platform};

/// Keybinding engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Platform override; `None` detects the running platform
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    pub alias_ctrl_to_cmd: bool,

    pub strict: bool,

    /// User mappings file; defaults to `mappings.yaml` in the config dir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mappings_path: Option<PathBuf>,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            platform: None,
            alias_ctrl_to_cmd: true,
            strict: false,
            mappings_path: None,
        }
    }
}

impl KeysConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::keys_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load config from `path`, falling back to defaults on any failure
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to `path`, creating the parent directory if needed
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Configured platform, or the one we are running on
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::current)
    }

    /// Where user mappings come from: the configured file, else the config dir
    ///
    /// A leading `~/` expands to the home directory.
    pub fn mappings_source(&self) -> Option<MappingsSource> {
        match &self.mappings_path {
            Some(path) => Some(MappingsSource::File(expand_home(path))),
            None => crate::config_paths::config_dir().map(MappingsSource::Dir),
        }
    }

    /// The user mappings file a load would read right now
    pub fn mappings_path(&self) -> Option<PathBuf> {
        self.mappings_source().map(|source| source.path())
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
