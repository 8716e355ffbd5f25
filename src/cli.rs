//! Command-line argument parsing for `shellflow-keys`
//!
//! Supports:
//! - Validating a mapping file
//! - Resolving a chord under a set of context flags
//! - Listing the active bindings
//! - Watching the user mapping file for changes

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::KeysConfig;
use crate::keymap::{ContextSet, MappingsSource, Platform};

/// Inspect and test shellflow key mappings
#[derive(Parser, Debug)]
#[command(
    name = "shellflow-keys",
    version,
    about = "Inspect and test shellflow key mappings"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CliCommand,

    /// User mappings file (defaults to the configured one)
    #[arg(long, global = true, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Platform to resolve and display for (detected by default)
    #[arg(long, global = true, value_enum)]
    pub platform: Option<PlatformArg>,

    /// Reject the whole user file on any error
    #[arg(long, global = true)]
    pub strict: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Validate a mapping file and print every error and warning
    Check {
        /// File to check (defaults to the user mappings file)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },

    /// Resolve a chord against defaults plus the user file
    Resolve {
        /// Chord in any spelling, e.g. `Cmd+Shift+P`
        chord: String,

        /// Active context flag (repeatable)
        #[arg(short, long = "context", value_name = "FLAG")]
        contexts: Vec<String>,
    },

    /// Print every binding active under the given flags
    List {
        /// Active context flag (repeatable)
        #[arg(short, long = "context", value_name = "FLAG")]
        contexts: Vec<String>,
    },

    /// Reload the mapping table whenever the user file changes
    Watch,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformArg {
    Mac,
    Other,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Mac => Platform::Mac,
            PlatformArg::Other => Platform::Other,
        }
    }
}

/// What to run
#[derive(Debug, Clone)]
pub enum Task {
    Check { path: Option<PathBuf> },
    Resolve { chord: String, contexts: ContextSet },
    List { contexts: ContextSet },
    Watch,
}

/// Settings derived from CLI arguments layered over `keys.yaml`
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub task: Task,
    pub mappings: Option<MappingsSource>,
    pub platform: Platform,
    pub strict: bool,
    pub alias_ctrl_to_cmd: bool,
}

impl CliArgs {
    /// Combine parsed CLI args with the engine config
    ///
    /// Command-line flags win over `keys.yaml`. Unknown context flags are
    /// rejected so that typos don't silently resolve against nothing.
    pub fn into_config(self, keys: &KeysConfig) -> Result<RunConfig, String> {
        let task = match self.command {
            CliCommand::Check { path } => Task::Check { path },
            CliCommand::Resolve { chord, contexts } => {
                if crate::keymap::normalize_key(&chord).is_empty() {
                    return Err(format!("Invalid chord '{}'", chord));
                }
                Task::Resolve {
                    chord,
                    contexts: parse_contexts(&contexts)?,
                }
            }
            CliCommand::List { contexts } => Task::List {
                contexts: parse_contexts(&contexts)?,
            },
            CliCommand::Watch => Task::Watch,
        };

        Ok(RunConfig {
            task,
            mappings: self
                .file
                .map(MappingsSource::File)
                .or_else(|| keys.mappings_source()),
            platform: self.platform.map(Platform::from).unwrap_or_else(|| keys.platform()),
            strict: self.strict || keys.strict,
            alias_ctrl_to_cmd: keys.alias_ctrl_to_cmd,
        })
    }
}

fn parse_contexts(names: &[String]) -> Result<ContextSet, String> {
    let (set, unknown) = ContextSet::from_names(names);
    if unknown.is_empty() {
        Ok(set)
    } else {
        Err(format!("Unknown context flag(s): {}", unknown.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::ContextFlag;

    fn args(command: CliCommand) -> CliArgs {
        CliArgs {
            command,
            file: None,
            platform: None,
            strict: false,
        }
    }

    #[test]
    fn test_parse_resolve_with_contexts() {
        let parsed = CliArgs::try_parse_from([
            "shellflow-keys",
            "resolve",
            "cmd-w",
            "--context",
            "drawerFocused",
            "-c",
            "drawerOpen",
        ])
        .unwrap();
        let config = parsed.into_config(&KeysConfig::default()).unwrap();
        let Task::Resolve { chord, contexts } = config.task else {
            panic!("Expected Resolve task");
        };
        assert_eq!(chord, "cmd-w");
        assert!(contexts.contains(ContextFlag::DrawerFocused));
        assert!(contexts.contains(ContextFlag::DrawerOpen));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let parsed = CliArgs::try_parse_from([
            "shellflow-keys",
            "list",
            "--platform",
            "other",
            "--strict",
            "--file",
            "custom.json",
        ])
        .unwrap();
        let config = parsed.into_config(&KeysConfig::default()).unwrap();
        assert_eq!(config.platform, Platform::Other);
        assert!(config.strict);
        assert_eq!(
            config.mappings,
            Some(MappingsSource::File(PathBuf::from("custom.json")))
        );
    }

    #[test]
    fn test_unknown_context_rejected() {
        let cli = args(CliCommand::List {
            contexts: vec!["drawerFocussed".to_string()],
        });
        let err = cli.into_config(&KeysConfig::default()).unwrap_err();
        assert!(err.contains("drawerFocussed"));
    }

    #[test]
    fn test_empty_chord_rejected() {
        let cli = args(CliCommand::Resolve {
            chord: String::new(),
            contexts: vec![],
        });
        assert!(cli.into_config(&KeysConfig::default()).is_err());
    }

    #[test]
    fn test_keys_config_fills_defaults() {
        let keys = KeysConfig {
            platform: Some(Platform::Mac),
            alias_ctrl_to_cmd: false,
            strict: true,
            mappings_path: Some(PathBuf::from("/etc/shellflow/mappings.yaml")),
        };
        let config = args(CliCommand::Watch).into_config(&keys).unwrap();
        assert_eq!(config.platform, Platform::Mac);
        assert!(config.strict);
        assert!(!config.alias_ctrl_to_cmd);
        assert_eq!(
            config.mappings,
            Some(MappingsSource::File(PathBuf::from(
                "/etc/shellflow/mappings.yaml"
            )))
        );
    }

    #[test]
    fn test_default_mappings_source_is_config_dir() {
        let config = args(CliCommand::Watch)
            .into_config(&KeysConfig::default())
            .unwrap();
        assert_eq!(
            config.mappings,
            crate::config_paths::config_dir().map(MappingsSource::Dir)
        );
    }

    #[test]
    fn test_cli_flags_override_keys_config() {
        let keys = KeysConfig {
            platform: Some(Platform::Mac),
            mappings_path: Some(PathBuf::from("a.yaml")),
            ..KeysConfig::default()
        };
        let cli = CliArgs {
            command: CliCommand::Check { path: None },
            file: Some(PathBuf::from("b.yaml")),
            platform: Some(PlatformArg::Other),
            strict: false,
        };
        let config = cli.into_config(&keys).unwrap();
        assert_eq!(config.platform, Platform::Other);
        assert_eq!(
            config.mappings,
            Some(MappingsSource::File(PathBuf::from("b.yaml")))
        );
    }
}
