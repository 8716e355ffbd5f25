//! Default mappings and layered loading
//!
//! The shipped table is `mappings.yaml` at the crate root, embedded at
//! compile time. A user file is appended after it, so user groups win
//! whenever their guard holds.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config_paths;

use super::binding::BindingGroup;
use super::config::{
    merge_mappings, parse_mappings, parse_mappings_value, validate_mappings_value, KeymapError,
    MappingFormat, RawBindingGroup, RawMappings,
};
use super::keymap::Keymap;

/// Default mapping document embedded at compile time
pub const DEFAULT_MAPPINGS: &str = include_str!("../../mappings.yaml");

/// Label used for the embedded document in error reports
pub const DEFAULT_MAPPINGS_NAME: &str = "<default mappings>";

/// A problem with one mapping file, reported without aborting the load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingsError {
    pub file: String,
    pub message: String,
}

impl std::fmt::Display for MappingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}

/// Outcome of a layered load: the table that took effect and what went wrong
#[derive(Debug, Clone, Default)]
pub struct MappingsResult {
    pub keymap: Keymap,
    pub errors: Vec<MappingsError>,
}

impl MappingsResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse the embedded defaults
///
/// Falls back to an empty document if they fail to parse; a test guards
/// against that ever shipping.
pub fn default_mappings() -> RawMappings {
    match parse_mappings(DEFAULT_MAPPINGS, MappingFormat::Yaml) {
        Ok(mappings) => mappings,
        Err(e) => {
            tracing::warn!("Failed to parse {}: {}", DEFAULT_MAPPINGS_NAME, e);
            RawMappings::default()
        }
    }
}

/// Compiled embedded defaults
pub fn default_keymap() -> Keymap {
    let (keymap, errors) = compile_defaults();
    for e in &errors {
        tracing::warn!("Invalid default binding group: {}", e);
    }
    keymap
}

/// Compile the embedded defaults, labelling every problem with
/// [`DEFAULT_MAPPINGS_NAME`]
fn compile_defaults() -> (Keymap, Vec<MappingsError>) {
    let error = |message: String| MappingsError {
        file: DEFAULT_MAPPINGS_NAME.to_string(),
        message,
    };
    match parse_mappings(DEFAULT_MAPPINGS, MappingFormat::Yaml) {
        Ok(raw) => {
            let (keymap, errors) = Keymap::from_raw_lenient(&raw);
            let errors = errors.into_iter().map(|e| error(e.to_string())).collect();
            (keymap, errors)
        }
        Err(e) => (Keymap::new(), vec![error(e.to_string())]),
    }
}

/// Read and parse a mapping file; the format follows the file extension
pub fn load_mappings_file(path: &Path) -> Result<RawMappings, KeymapError> {
    let text = read_mappings_text(path)?;
    parse_mappings(&text, MappingFormat::from_path(path))
}

fn read_mappings_text(path: &Path) -> Result<String, KeymapError> {
    std::fs::read_to_string(path).map_err(|e| KeymapError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Load defaults plus the optional user file
///
/// Never fails. A missing user file is not an error. A user file that can't
/// be read or parsed is skipped entirely. Otherwise, in strict mode any
/// invalid group rejects the whole file; in lenient mode only the invalid
/// groups are dropped.
pub fn load_mappings(user_path: Option<&Path>, strict: bool) -> MappingsResult {
    let (keymap, errors) = compile_defaults();
    let mut result = MappingsResult { keymap, errors };
    tracing::info!(
        "Loaded default mappings ({} groups)",
        result.keymap.len()
    );

    let Some(path) = user_path else {
        return result;
    };
    if !path.exists() {
        tracing::debug!("No user mappings at {}", path.display());
        return result;
    }

    let file = path.display().to_string();
    let (user, errors) = load_user_keymap(path, strict);
    result
        .errors
        .extend(errors.into_iter().map(|message| MappingsError {
            file: file.clone(),
            message,
        }));

    match user {
        Some(user) => {
            tracing::info!("Merging user mappings from {} ({} groups)", file, user.len());
            result.keymap.extend(user);
        }
        None => tracing::warn!("Ignoring user mappings from {}", file),
    }
    result
}

/// Compile a user file, returning the usable part and every error message
fn load_user_keymap(path: &Path, strict: bool) -> (Option<Keymap>, Vec<String>) {
    let text = match read_mappings_text(path) {
        Ok(text) => text,
        Err(e) => return (None, vec![e.to_string()]),
    };
    let doc = match parse_mappings_value(&text, MappingFormat::from_path(path)) {
        Ok(doc) => doc,
        Err(e) => return (None, vec![e.to_string()]),
    };

    let report = validate_mappings_value(&doc);
    for warning in &report.warnings {
        tracing::warn!("{}: {}", path.display(), warning);
    }
    let mut errors = report.errors;

    if strict {
        if !errors.is_empty() {
            return (None, errors);
        }
        let compiled = serde_json::from_value::<RawMappings>(doc)
            .map_err(|e| e.to_string())
            .and_then(|raw| Keymap::from_raw(&raw).map_err(|e| e.to_string()));
        return match compiled {
            Ok(keymap) => (Some(keymap), errors),
            Err(e) => (None, vec![e]),
        };
    }

    // The validator has already described every defect; only report compile
    // failures it missed.
    let report_compile_errors = errors.is_empty();
    let mut keymap = Keymap::new();
    let groups = doc.get("bindings").and_then(Value::as_array);
    for (i, group) in groups.into_iter().flatten().enumerate() {
        let compiled = serde_json::from_value::<RawBindingGroup>(group.clone())
            .map_err(|e| format!("bindings[{}]: {}", i, e))
            .and_then(|raw| BindingGroup::compile(&raw, i).map_err(|e| e.to_string()));
        match compiled {
            Ok(group) => keymap.push_group(group),
            Err(e) => {
                tracing::debug!("Skipping user binding group {}: {}", i, e);
                if report_compile_errors {
                    errors.push(e);
                }
            }
        }
    }
    (Some(keymap), errors)
}

/// Defaults merged with a user document, as a single raw document
///
/// Useful for exporting the effective table.
pub fn merged_mappings(user: Option<RawMappings>) -> RawMappings {
    merge_mappings(default_mappings(), user)
}

/// Where the user mapping file comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingsSource {
    /// An explicitly named file; nothing else is ever loaded
    File(PathBuf),
    /// A config directory, searched again on every load so that a file
    /// created after startup is picked up
    Dir(PathBuf),
}

impl MappingsSource {
    /// The file a load would read right now
    pub fn path(&self) -> PathBuf {
        match self {
            MappingsSource::File(path) => path.clone(),
            MappingsSource::Dir(dir) => config_paths::mappings_file_in(dir),
        }
    }

    /// Defaults plus whatever file this source currently points at
    pub fn load(&self, strict: bool) -> MappingsResult {
        load_mappings(Some(&self.path()), strict)
    }
}

/// Files whose change should trigger a reload
///
/// Exactly the files [`MappingsSource::path`] can ever return.
pub fn mappings_watch_paths(source: &MappingsSource) -> Vec<PathBuf> {
    match source {
        MappingsSource::File(path) => vec![path.clone()],
        MappingsSource::Dir(dir) => config_paths::MAPPINGS_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .collect(),
    }
}
