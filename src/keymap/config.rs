//! Mapping documents: parsing, merging and validation
//!
//! A mapping document is a list of binding groups:
//!
//! ```yaml
//! bindings:
//!   - bindings:
//!       cmd-w: scratch::close
//!   - context: drawerFocused
//!     bindings:
//!       cmd-w: drawer::closeTab
//!       cmd-1: ["navigate::toEntity", 0]
//! ```
//!
//! JSON documents use the same shape. File loading lives in `defaults`;
//! this module only deals with text and values.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::action::{is_valid_action_id, validate_action_array, Action};
use super::context::ContextFlag;
use super::expr::{parse_context_expr, ContextExprError};
use super::types::normalize_key;

/// Root structure of a mapping document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMappings {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Binding groups, lowest precedence first
    pub bindings: Vec<RawBindingGroup>,
}

/// A binding group as written by the author
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBindingGroup {
    /// Guard expression (e.g. "drawerFocused && !pickerOpen"); absent means global
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Chord (any casing/separator style) to action
    pub bindings: BTreeMap<String, Action>,
}

impl RawBindingGroup {
    pub fn global<I, K>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (K, Action)>,
        K: Into<String>,
    {
        Self {
            context: None,
            bindings: bindings.into_iter().map(|(k, a)| (k.into(), a)).collect(),
        }
    }

    pub fn scoped<I, K>(context: &str, bindings: I) -> Self
    where
        I: IntoIterator<Item = (K, Action)>,
        K: Into<String>,
    {
        Self {
            context: Some(context.to_string()),
            ..Self::global(bindings)
        }
    }
}

/// Text format of a mapping document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingFormat {
    Json,
    Yaml,
}

impl MappingFormat {
    /// `.json` and `.jsonc` are JSON; everything else is treated as YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("jsonc") => {
                MappingFormat::Json
            }
            _ => MappingFormat::Yaml,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MappingFormat::Json => "JSON",
            MappingFormat::Yaml => "YAML",
        }
    }
}

/// Errors from loading or compiling mapping documents
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeymapError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("{format} parse error: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("bindings[{group}]: invalid context '{source_text}': {error}")]
    InvalidContext {
        group: usize,
        source_text: String,
        #[source]
        error: ContextExprError,
    },

    #[error("bindings[{group}].bindings[\"{chord}\"]: {message}")]
    InvalidAction {
        group: usize,
        chord: String,
        message: String,
    },

    #[error("bindings[{group}]: chord \"{chord}\" has no key")]
    InvalidChord { group: usize, chord: String },
}

/// Parse a mapping document into its typed form
pub fn parse_mappings(text: &str, format: MappingFormat) -> Result<RawMappings, KeymapError> {
    parse_document(text, format)
}

/// Parse a mapping document into an untyped value, for validation
pub fn parse_mappings_value(text: &str, format: MappingFormat) -> Result<Value, KeymapError> {
    parse_document(text, format)
}

/// JSON input may carry `//` and `/* */` comments, which are blanked out first
fn parse_document<T: DeserializeOwned>(text: &str, format: MappingFormat) -> Result<T, KeymapError> {
    let parse_error = |message: String| KeymapError::Parse {
        format: format.name(),
        message,
    };
    match format {
        MappingFormat::Json => {
            let mut json = text.to_string();
            json_strip_comments::strip(&mut json).map_err(|e| parse_error(e.to_string()))?;
            serde_json::from_str(&json).map_err(|e| parse_error(e.to_string()))
        }
        MappingFormat::Yaml => serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string())),
    }
}

/// Append user groups after the defaults so they take precedence
pub fn merge_mappings(defaults: RawMappings, user: Option<RawMappings>) -> RawMappings {
    let mut merged = defaults;
    if let Some(user) = user {
        merged.bindings.extend(user.bindings);
    }
    merged
}

/// Outcome of validating a mapping document
///
/// `errors` block compilation; `warnings` do not (unknown context flags
/// evaluate to false, duplicate chords keep one entry).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate mapping document text without compiling it
pub fn validate_mappings(text: &str, format: MappingFormat) -> ValidationReport {
    match parse_mappings_value(text, format) {
        Ok(value) => validate_mappings_value(&value),
        Err(e) => ValidationReport {
            valid: false,
            errors: vec![e.to_string()],
            warnings: Vec::new(),
        },
    }
}

/// Validate an untyped mapping document, one message per defect
pub fn validate_mappings_value(doc: &Value) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let Some(groups) = doc.get("bindings").and_then(Value::as_array) else {
        errors.push("missing top-level \"bindings\" array".to_string());
        return ValidationReport {
            valid: false,
            errors,
            warnings,
        };
    };

    for (i, group) in groups.iter().enumerate() {
        let Some(group) = group.as_object() else {
            errors.push(format!("bindings[{}]: group must be an object", i));
            continue;
        };

        match group.get("context") {
            None | Some(Value::Null) => {}
            Some(Value::String(source)) => match parse_context_expr(source) {
                Ok(expr) => {
                    for name in expr.identifiers() {
                        if name.parse::<ContextFlag>().is_err() {
                            warnings.push(format!(
                                "bindings[{}]: unknown context flag \"{}\" (always false)",
                                i, name
                            ));
                        }
                    }
                }
                Err(e) => errors.push(format!(
                    "bindings[{}]: invalid context \"{}\": {}",
                    i, source, e
                )),
            },
            Some(_) => errors.push(format!("bindings[{}]: \"context\" must be a string", i)),
        }

        let Some(map) = group.get("bindings").and_then(Value::as_object) else {
            errors.push(format!(
                "bindings[{}]: missing or non-object \"bindings\" map",
                i
            ));
            continue;
        };

        let mut seen: BTreeMap<String, &str> = BTreeMap::new();
        for (chord, action) in map {
            let normalized = normalize_key(chord);
            if normalized.is_empty() {
                errors.push(format!("bindings[{}]: chord \"{}\" has no key", i, chord));
                continue;
            }
            if let Some(previous) = seen.insert(normalized.clone(), chord) {
                warnings.push(format!(
                    "bindings[{}]: \"{}\" and \"{}\" are the same chord ({})",
                    i, previous, chord, normalized
                ));
            }

            let result = match action {
                Value::String(id) if is_valid_action_id(id) => Ok(()),
                Value::String(id) => Err(format!(
                    "invalid action '{}', expected namespace::name",
                    id
                )),
                Value::Array(values) => validate_action_array(values),
                other => Err(format!(
                    "action must be a string or array, found {}",
                    other
                )),
            };
            if let Err(message) = result {
                errors.push(format!("bindings[{}].bindings[\"{}\"]: {}", i, chord, message));
            }
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_document() {
        let json = r#"{
            "bindings": [
                {
                    "bindings": {
                        "cmd-w": "drawer::closeTab",
                        "cmd-1": ["navigate::toEntity", 0]
                    }
                }
            ]
        }"#;

        let mappings = parse_mappings(json, MappingFormat::Json).unwrap();
        let group = &mappings.bindings[0];
        assert_eq!(group.context, None);
        assert_eq!(
            group.bindings.get("cmd-w"),
            Some(&Action::simple("drawer::closeTab"))
        );
        assert_eq!(
            group.bindings.get("cmd-1"),
            Some(&Action::with_args("navigate::toEntity", [json!(0)]))
        );
    }

    #[test]
    fn test_parse_yaml_document() {
        let yaml = r#"
$schema: https://example.invalid/mappings.schema.json
bindings:
  - context: drawerFocused && !pickerOpen
    bindings:
      "cmd-w": drawer::closeTab
      "cmd-2": ["navigate::toEntity", 1]
"#;
        let mappings = parse_mappings(yaml, MappingFormat::Yaml).unwrap();
        assert!(mappings.schema.is_some());
        let group = &mappings.bindings[0];
        assert_eq!(group.context.as_deref(), Some("drawerFocused && !pickerOpen"));
        assert_eq!(
            group.bindings.get("cmd-2"),
            Some(&Action::with_args("navigate::toEntity", [json!(1)]))
        );
    }

    #[test]
    fn test_parse_error_reported() {
        let err = parse_mappings("{ not json", MappingFormat::Json).unwrap_err();
        assert!(matches!(err, KeymapError::Parse { format: "JSON", .. }));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            MappingFormat::from_path(Path::new("mappings.json")),
            MappingFormat::Json
        );
        assert_eq!(
            MappingFormat::from_path(Path::new("mappings.yaml")),
            MappingFormat::Yaml
        );
        assert_eq!(
            MappingFormat::from_path(Path::new("mappings")),
            MappingFormat::Yaml
        );
        assert_eq!(
            MappingFormat::from_path(Path::new("mappings.JSONC")),
            MappingFormat::Json
        );
    }

    const COMMENTED_JSON: &str = r#"{
        // Close the drawer tab before anything else
        "bindings": [
            {
                "context": "drawerFocused", /* only inside the drawer */
                "bindings": { "cmd-w": "drawer::closeTab" }
            }
        ]
    }"#;

    #[test]
    fn test_parse_json_with_comments() {
        let mappings = parse_mappings(COMMENTED_JSON, MappingFormat::Json).unwrap();
        assert_eq!(mappings.bindings[0].context.as_deref(), Some("drawerFocused"));

        let value = parse_mappings_value(COMMENTED_JSON, MappingFormat::Json).unwrap();
        assert_eq!(serde_json::from_value::<RawMappings>(value).unwrap(), mappings);
        assert!(validate_mappings(COMMENTED_JSON, MappingFormat::Json).valid);
    }

    #[test]
    fn test_merge_appends_user_groups() {
        let defaults = RawMappings {
            schema: None,
            bindings: vec![RawBindingGroup::global([(
                "cmd-w",
                Action::simple("default::action"),
            )])],
        };
        let user = RawMappings {
            schema: None,
            bindings: vec![RawBindingGroup::scoped(
                "drawerFocused",
                [("cmd-w", Action::simple("user::action"))],
            )],
        };

        let merged = merge_mappings(defaults, Some(user));
        assert_eq!(merged.bindings.len(), 2);
        assert_eq!(merged.bindings[1].context.as_deref(), Some("drawerFocused"));
    }

    #[test]
    fn test_validate_ok() {
        let doc = json!({
            "bindings": [
                { "bindings": { "cmd-w": "scratch::close" } },
                { "context": "drawerFocused", "bindings": { "cmd-1": ["navigate::toEntity", 0] } }
            ]
        });
        let report = validate_mappings_value(&doc);
        assert!(report.valid, "{:?}", report.errors);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_validate_missing_bindings_array() {
        let report = validate_mappings_value(&json!({ "groups": [] }));
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);

        let report = validate_mappings_value(&json!({ "bindings": {} }));
        assert!(!report.valid);
    }

    #[test]
    fn test_validate_non_object_group() {
        let report = validate_mappings_value(&json!({ "bindings": ["cmd-w"] }));
        assert!(!report.valid);
        assert!(report.errors[0].contains("bindings[0]"));
    }

    #[test]
    fn test_validate_non_string_context() {
        let report = validate_mappings_value(&json!({
            "bindings": [{ "context": 5, "bindings": {} }]
        }));
        assert!(!report.valid);
        assert!(report.errors[0].contains("context"));
    }

    #[test]
    fn test_validate_missing_inner_bindings() {
        let report = validate_mappings_value(&json!({ "bindings": [{ "context": "a" }] }));
        assert!(!report.valid);

        let report = validate_mappings_value(&json!({ "bindings": [{ "bindings": [] }] }));
        assert!(!report.valid);
    }

    #[test]
    fn test_validate_bad_actions() {
        let report = validate_mappings_value(&json!({
            "bindings": [{
                "bindings": {
                    "cmd-a": "notAnAction",
                    "cmd-b": [],
                    "cmd-c": [1, 2],
                    "cmd-d": 7
                }
            }]
        }));
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 4);
        assert!(report.errors.iter().any(|e| e.contains("\"cmd-b\"")));
    }

    #[test]
    fn test_validate_one_message_per_problem() {
        let report = validate_mappings_value(&json!({
            "bindings": [
                "oops",
                { "context": false, "bindings": { "cmd-w": "bad" } },
                { "bindings": 3 }
            ]
        }));
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 4, "{:?}", report.errors);
    }

    #[test]
    fn test_validate_context_syntax_error() {
        let report = validate_mappings_value(&json!({
            "bindings": [{ "context": "a @@ b", "bindings": {} }]
        }));
        assert!(!report.valid);
        assert!(report.errors[0].contains("'@'"));
    }

    #[test]
    fn test_validate_deeply_nested_context() {
        let context = format!("{}drawerFocused{}", "(".repeat(100_000), ")".repeat(100_000));
        let report = validate_mappings_value(&json!({
            "bindings": [{ "context": context, "bindings": {} }]
        }));
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("nested deeper"), "{:?}", report.errors);
    }

    #[test]
    fn test_validate_warns_on_unknown_flag() {
        let report = validate_mappings_value(&json!({
            "bindings": [{ "context": "drawerFocused && fancyNewFlag", "bindings": {} }]
        }));
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("fancyNewFlag"));
    }

    #[test]
    fn test_validate_warns_on_duplicate_chord() {
        let report = validate_mappings_value(&json!({
            "bindings": [{ "bindings": { "Cmd+W": "scratch::close", "cmd-w": "app::quit" } }]
        }));
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_validate_text_parse_failure() {
        let report = validate_mappings("bindings: [", MappingFormat::Yaml);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
    }
}
