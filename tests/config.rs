//! Configuration system tests
//!
//! Tests for config paths, engine config, and mapping loading/merging.

mod common;

use std::path::Path;

use common::{worktree_contexts, TempMappings};
use shellflow_keys::config::KeysConfig;
use shellflow_keys::config_paths;
use shellflow_keys::keymap::{
    default_keymap, load_mappings, load_mappings_file, mappings_watch_paths, MappingFormat,
    MappingsSource, Platform,
};

// ========================================================================
// Config Paths Tests
// ========================================================================

#[test]
fn test_config_dir_contains_shellflow() {
    if let Some(dir) = config_paths::config_dir() {
        assert!(dir.ends_with("shellflow"), "got: {}", dir.display());
    }
}

#[test]
fn test_mappings_file_ends_with_yaml_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = config_paths::mappings_file_in(dir.path());
    assert!(path.ends_with("mappings.yaml"));
}

#[test]
fn test_mappings_file_falls_back_to_json() {
    let mappings = TempMappings::new("mappings.json", r#"{"bindings": []}"#);
    let path = config_paths::mappings_file_in(mappings.dir.path());
    assert_eq!(path, mappings.path);
    assert_eq!(MappingFormat::from_path(&path), MappingFormat::Json);
}

#[test]
fn test_mappings_file_finds_jsonc() {
    let mappings = TempMappings::new("mappings.jsonc", "// empty\n{\"bindings\": []}\n");
    std::fs::write(mappings.dir.path().join("mappings.json"), r#"{"bindings": []}"#).unwrap();
    let path = config_paths::mappings_file_in(mappings.dir.path());
    assert_eq!(path, mappings.path);
    assert!(load_mappings_file(&path).unwrap().bindings.is_empty());
}

#[test]
fn test_mappings_file_prefers_yaml() {
    let mappings = TempMappings::new("mappings.json", r#"{"bindings": []}"#);
    std::fs::write(mappings.dir.path().join("mappings.yaml"), "bindings: []\n").unwrap();
    let path = config_paths::mappings_file_in(mappings.dir.path());
    assert!(path.ends_with("mappings.yaml"));
}

#[test]
fn test_logs_dir_is_subdir_of_config() {
    if let (Some(config), Some(logs)) = (config_paths::config_dir(), config_paths::logs_dir()) {
        assert!(logs.starts_with(&config));
    }
}

#[test]
fn test_keys_file_ends_with_yaml() {
    if let Some(path) = config_paths::keys_file() {
        assert!(path.ends_with("keys.yaml"));
    }
}

// ========================================================================
// Keys Config Tests
// ========================================================================

#[test]
fn test_keys_config_defaults() {
    let config = KeysConfig::default();
    assert_eq!(config.platform, None);
    assert!(config.alias_ctrl_to_cmd);
    assert!(!config.strict);
    assert_eq!(config.mappings_path, None);
}

#[test]
fn test_keys_config_partial_yaml() {
    let config: KeysConfig = serde_yaml::from_str("platform: other\nstrict: true\n").unwrap();
    assert_eq!(config.platform, Some(Platform::Other));
    assert!(config.strict);
    assert!(config.alias_ctrl_to_cmd);
}

#[test]
fn test_keys_config_missing_file_uses_defaults() {
    let config = KeysConfig::load_from(Path::new("/nonexistent/shellflow/keys.yaml"));
    assert_eq!(config, KeysConfig::default());
}

#[test]
fn test_keys_config_invalid_yaml_uses_defaults() {
    let file = TempMappings::new("keys.yaml", "platform: [not, a, platform]\n");
    assert_eq!(KeysConfig::load_from(&file.path), KeysConfig::default());
}

#[test]
fn test_keys_config_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("keys.yaml");
    let config = KeysConfig {
        platform: Some(Platform::Mac),
        alias_ctrl_to_cmd: false,
        strict: true,
        mappings_path: Some(dir.path().join("custom.json")),
    };

    config.save_to(&path).unwrap();
    assert_eq!(KeysConfig::load_from(&path), config);
}

#[test]
fn test_keys_config_platform_fallback() {
    let config = KeysConfig::default();
    assert_eq!(config.platform(), Platform::current());

    let config = KeysConfig {
        platform: Some(Platform::Other),
        ..KeysConfig::default()
    };
    assert_eq!(config.platform(), Platform::Other);
}

#[test]
fn test_keys_config_mappings_path_expands_home() {
    let config: KeysConfig =
        serde_yaml::from_str("mappings_path: ~/dotfiles/mappings.yaml").unwrap();
    let path = config.mappings_path().unwrap();
    if let Some(home) = dirs::home_dir() {
        assert_eq!(path, home.join("dotfiles/mappings.yaml"));
    }

    let config = KeysConfig {
        mappings_path: Some("/etc/shellflow/mappings.yaml".into()),
        ..KeysConfig::default()
    };
    assert_eq!(
        config.mappings_path(),
        Some(Path::new("/etc/shellflow/mappings.yaml").to_path_buf())
    );
}

// ========================================================================
// Mapping Loading Tests
// ========================================================================

#[test]
fn test_load_mappings_file_yaml_and_json() {
    let yaml = TempMappings::new(
        "mappings.yaml",
        "bindings:\n  - bindings:\n      cmd-w: app::quit\n",
    );
    let raw = load_mappings_file(&yaml.path).unwrap();
    assert_eq!(raw.bindings.len(), 1);

    let json = TempMappings::new(
        "mappings.json",
        r#"{"$schema": "schema.json", "bindings": [{"bindings": {"cmd-w": "app::quit"}}]}"#,
    );
    let raw = load_mappings_file(&json.path).unwrap();
    assert_eq!(raw.schema.as_deref(), Some("schema.json"));
}

#[test]
fn test_load_mappings_file_missing() {
    assert!(load_mappings_file(Path::new("/nonexistent/mappings.yaml")).is_err());
}

#[test]
fn test_user_mappings_override_defaults() {
    let user = TempMappings::new(
        "mappings.yaml",
        "bindings:\n  - context: worktreeFocused\n    bindings:\n      cmd-w: app::quit\n",
    );
    let result = load_mappings(Some(&user.path), false);
    assert!(result.errors.is_empty(), "{:?}", result.errors);

    let hit = result.keymap.resolve("cmd-w", &worktree_contexts()).unwrap();
    assert_eq!(hit.action_id, "app::quit");

    // Other defaults still in force
    let hit = result.keymap.resolve("cmd-k", &worktree_contexts()).unwrap();
    assert_eq!(hit.action_id, "switcher::tasks");
}

#[test]
fn test_invalid_user_mappings_report_file() {
    let user = TempMappings::new(
        "mappings.yaml",
        "bindings:\n  - bindings:\n      cmd-w: notAnAction\n",
    );
    let result = load_mappings(Some(&user.path), false);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].file, user.path.display().to_string());
    assert_eq!(result.keymap, default_keymap());
}

#[test]
fn test_strict_and_lenient_loading() {
    let user = TempMappings::new(
        "mappings.yaml",
        "\
bindings:
  - bindings:
      cmd-shift-w: app::quit
  - context: \"(drawerFocused\"
    bindings:
      cmd-w: app::quit
",
    );

    let lenient = load_mappings(Some(&user.path), false);
    assert_eq!(lenient.errors.len(), 1);
    assert_eq!(lenient.keymap.len(), default_keymap().len() + 1);

    let strict = load_mappings(Some(&user.path), true);
    assert_eq!(strict.errors.len(), 1);
    assert_eq!(strict.keymap.len(), default_keymap().len());
}

#[test]
fn test_watch_paths_cover_every_candidate() {
    let source = MappingsSource::Dir(Path::new("/cfg/shellflow").to_path_buf());
    let paths = mappings_watch_paths(&source);
    assert_eq!(paths.len(), config_paths::MAPPINGS_FILE_NAMES.len());
    assert!(paths.iter().any(|p| p.ends_with("mappings.jsonc")));
    assert!(paths.iter().any(|p| p.ends_with("mappings.json")));
}

#[test]
fn test_watched_json_file_is_loaded() {
    let mappings = TempMappings::new(
        "mappings.json",
        r#"{"bindings": [{"bindings": {"cmd-alt-z": "app::quit"}}]}"#,
    );
    let source = MappingsSource::Dir(mappings.dir.path().to_path_buf());
    assert!(mappings_watch_paths(&source).contains(&mappings.path));

    let result = source.load(false);
    let hit = result.keymap.resolve("cmd-alt-z", &worktree_contexts()).unwrap();
    assert_eq!(hit.action_id, "app::quit");
}
