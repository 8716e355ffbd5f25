//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use shellflow_keys::keymap::{
    derive_contexts, ContextSet, ContextState, FocusTarget, Keymap, MappingFormat, SessionKind,
};

/// Compile a YAML mapping document, panicking on error
pub fn keymap_from_yaml(yaml: &str) -> Keymap {
    Keymap::parse(yaml, MappingFormat::Yaml).expect("test mappings should compile")
}

/// Contexts for a focused worktree with the drawer closed
pub fn worktree_contexts() -> ContextSet {
    derive_contexts(&ContextState {
        active_session_kind: Some(SessionKind::Worktree),
        open_entity_count: 3,
        ..Default::default()
    })
}

/// Contexts for a worktree with the drawer open and focused
pub fn drawer_contexts() -> ContextSet {
    derive_contexts(&ContextState {
        active_session_kind: Some(SessionKind::Worktree),
        drawer_open: true,
        focus_target: FocusTarget::Drawer,
        open_entity_count: 3,
        ..Default::default()
    })
}

/// A temp dir holding `name` with `contents`
pub struct TempMappings {
    pub dir: tempfile::TempDir,
    pub path: PathBuf,
}

impl TempMappings {
    pub fn new(name: &str, contents: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create mappings file");
        file.write_all(contents.as_bytes()).expect("write mappings file");
        Self { dir, path }
    }
}
