//! Shellflow keys - context-aware keybinding resolution
//!
//! This crate provides the keybinding engine of a multi-pane terminal
//! workspace: context flags derived from UI state, guard expressions over
//! them, an ordered override-based mapping table, and cross-platform key
//! normalization feeding an action dispatcher.

pub mod cli;
pub mod config;
pub mod config_paths;
pub mod keymap;
pub mod tracing;

// Re-export commonly used types
pub use config::KeysConfig;
pub use keymap::{Dispatcher, KeyEvent, Keymap, Platform, ResolvedBinding};
