//! Context-aware keyboard mapping engine
//!
//! This module provides a data-driven keybinding system that:
//! - Derives boolean context flags from a UI state snapshot
//! - Guards binding groups with boolean context expressions
//! - Resolves key chords against an ordered, override-based table
//! - Normalizes raw key presses across platforms (Cmd on macOS, Ctrl elsewhere)
//! - Dispatches the winning action to a handler table
//! - Loads user mapping files (YAML or JSON) on top of embedded defaults
//!
//! # Architecture
//!
//! ```text
//! ContextState → ContextSet ─┐
//! KeyEvent → Chord ──────────┼→ Keymap::resolve() → ResolvedBinding → Dispatcher → suppress?
//! mappings.yaml → Keymap ────┘
//! ```
//!
//! # Precedence
//!
//! Groups are scanned from last to first; a group whose context evaluates
//! false is skipped and the first group binding the chord wins. User groups
//! are appended after the defaults, so they shadow them.
//!
//! ```ignore
//! let keymap = load_mappings(Some(&path), false).keymap;
//! let contexts = derive_contexts(&state);
//! let suppress = dispatcher.handle_key_event(&event, &contexts, &keymap, Platform::current(), true);
//! ```

mod action;
mod binding;
mod config;
mod context;
mod defaults;
mod dispatch;
mod expr;
#[allow(clippy::module_inception)]
mod keymap;
mod reload;
mod shortcut;
mod types;

pub use action::{is_valid_action_id, Action, ActionId, Command, InvalidActionId};
pub use binding::{BindingGroup, ResolvedBinding};
pub use config::{
    merge_mappings, parse_mappings, parse_mappings_value, validate_mappings,
    validate_mappings_value, KeymapError, MappingFormat, RawBindingGroup, RawMappings,
    ValidationReport,
};
pub use context::{
    derive_contexts, ContextFlag, ContextLookup, ContextSet, ContextState, FocusTarget,
    SessionKind,
};
pub use defaults::{
    default_keymap, default_mappings, load_mappings, load_mappings_file, mappings_watch_paths,
    merged_mappings, MappingsError, MappingsResult, MappingsSource, DEFAULT_MAPPINGS,
    DEFAULT_MAPPINGS_NAME,
};
pub use dispatch::{DispatchOutcome, Dispatcher, HandlerResult};
pub use expr::{
    context_identifiers, evaluate_context_expr, parse_context_expr, CompiledContext, ContextExpr,
    ContextExprError, MAX_EXPR_DEPTH,
};
pub use keymap::Keymap;
pub use reload::{MappingsWatcher, SharedKeymap};
pub use shortcut::Shortcut;
pub use types::{
    format_chord, key_event_to_string, normalize_key, Chord, KeyEvent, Modifiers, Platform,
};
