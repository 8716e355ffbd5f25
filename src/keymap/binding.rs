//! Compiled binding groups and resolution results

use std::collections::HashMap;

use serde_json::Value;

use super::action::Action;
use super::config::{KeymapError, RawBindingGroup};
use super::context::ContextLookup;
use super::expr::CompiledContext;
use super::types::normalize_key;

/// A binding group with its guard compiled and its chords normalized
#[derive(Debug, Clone, PartialEq)]
pub struct BindingGroup {
    /// `None` means the group is always active
    pub context: Option<CompiledContext>,
    /// Canonical chord to action; each chord at most once
    pub bindings: HashMap<String, Action>,
}

impl BindingGroup {
    /// Compile a raw group; `index` is its position, used in error messages
    pub fn compile(raw: &RawBindingGroup, index: usize) -> Result<Self, KeymapError> {
        let context = match raw.context.as_deref() {
            Some(source) => Some(CompiledContext::compile(source).map_err(|error| {
                KeymapError::InvalidContext {
                    group: index,
                    source_text: source.to_string(),
                    error,
                }
            })?),
            None => None,
        };

        let mut bindings = HashMap::with_capacity(raw.bindings.len());
        for (chord, action) in &raw.bindings {
            let normalized = normalize_key(chord);
            if normalized.is_empty() {
                return Err(KeymapError::InvalidChord {
                    group: index,
                    chord: chord.clone(),
                });
            }
            action
                .validate()
                .map_err(|message| KeymapError::InvalidAction {
                    group: index,
                    chord: chord.clone(),
                    message,
                })?;
            bindings.insert(normalized, action.clone());
        }

        Ok(Self { context, bindings })
    }

    pub fn is_global(&self) -> bool {
        self.context.is_none()
    }

    /// Whether the guard (if any) holds for the active contexts
    pub fn is_active<C: ContextLookup + ?Sized>(&self, contexts: &C) -> bool {
        self.context
            .as_ref()
            .map_or(true, |context| context.evaluate(contexts))
    }

    pub fn context_source(&self) -> Option<&str> {
        self.context.as_ref().map(CompiledContext::source)
    }

    /// Look up a canonical chord in this group
    pub fn get(&self, chord: &str) -> Option<ResolvedBinding> {
        let action = self.bindings.get(chord)?;
        ResolvedBinding::new(action, self.context_source())
    }

    /// A chord in this group bound to `action_id`, smallest first when several are
    pub fn chord_for(&self, action_id: &str) -> Option<&str> {
        self.bindings
            .iter()
            .filter(|(_, action)| action.action_id() == Some(action_id))
            .map(|(chord, _)| chord.as_str())
            .min()
    }
}

/// The winning binding for a chord, produced per key event
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBinding {
    pub action: Action,
    pub action_id: String,
    pub args: Vec<Value>,
    /// Source text of the guard of the group that matched
    pub context: Option<String>,
}

impl ResolvedBinding {
    pub fn new(action: &Action, context: Option<&str>) -> Option<Self> {
        let (action_id, args) = action.destructure()?;
        Some(Self {
            action_id: action_id.to_string(),
            args: args.to_vec(),
            action: action.clone(),
            context: context.map(str::to_string),
        })
    }
}
