//! Keymap: the compiled, ordered binding table and its lookups

use std::collections::BTreeMap;

use super::binding::{BindingGroup, ResolvedBinding};
use super::config::{parse_mappings, KeymapError, MappingFormat, RawMappings};
use super::context::ContextLookup;
use super::types::{normalize_key, Chord, KeyEvent, Platform};

/// An ordered list of compiled binding groups
///
/// Later groups take precedence over earlier ones when both guards hold.
/// The table is read-only once built; reloads build a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keymap {
    groups: Vec<BindingGroup>,
}

impl Keymap {
    /// Create an empty keymap
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_groups(groups: Vec<BindingGroup>) -> Self {
        Self { groups }
    }

    /// Compile every group, failing on the first broken one
    pub fn from_raw(raw: &RawMappings) -> Result<Self, KeymapError> {
        let groups = raw
            .bindings
            .iter()
            .enumerate()
            .map(|(i, group)| BindingGroup::compile(group, i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { groups })
    }

    /// Compile what can be compiled, returning the errors for skipped groups
    pub fn from_raw_lenient(raw: &RawMappings) -> (Self, Vec<KeymapError>) {
        let mut groups = Vec::with_capacity(raw.bindings.len());
        let mut errors = Vec::new();
        for (i, group) in raw.bindings.iter().enumerate() {
            match BindingGroup::compile(group, i) {
                Ok(compiled) => groups.push(compiled),
                Err(e) => {
                    tracing::warn!("Skipping binding group: {}", e);
                    errors.push(e);
                }
            }
        }
        (Self { groups }, errors)
    }

    /// Parse and compile a mapping document
    pub fn parse(text: &str, format: MappingFormat) -> Result<Self, KeymapError> {
        Self::from_raw(&parse_mappings(text, format)?)
    }

    /// Append another table's groups; they take precedence over ours
    pub fn extend(&mut self, other: Keymap) {
        self.groups.extend(other.groups);
    }

    /// Concatenate tables in argument order, later ones winning
    pub fn merge(keymaps: impl IntoIterator<Item = Keymap>) -> Keymap {
        let mut merged = Keymap::new();
        for keymap in keymaps {
            merged.extend(keymap);
        }
        merged
    }

    pub fn push_group(&mut self, group: BindingGroup) {
        self.groups.push(group);
    }

    pub fn groups(&self) -> &[BindingGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Find the action bound to `chord` under the active contexts
    ///
    /// Groups are scanned from last to first; groups whose guard fails are
    /// skipped; the first group that binds the chord wins.
    pub fn resolve<C: ContextLookup + ?Sized>(
        &self,
        chord: &str,
        contexts: &C,
    ) -> Option<ResolvedBinding> {
        let chord = normalize_key(chord);
        if chord.is_empty() {
            return None;
        }
        self.resolve_normalized(&chord, contexts)
    }

    fn resolve_normalized<C: ContextLookup + ?Sized>(
        &self,
        chord: &str,
        contexts: &C,
    ) -> Option<ResolvedBinding> {
        let resolved = self
            .groups
            .iter()
            .rev()
            .filter(|group| group.is_active(contexts))
            .find_map(|group| group.get(chord));

        match &resolved {
            Some(binding) => tracing::trace!(
                chord,
                action = %binding.action_id,
                context = binding.context.as_deref().unwrap_or("-"),
                "Resolved binding"
            ),
            None => tracing::trace!(chord, "No binding"),
        }
        resolved
    }

    /// Resolve with the non-Apple secondary pass
    ///
    /// Off macOS, when `chord` has no direct match and contains `ctrl`, the
    /// same chord with `ctrl` replaced by `cmd` is tried. The reverse alias
    /// never applies.
    pub fn resolve_for_platform<C: ContextLookup + ?Sized>(
        &self,
        chord: &str,
        contexts: &C,
        platform: Platform,
        alias_ctrl_to_cmd: bool,
    ) -> Option<ResolvedBinding> {
        let parsed = Chord::parse(chord);
        if parsed.is_empty() {
            return None;
        }
        let canonical = parsed.to_string();
        if let Some(found) = self.resolve_normalized(&canonical, contexts) {
            return Some(found);
        }

        if platform.is_mac() || !alias_ctrl_to_cmd {
            return None;
        }
        let aliased = parsed.ctrl_as_cmd()?.to_string();
        tracing::trace!(from = %canonical, to = %aliased, "Trying ctrl→cmd alias");
        self.resolve_normalized(&aliased, contexts)
    }

    /// Normalize a live key press and resolve it
    ///
    /// Modifier-only presses never resolve.
    pub fn resolve_event<C: ContextLookup + ?Sized>(
        &self,
        event: &KeyEvent,
        contexts: &C,
        platform: Platform,
        alias_ctrl_to_cmd: bool,
    ) -> Option<ResolvedBinding> {
        let chord = event.to_chord()?.to_string();
        self.resolve_for_platform(&chord, contexts, platform, alias_ctrl_to_cmd)
    }

    /// Every chord bound under the active contexts, with its winning action
    ///
    /// Agrees with [`Keymap::resolve`] for every chord.
    pub fn active_bindings<C: ContextLookup + ?Sized>(
        &self,
        contexts: &C,
    ) -> BTreeMap<String, ResolvedBinding> {
        let mut active = BTreeMap::new();
        for group in self.groups.iter().filter(|g| g.is_active(contexts)) {
            for chord in group.bindings.keys() {
                if let Some(resolved) = group.get(chord) {
                    active.insert(chord.clone(), resolved);
                }
            }
        }
        active
    }

    /// Chord to show for an action in menus and hints
    ///
    /// Prefers the earliest global binding; falls back to the earliest
    /// context-scoped one. Scans in declaration order, unlike resolution.
    pub fn binding_for(&self, action_id: &str) -> Option<&str> {
        self.groups
            .iter()
            .filter(|g| g.is_global())
            .find_map(|g| g.chord_for(action_id))
            .or_else(|| {
                self.groups
                    .iter()
                    .filter(|g| !g.is_global())
                    .find_map(|g| g.chord_for(action_id))
            })
    }

    /// Display label for an action's chord
    pub fn display_for(&self, action_id: &str, platform: Platform) -> Option<String> {
        self.binding_for(action_id)
            .map(|chord| Chord::parse(chord).display_string(platform))
    }
}
