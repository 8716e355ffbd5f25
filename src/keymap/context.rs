//! Context system for conditional keybindings
//!
//! A [`ContextState`] is an immutable snapshot of the host UI, taken on every
//! state change. [`derive_contexts`] turns it into the set of active
//! [`ContextFlag`]s that binding-group guards are evaluated against.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::str::FromStr;

/// Kind of session shown in the main area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Scratch,
    Worktree,
    Project,
}

/// Which panel owns keyboard focus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FocusTarget {
    #[default]
    Main,
    Drawer,
}

/// Snapshot of host UI state, read once per context recomputation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextState {
    /// Explicit session kind; when set it replaces the legacy signals entirely
    pub active_session_kind: Option<SessionKind>,
    /// Legacy signal: a scratch terminal is selected
    pub active_scratch: bool,
    /// Legacy signal: a worktree is selected
    pub active_worktree: bool,
    /// Legacy signal: a project is selected
    pub active_project: bool,
    pub focus_target: FocusTarget,
    pub drawer_open: bool,
    pub right_panel_open: bool,
    pub command_palette_open: bool,
    pub task_switcher_open: bool,
    pub project_switcher_open: bool,
    /// A modal or confirmation dialog is pending
    pub modal_open: bool,
    pub open_entity_count: usize,
    /// Backward navigation history is non-empty
    pub can_go_back: bool,
    pub diff_view_open: bool,
    /// The active tab has split panes
    pub has_split_panes: bool,
}

impl ContextState {
    /// Resolved session kind: explicit kind first, then legacy signals
    /// from most to least specific
    pub fn session_kind(&self) -> Option<SessionKind> {
        if let Some(kind) = self.active_session_kind {
            return Some(kind);
        }
        if self.active_scratch {
            Some(SessionKind::Scratch)
        } else if self.active_worktree {
            Some(SessionKind::Worktree)
        } else if self.active_project {
            Some(SessionKind::Project)
        } else {
            None
        }
    }

    pub fn contexts(&self) -> ContextSet {
        derive_contexts(self)
    }
}

macro_rules! context_flags {
    ($($(#[$meta:meta])* $variant:ident => $name:literal,)+) => {
        /// Closed vocabulary of context flags usable in guard expressions
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ContextFlag {
            $($(#[$meta])* $variant,)+
        }

        impl ContextFlag {
            /// Every known flag, in declaration order
            pub const ALL: &'static [ContextFlag] = &[$(ContextFlag::$variant,)+];

            /// Name as written in context expressions
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(ContextFlag::$variant => $name,)+
                }
            }
        }

        impl FromStr for ContextFlag {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(ContextFlag::$variant),)+
                    _ => Err(()),
                }
            }
        }
    };
}

context_flags! {
    // View focus (exactly one, or none)
    ScratchFocused => "scratchFocused",
    WorktreeFocused => "worktreeFocused",
    ProjectFocused => "projectFocused",

    // Panel focus
    MainFocused => "mainFocused",
    /// Drawer is open and owns focus
    DrawerFocused => "drawerFocused",
    DrawerOpen => "drawerOpen",
    RightPanelOpen => "rightPanelOpen",

    // Pickers
    CommandPaletteOpen => "commandPaletteOpen",
    TaskSwitcherOpen => "taskSwitcherOpen",
    ProjectSwitcherOpen => "projectSwitcherOpen",
    /// Any of the pickers is open
    PickerOpen => "pickerOpen",

    ModalOpen => "modalOpen",
    /// More than one entity is open
    HasMultipleEntities => "hasMultipleEntities",
    CanGoBack => "canGoBack",
    DiffViewOpen => "diffViewOpen",
    HasSplits => "hasSplits",
}

impl fmt::Display for ContextFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything a context expression can be evaluated against
///
/// Names that are not present evaluate to `false`; that includes names
/// outside the [`ContextFlag`] vocabulary.
pub trait ContextLookup {
    fn is_active(&self, name: &str) -> bool;
}

/// The set of flags that are true right now
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSet(HashSet<ContextFlag>);

impl ContextSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, flag: ContextFlag) -> Self {
        self.0.insert(flag);
        self
    }

    pub fn insert(&mut self, flag: ContextFlag) {
        self.0.insert(flag);
    }

    pub fn contains(&self, flag: ContextFlag) -> bool {
        self.0.contains(&flag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Active flags in declaration order
    pub fn flags(&self) -> Vec<ContextFlag> {
        let mut flags: Vec<_> = self.0.iter().copied().collect();
        flags.sort();
        flags
    }

    /// Parse flag names, returning the set and the names that were not recognized
    pub fn from_names<I, S>(names: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        let mut unknown = Vec::new();
        for name in names {
            match name.as_ref().parse::<ContextFlag>() {
                Ok(flag) => set.insert(flag),
                Err(()) => unknown.push(name.as_ref().to_string()),
            }
        }
        (set, unknown)
    }
}

impl FromIterator<ContextFlag> for ContextSet {
    fn from_iter<T: IntoIterator<Item = ContextFlag>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&ContextState> for ContextSet {
    fn from(state: &ContextState) -> Self {
        derive_contexts(state)
    }
}

impl ContextLookup for ContextSet {
    fn is_active(&self, name: &str) -> bool {
        match name.parse::<ContextFlag>() {
            Ok(flag) => self.contains(flag),
            Err(()) => {
                tracing::trace!(flag = name, "Unknown context flag evaluates to false");
                false
            }
        }
    }
}

impl<S, H> ContextLookup for HashSet<S, H>
where
    S: Borrow<str> + Eq + Hash,
    H: BuildHasher,
{
    fn is_active(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<S: AsRef<str>> ContextLookup for [S] {
    fn is_active(&self, name: &str) -> bool {
        self.iter().any(|s| s.as_ref() == name)
    }
}

impl<S: AsRef<str>> ContextLookup for Vec<S> {
    fn is_active(&self, name: &str) -> bool {
        self.as_slice().is_active(name)
    }
}

/// Derive the active flag set from a UI snapshot
///
/// Pure: the same snapshot always yields the same set.
pub fn derive_contexts(state: &ContextState) -> ContextSet {
    let mut set = ContextSet::new();

    match state.session_kind() {
        Some(SessionKind::Scratch) => set.insert(ContextFlag::ScratchFocused),
        Some(SessionKind::Worktree) => set.insert(ContextFlag::WorktreeFocused),
        Some(SessionKind::Project) => set.insert(ContextFlag::ProjectFocused),
        None => {}
    }

    let drawer_focused = state.drawer_open && state.focus_target == FocusTarget::Drawer;
    if drawer_focused {
        set.insert(ContextFlag::DrawerFocused);
    } else {
        set.insert(ContextFlag::MainFocused);
    }
    if state.drawer_open {
        set.insert(ContextFlag::DrawerOpen);
    }
    if state.right_panel_open {
        set.insert(ContextFlag::RightPanelOpen);
    }

    if state.command_palette_open {
        set.insert(ContextFlag::CommandPaletteOpen);
    }
    if state.task_switcher_open {
        set.insert(ContextFlag::TaskSwitcherOpen);
    }
    if state.project_switcher_open {
        set.insert(ContextFlag::ProjectSwitcherOpen);
    }
    if state.command_palette_open || state.task_switcher_open || state.project_switcher_open {
        set.insert(ContextFlag::PickerOpen);
    }

    if state.modal_open {
        set.insert(ContextFlag::ModalOpen);
    }
    if state.open_entity_count > 1 {
        set.insert(ContextFlag::HasMultipleEntities);
    }
    if state.can_go_back {
        set.insert(ContextFlag::CanGoBack);
    }
    if state.diff_view_open {
        set.insert(ContextFlag::DiffViewOpen);
    }
    if state.has_split_panes {
        set.insert(ContextFlag::HasSplits);
    }

    set
}
