//! Actions: what a binding fires
//!
//! A mapping file names actions as `namespace::name` strings, optionally
//! with literal arguments (`["navigate::toEntity", 0]`). Built-in actions
//! form the closed [`Command`] enum; anything else is carried as a validated
//! [`ActionId`] and only resolved against handlers at run time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Check the `namespace::name` shape: lowercase ASCII namespace, alphanumeric name
pub fn is_valid_action_id(s: &str) -> bool {
    let Some((namespace, name)) = s.split_once("::") else {
        return false;
    };
    !namespace.is_empty()
        && namespace.chars().all(|c| c.is_ascii_lowercase())
        && !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid action id '{0}', expected namespace::name")]
pub struct InvalidActionId(pub String);

/// A validated `namespace::name` action identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(String);

impl ActionId {
    pub fn parse(s: &str) -> Result<Self, InvalidActionId> {
        if is_valid_action_id(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidActionId(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> &str {
        self.0.split_once("::").map(|(ns, _)| ns).unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.0.split_once("::").map(|(_, n)| n).unwrap_or_default()
    }

    /// The built-in command this id names, if any
    pub fn command(&self) -> Option<Command> {
        self.0.parse().ok()
    }
}

impl FromStr for ActionId {
    type Err = InvalidActionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Command> for ActionId {
    fn from(command: Command) -> Self {
        Self(command.as_str().to_string())
    }
}

macro_rules! commands {
    ($($(#[$meta:meta])* $variant:ident => $id:literal,)+) => {
        /// Every built-in action that can be bound to a key
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Command {
            $($(#[$meta])* $variant,)+
        }

        impl Command {
            pub const ALL: &'static [Command] = &[$(Command::$variant,)+];

            /// The `namespace::name` identifier
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Command::$variant => $id,)+
                }
            }
        }

        impl FromStr for Command {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($id => Ok(Command::$variant),)+
                    _ => Err(()),
                }
            }
        }
    };
}

commands! {
    // ========================================================================
    // Application
    // ========================================================================
    Quit => "app::quit",
    OpenSettings => "app::openSettings",
    OpenMappings => "app::openMappings",
    ReloadMappings => "app::reloadMappings",

    // ========================================================================
    // Pickers and dialogs
    // ========================================================================
    ToggleCommandPalette => "palette::toggle",
    ToggleTaskSwitcher => "switcher::tasks",
    ToggleProjectSwitcher => "switcher::projects",
    PickerClose => "picker::close",
    PickerSelectNext => "picker::selectNext",
    PickerSelectPrev => "picker::selectPrev",
    PickerConfirm => "picker::confirm",
    ModalConfirm => "modal::confirm",
    ModalCancel => "modal::cancel",

    // ========================================================================
    // Sessions
    // ========================================================================
    NewScratch => "scratch::new",
    CloseScratch => "scratch::close",
    NewWorktree => "worktree::new",
    CloseWorktree => "worktree::close",
    RenameWorktree => "worktree::rename",
    OpenProject => "project::open",
    CloseProject => "project::close",

    // ========================================================================
    // Drawer and panels
    // ========================================================================
    ToggleDrawer => "drawer::toggle",
    DrawerNewTab => "drawer::newTab",
    DrawerCloseTab => "drawer::closeTab",
    DrawerNextTab => "drawer::nextTab",
    DrawerPrevTab => "drawer::prevTab",
    DrawerExpand => "drawer::expand",
    ToggleRightPanel => "panel::toggleRight",

    // ========================================================================
    // Navigation
    // ========================================================================
    /// Takes the zero-based entity index as its single argument
    NavigateToEntity => "navigate::toEntity",
    NavigateNext => "navigate::next",
    NavigatePrev => "navigate::prev",
    NavigateBack => "navigate::back",
    NavigateForward => "navigate::forward",
    FocusMain => "navigate::focusMain",
    FocusDrawer => "navigate::focusDrawer",

    // ========================================================================
    // Terminal
    // ========================================================================
    TerminalCopy => "terminal::copy",
    TerminalPaste => "terminal::paste",
    TerminalClear => "terminal::clear",

    // ========================================================================
    // View
    // ========================================================================
    ZoomIn => "view::zoomIn",
    ZoomOut => "view::zoomOut",
    ZoomReset => "view::zoomReset",

    // ========================================================================
    // Diff view
    // ========================================================================
    OpenDiff => "diff::open",
    CloseDiff => "diff::close",
    DiffNextFile => "diff::nextFile",
    DiffPrevFile => "diff::prevFile",

    // ========================================================================
    // Split panes
    // ========================================================================
    SplitVertical => "pane::splitVertical",
    SplitHorizontal => "pane::splitHorizontal",
    ClosePane => "pane::close",
    FocusNextPane => "pane::focusNext",
    FocusPrevPane => "pane::focusPrev",
}

impl Command {
    pub fn namespace(self) -> &'static str {
        self.as_str().split_once("::").map(|(ns, _)| ns).unwrap_or_default()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action value as written in a mapping file, stored verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
    /// `"drawer::closeTab"`
    Simple(String),
    /// `["navigate::toEntity", 0]`
    WithArgs(Vec<Value>),
}

impl Action {
    pub fn simple(id: impl Into<String>) -> Self {
        Action::Simple(id.into())
    }

    pub fn with_args(id: &str, args: impl IntoIterator<Item = Value>) -> Self {
        let mut values = vec![Value::String(id.to_string())];
        values.extend(args);
        Action::WithArgs(values)
    }

    /// Split into the action id and its literal arguments
    ///
    /// Returns `None` for an empty tuple or one whose head is not a string.
    pub fn destructure(&self) -> Option<(&str, &[Value])> {
        match self {
            Action::Simple(id) => Some((id.as_str(), &[])),
            Action::WithArgs(values) => {
                let (head, args) = values.split_first()?;
                head.as_str().map(|id| (id, args))
            }
        }
    }

    pub fn action_id(&self) -> Option<&str> {
        self.destructure().map(|(id, _)| id)
    }

    /// Check the shape rules for mapping files
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Action::Simple(id) if is_valid_action_id(id) => Ok(()),
            Action::Simple(id) => Err(format!(
                "invalid action '{}', expected namespace::name",
                id
            )),
            Action::WithArgs(values) => validate_action_array(values),
        }
    }
}

/// Rules shared by the typed action and the untyped validator
pub(crate) fn validate_action_array(values: &[Value]) -> Result<(), String> {
    match values.first() {
        None => Err("action array must not be empty".to_string()),
        Some(Value::String(id)) if is_valid_action_id(id) => Ok(()),
        Some(Value::String(id)) => Err(format!(
            "invalid action '{}' at start of array, expected namespace::name",
            id
        )),
        Some(other) => Err(format!(
            "action array must start with an action id string, found {}",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_action_ids() {
        assert!(is_valid_action_id("drawer::closeTab"));
        assert!(is_valid_action_id("navigate::toEntity"));
        assert!(is_valid_action_id("view::zoomIn2"));
    }

    #[test]
    fn test_invalid_action_ids() {
        for bad in [
            "",
            "closeTab",
            "Drawer::closeTab",
            "drawer::",
            "::closeTab",
            "drawer::close-tab",
            "drawer:closeTab",
            "dr4wer::closeTab",
        ] {
            assert!(!is_valid_action_id(bad), "{} should be invalid", bad);
        }
    }

    #[test]
    fn test_action_id_parts() {
        let id = ActionId::parse("terminal::copy").unwrap();
        assert_eq!(id.namespace(), "terminal");
        assert_eq!(id.name(), "copy");
        assert_eq!(id.command(), Some(Command::TerminalCopy));

        let custom = ActionId::parse("plugin::doThing").unwrap();
        assert_eq!(custom.command(), None);
        assert!(ActionId::parse("nope").is_err());
    }

    #[test]
    fn test_command_ids_round_trip() {
        for command in Command::ALL {
            assert!(is_valid_action_id(command.as_str()), "{}", command);
            assert_eq!(command.as_str().parse::<Command>(), Ok(*command));
        }
        assert_eq!(Command::DrawerCloseTab.namespace(), "drawer");
    }

    #[test]
    fn test_destructure_simple() {
        let action = Action::simple("scratch::close");
        assert_eq!(action.destructure(), Some(("scratch::close", &[][..])));
    }

    #[test]
    fn test_destructure_with_args() {
        let action = Action::with_args("navigate::toEntity", [json!(3)]);
        let (id, args) = action.destructure().unwrap();
        assert_eq!(id, "navigate::toEntity");
        assert_eq!(args, &[json!(3)]);
    }

    #[test]
    fn test_destructure_malformed() {
        assert_eq!(Action::WithArgs(vec![]).destructure(), None);
        assert_eq!(Action::WithArgs(vec![json!(1)]).destructure(), None);
    }

    #[test]
    fn test_action_deserialize_untagged() {
        let simple: Action = serde_json::from_value(json!("drawer::closeTab")).unwrap();
        assert_eq!(simple, Action::simple("drawer::closeTab"));

        let with_args: Action = serde_json::from_value(json!(["navigate::toEntity", 0])).unwrap();
        assert_eq!(
            with_args,
            Action::with_args("navigate::toEntity", [json!(0)])
        );
    }

    #[test]
    fn test_validate() {
        assert!(Action::simple("app::quit").validate().is_ok());
        assert!(Action::simple("quit").validate().is_err());
        assert!(Action::WithArgs(vec![]).validate().is_err());
        assert!(Action::WithArgs(vec![json!(0)]).validate().is_err());
        assert!(Action::with_args("navigate::toEntity", [json!(1)])
            .validate()
            .is_ok());
    }
}
