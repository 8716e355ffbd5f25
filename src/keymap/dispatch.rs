//! Action dispatcher: resolved binding → handler invocation
//!
//! Built-in actions are keyed by [`Command`]; ids that are only known at run
//! time (plugins, user-defined actions) are keyed by their string form.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use super::action::{ActionId, Command, InvalidActionId};
use super::binding::ResolvedBinding;
use super::context::ContextLookup;
use super::keymap::Keymap;
use super::types::{KeyEvent, Platform};

/// What a handler asks the host to do with the originating key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerResult {
    /// Consume the event (prevent the default behaviour)
    Suppress,
    /// Let the event through, e.g. ctrl-c with nothing selected
    PassThrough,
}

impl From<()> for HandlerResult {
    fn from(_: ()) -> Self {
        HandlerResult::Suppress
    }
}

impl From<bool> for HandlerResult {
    fn from(handled: bool) -> Self {
        if handled {
            HandlerResult::Suppress
        } else {
            HandlerResult::PassThrough
        }
    }
}

/// Result of dispatching one action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No handler registered for the action
    NotHandled,
    Handled(HandlerResult),
}

impl DispatchOutcome {
    /// Whether the host should suppress the key's default behaviour
    pub fn should_suppress(self) -> bool {
        matches!(self, DispatchOutcome::Handled(HandlerResult::Suppress))
    }
}

type Handler = Box<dyn FnMut(&[Value]) -> HandlerResult>;

/// Handler table for actions
#[derive(Default)]
pub struct Dispatcher {
    commands: HashMap<Command, Handler>,
    dynamic: HashMap<String, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for a built-in command, replacing any previous one
    pub fn register<R, F>(&mut self, command: Command, mut handler: F) -> &mut Self
    where
        F: FnMut(&[Value]) -> R + 'static,
        R: Into<HandlerResult>,
    {
        self.commands
            .insert(command, Box::new(move |args: &[Value]| handler(args).into()));
        self
    }

    /// Register a handler for a run-time action id
    ///
    /// Ids that name a built-in command go to the command table.
    pub fn register_dynamic<R, F>(&mut self, id: ActionId, mut handler: F) -> &mut Self
    where
        F: FnMut(&[Value]) -> R + 'static,
        R: Into<HandlerResult>,
    {
        let boxed: Handler = Box::new(move |args: &[Value]| handler(args).into());
        match id.command() {
            Some(command) => {
                self.commands.insert(command, boxed);
            }
            None => {
                self.dynamic.insert(id.as_str().to_string(), boxed);
            }
        }
        self
    }

    /// Parse `id` and register it; malformed ids are rejected up front
    pub fn register_str<R, F>(&mut self, id: &str, handler: F) -> Result<&mut Self, InvalidActionId>
    where
        F: FnMut(&[Value]) -> R + 'static,
        R: Into<HandlerResult>,
    {
        let id = ActionId::parse(id)?;
        Ok(self.register_dynamic(id, handler))
    }

    pub fn is_registered(&self, action_id: &str) -> bool {
        match action_id.parse::<Command>() {
            Ok(command) => self.commands.contains_key(&command),
            Err(()) => self.dynamic.contains_key(action_id),
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len() + self.dynamic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke the handler for `action_id` with its literal arguments
    pub fn dispatch(&mut self, action_id: &str, args: &[Value]) -> DispatchOutcome {
        let handler = match action_id.parse::<Command>() {
            Ok(command) => self.commands.get_mut(&command),
            Err(()) => self.dynamic.get_mut(action_id),
        };

        let Some(handler) = handler else {
            tracing::trace!(action = action_id, "No handler registered");
            return DispatchOutcome::NotHandled;
        };

        let result = handler(args);
        tracing::debug!(action = action_id, ?result, "Dispatched action");
        DispatchOutcome::Handled(result)
    }

    pub fn dispatch_binding(&mut self, binding: &ResolvedBinding) -> DispatchOutcome {
        self.dispatch(&binding.action_id, &binding.args)
    }

    /// Run one key press through the whole pipeline
    ///
    /// Normalizes the event, resolves it against `keymap` (with the ctrl→cmd
    /// alias off macOS when enabled) and dispatches the winner. Returns
    /// `true` iff the host should suppress the event's default behaviour.
    pub fn handle_key_event<C: ContextLookup + ?Sized>(
        &mut self,
        event: &KeyEvent,
        contexts: &C,
        keymap: &Keymap,
        platform: Platform,
        alias_ctrl_to_cmd: bool,
    ) -> bool {
        if event.is_modifier_only() {
            return false;
        }
        match keymap.resolve_event(event, contexts, platform, alias_ctrl_to_cmd) {
            Some(binding) => self.dispatch_binding(&binding).should_suppress(),
            None => false,
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dynamic: Vec<&str> = self.dynamic.keys().map(String::as_str).collect();
        dynamic.sort_unstable();
        let mut commands: Vec<Command> = self.commands.keys().copied().collect();
        commands.sort_unstable();
        f.debug_struct("Dispatcher")
            .field("commands", &commands)
            .field("dynamic", &dynamic)
            .finish()
    }
}
