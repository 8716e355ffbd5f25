//! Core types for the keymap system: Platform, Modifiers, Chord, KeyEvent
//!
//! Chords are exchanged as canonical strings (`cmd-shift-p`). Everything that
//! produces a chord, whether from a mapping file or from a live key press,
//! goes through [`Chord`] so both sides agree on spelling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform family, used for modifier aliasing and display
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// macOS: `cmd` is the Command key
    Mac,
    /// Windows/Linux: `cmd` bindings are reachable through `ctrl`
    Other,
}

impl Platform {
    /// Platform the binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }

    pub fn is_mac(self) -> bool {
        self == Platform::Mac
    }
}

/// Modifier keys as a bitfield for efficient storage and comparison
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CMD: Modifiers = Modifiers(0b0001); // Meta / Command / Win
    pub const CTRL: Modifiers = Modifiers(0b0010);
    pub const ALT: Modifiers = Modifiers(0b0100);
    pub const SHIFT: Modifiers = Modifiers(0b1000);

    /// Create modifiers from individual flags
    pub const fn new(cmd: bool, ctrl: bool, alt: bool, shift: bool) -> Self {
        let mut bits = 0u8;
        if cmd {
            bits |= Self::CMD.0;
        }
        if ctrl {
            bits |= Self::CTRL.0;
        }
        if alt {
            bits |= Self::ALT.0;
        }
        if shift {
            bits |= Self::SHIFT.0;
        }
        Modifiers(bits)
    }

    #[inline]
    pub const fn cmd(self) -> bool {
        self.0 & Self::CMD.0 != 0
    }

    #[inline]
    pub const fn ctrl(self) -> bool {
        self.0 & Self::CTRL.0 != 0
    }

    #[inline]
    pub const fn alt(self) -> bool {
        self.0 & Self::ALT.0 != 0
    }

    #[inline]
    pub const fn shift(self) -> bool {
        self.0 & Self::SHIFT.0 != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    #[inline]
    pub const fn without(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 & !other.0)
    }

    #[inline]
    pub const fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Parse a modifier token (already lowercased), accepting common aliases
    pub fn from_token(token: &str) -> Option<Modifiers> {
        match token {
            "cmd" | "command" | "meta" | "super" | "win" | "mod" => Some(Modifiers::CMD),
            "ctrl" | "control" => Some(Modifiers::CTRL),
            "alt" | "option" | "opt" => Some(Modifiers::ALT),
            "shift" => Some(Modifiers::SHIFT),
            _ => None,
        }
    }

    /// Canonical tokens in fixed order: cmd, ctrl, alt, shift
    pub fn tokens(self) -> impl Iterator<Item = &'static str> {
        [
            (self.cmd(), "cmd"),
            (self.ctrl(), "ctrl"),
            (self.alt(), "alt"),
            (self.shift(), "shift"),
        ]
        .into_iter()
        .filter_map(|(held, name)| held.then_some(name))
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// A parsed chord: modifiers plus the final key token
///
/// Tokens between the modifiers and the key that are not modifiers are kept
/// verbatim so that normalization stays total and idempotent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Chord {
    pub mods: Modifiers,
    pub extra: Vec<String>,
    pub key: String,
}

impl Chord {
    pub fn new(mods: Modifiers, key: impl Into<String>) -> Self {
        Self {
            mods,
            extra: Vec::new(),
            key: canonical_key_token(&key.into()),
        }
    }

    /// Parse an author-written chord (`Cmd+Shift-P`, `CMD-SHIFT-P`, ...)
    ///
    /// `+` and `-` both separate tokens. A separator that directly follows
    /// another separator (or starts the string) is the key itself, so
    /// `cmd--` is cmd + minus and `ctrl-+` is ctrl + plus.
    pub fn parse(input: &str) -> Self {
        let lowered = input.to_lowercase();
        let mut tokens: Vec<String> = Vec::new();
        let mut current = String::new();

        for c in lowered.chars() {
            if (c == '-' || c == '+') && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            } else {
                current.push(c);
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }

        let tokens: Vec<String> = tokens
            .into_iter()
            .map(|t| {
                let trimmed = t.trim();
                if trimmed.is_empty() {
                    "space".to_string()
                } else {
                    trimmed.to_string()
                }
            })
            .collect();

        let Some((key, prefix)) = tokens.split_last() else {
            return Self {
                mods: Modifiers::NONE,
                extra: Vec::new(),
                key: String::new(),
            };
        };

        let mut mods = Modifiers::NONE;
        let mut extra = Vec::new();
        for token in prefix {
            match Modifiers::from_token(token) {
                Some(m) => mods = mods | m,
                None => extra.push(token.clone()),
            }
        }

        Self {
            mods,
            extra,
            key: canonical_key_token(key),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    /// The ctrl→cmd alias used on non-Apple platforms
    ///
    /// Returns `None` when the chord has no `ctrl`, or already has `cmd`.
    pub fn ctrl_as_cmd(&self) -> Option<Chord> {
        if !self.mods.ctrl() || self.mods.cmd() {
            return None;
        }
        Some(Chord {
            mods: self.mods.without(Modifiers::CTRL) | Modifiers::CMD,
            extra: self.extra.clone(),
            key: self.key.clone(),
        })
    }

    /// Human-presentable label (`⌘⇧P` on macOS, `Ctrl+Shift+P` elsewhere)
    pub fn display_string(&self, platform: Platform) -> String {
        let key = display_key(&self.key, platform);

        if platform.is_mac() {
            let mut out = String::new();
            if self.mods.cmd() {
                out.push('⌘');
            }
            if self.mods.ctrl() {
                out.push('⌃');
            }
            if self.mods.alt() {
                out.push('⌥');
            }
            if self.mods.shift() {
                out.push('⇧');
            }
            for token in &self.extra {
                out.push_str(&token.to_uppercase());
            }
            out.push_str(&key);
            out
        } else {
            let mut parts: Vec<String> = Vec::new();
            // cmd is reached through ctrl off macOS, so both collapse into one label
            if self.mods.cmd() || self.mods.ctrl() {
                parts.push("Ctrl".to_string());
            }
            if self.mods.alt() {
                parts.push("Alt".to_string());
            }
            if self.mods.shift() {
                parts.push("Shift".to_string());
            }
            parts.extend(self.extra.iter().map(|t| t.to_uppercase()));
            parts.push(key);
            parts.join("+")
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for token in self
            .mods
            .tokens()
            .map(|t| -> &str { t })
            .chain(self.extra.iter().map(String::as_str))
            .chain(std::iter::once(self.key.as_str()))
        {
            if !first {
                f.write_str("-")?;
            }
            f.write_str(token)?;
            first = false;
        }
        Ok(())
    }
}

/// Normalize an author-written chord string into canonical form
///
/// `normalize_key("Cmd+Shift-W") == "cmd-shift-w"`, and the function is
/// idempotent.
pub fn normalize_key(chord: &str) -> String {
    Chord::parse(chord).to_string()
}

/// Fixed short tokens for named keys, both from mapping files and key events
fn canonical_key_token(key: &str) -> String {
    let lower = key.to_lowercase();
    let token = match lower.as_str() {
        " " | "spacebar" => "space",
        "esc" => "escape",
        "arrowup" => "up",
        "arrowdown" => "down",
        "arrowleft" => "left",
        "arrowright" => "right",
        "return" => "enter",
        "del" => "delete",
        "pgup" => "pageup",
        "pgdn" | "pgdown" => "pagedown",
        _ => return lower,
    };
    token.to_string()
}

fn display_key(key: &str, platform: Platform) -> String {
    let mac = platform.is_mac();
    let label = match key {
        "enter" => {
            if mac {
                "↩"
            } else {
                "Enter"
            }
        }
        "escape" => {
            if mac {
                "⎋"
            } else {
                "Esc"
            }
        }
        "backspace" => {
            if mac {
                "⌫"
            } else {
                "Backspace"
            }
        }
        "delete" => {
            if mac {
                "⌦"
            } else {
                "Delete"
            }
        }
        "tab" => {
            if mac {
                "⇥"
            } else {
                "Tab"
            }
        }
        "space" => "Space",
        "up" => "↑",
        "down" => "↓",
        "left" => "←",
        "right" => "→",
        "pageup" => "PgUp",
        "pagedown" => "PgDn",
        "home" => "Home",
        "end" => "End",
        _ => return key.to_uppercase(),
    };
    label.to_string()
}

/// Format a canonical or author-written chord for display
pub fn format_chord(chord: &str, platform: Platform) -> String {
    Chord::parse(chord).display_string(platform)
}

/// A raw key press as delivered by the host input layer
///
/// `key` is the produced key name (`"w"`, `"Escape"`, `" "`); `code` is the
/// physical key code (`"KeyW"`, `"Backslash"`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub code: String,
    pub meta: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers::new(self.meta, self.ctrl, self.alt, self.shift)
    }

    /// Whether the key itself is a modifier (Shift, Control, ...)
    pub fn is_modifier_only(&self) -> bool {
        matches!(
            self.key.as_str(),
            "Meta" | "Control" | "Alt" | "AltGraph" | "Shift" | "OS" | "Super" | "Hyper"
        )
    }

    /// Convert into a canonical chord
    ///
    /// Returns `None` for modifier-only presses and empty keys.
    pub fn to_chord(&self) -> Option<Chord> {
        if self.is_modifier_only() || self.key.is_empty() {
            return None;
        }

        let mods = self.modifiers();
        // With ctrl/meta/alt held some platforms report a control character
        // (or an option-layer glyph) instead of the punctuation pressed.
        let key = if self.meta || self.ctrl || self.alt {
            punctuation_for_code(&self.code).map(str::to_string)
        } else {
            None
        };
        let key = key.unwrap_or_else(|| self.key.clone());

        Some(Chord::new(mods, key))
    }
}

/// Literal character for the fixed set of punctuation key codes
fn punctuation_for_code(code: &str) -> Option<&'static str> {
    match code {
        "Backslash" => Some("\\"),
        "Slash" => Some("/"),
        "BracketLeft" => Some("["),
        "BracketRight" => Some("]"),
        "Backquote" => Some("`"),
        "Quote" => Some("'"),
        "Minus" => Some("-"),
        "Equal" => Some("="),
        "Semicolon" => Some(";"),
        "Comma" => Some(","),
        "Period" => Some("."),
        _ => None,
    }
}

/// Canonical chord string for a live key press, or `None` for modifier-only
pub fn key_event_to_string(event: &KeyEvent) -> Option<String> {
    event.to_chord().map(|c| c.to_string())
}
