//! Platform shortcut matcher
//!
//! A standalone "does this key press match this shortcut" check for call
//! sites that do not go through the mapping table. Uses the same key-event
//! normalization as the resolver, so `code` substitution behaves the same.

use serde::{Deserialize, Serialize};

use super::types::{key_event_to_string, normalize_key, KeyEvent, Platform};

/// A shortcut spec as written in settings
///
/// ```yaml
/// toggle: cmd-j
/// close: [cmd-w, ctrl-w]
/// copy: { mac: cmd-c, other: ctrl-shift-c }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Shortcut {
    Single(String),
    /// Any variant matches
    Variants(Vec<Shortcut>),
    PerPlatform {
        mac: Box<Shortcut>,
        other: Box<Shortcut>,
    },
}

impl Shortcut {
    pub fn single(chord: impl Into<String>) -> Self {
        Shortcut::Single(chord.into())
    }

    pub fn per_platform(mac: Shortcut, other: Shortcut) -> Self {
        Shortcut::PerPlatform {
            mac: Box::new(mac),
            other: Box::new(other),
        }
    }

    /// Whether `event` matches this shortcut on `platform`
    ///
    /// Modifier-only presses never match.
    pub fn matches(&self, event: &KeyEvent, platform: Platform) -> bool {
        let Some(pressed) = key_event_to_string(event) else {
            return false;
        };
        self.matches_chord(&pressed, platform)
    }

    fn matches_chord(&self, pressed: &str, platform: Platform) -> bool {
        match self {
            Shortcut::Single(chord) => normalize_key(chord) == pressed,
            Shortcut::Variants(variants) => {
                variants.iter().any(|v| v.matches_chord(pressed, platform))
            }
            Shortcut::PerPlatform { mac, other } => {
                let chosen = if platform.is_mac() { mac } else { other };
                chosen.matches_chord(pressed, platform)
            }
        }
    }

    /// Canonical chords that apply on `platform`, in declaration order
    pub fn chords(&self, platform: Platform) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_chords(platform, &mut out);
        out
    }

    fn collect_chords(&self, platform: Platform, out: &mut Vec<String>) {
        match self {
            Shortcut::Single(chord) => {
                let chord = normalize_key(chord);
                if !chord.is_empty() && !out.contains(&chord) {
                    out.push(chord);
                }
            }
            Shortcut::Variants(variants) => {
                for v in variants {
                    v.collect_chords(platform, out);
                }
            }
            Shortcut::PerPlatform { mac, other } => {
                let chosen = if platform.is_mac() { mac } else { other };
                chosen.collect_chords(platform, out);
            }
        }
    }

    /// Label of the first applicable chord
    pub fn display_string(&self, platform: Platform) -> Option<String> {
        self.chords(platform)
            .first()
            .map(|chord| super::types::format_chord(chord, platform))
    }
}

impl From<&str> for Shortcut {
    fn from(chord: &str) -> Self {
        Shortcut::single(chord)
    }
}
