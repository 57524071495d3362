use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::{Key, Modifiers};

/// The identity of a registrable hotkey: a modifier set plus a key.
///
/// Equality and hashing are structural, so the order in which modifiers
/// were combined is irrelevant. This is the key type of the registration
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl Hotkey {
    /// Create a hotkey identity. `Modifiers::empty()` is a valid set for
    /// bare keys like function keys.
    pub const fn new(modifiers: Modifiers, key: Key) -> Self {
        Hotkey { modifiers, key }
    }

    /// Parse a hotkey from a string representation
    ///
    /// Supports formats like:
    /// - "f9" (just a key)
    /// - "ctrl+a" (with modifiers)
    /// - "ctrl+shift+a" (multiple modifiers)
    /// - "control+option+enter" (alternative names)
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('+').map(|p| p.trim()).collect();

        // split always yields at least one part
        let (key_part, modifier_parts) = parts
            .split_last()
            .ok_or_else(|| Error::InvalidKey("empty hotkey string".to_string()))?;

        let key = Key::from_name(key_part)
            .ok_or_else(|| Error::InvalidKey(format!("unknown key: {key_part}")))?;

        let mut modifiers = Modifiers::empty();
        for part in modifier_parts {
            modifiers |= match part.to_lowercase().as_str() {
                "ctrl" | "control" => Modifiers::CONTROL,
                "shift" => Modifiers::SHIFT,
                "alt" | "option" => Modifiers::ALT,
                "cmd" | "command" | "super" | "win" | "windows" | "meta" => Modifiers::SUPER,
                _ => return Err(Error::InvalidKey(format!("unknown modifier: {part}"))),
            };
        }

        Ok(Hotkey { modifiers, key })
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if self.modifiers.contains(Modifiers::CONTROL) {
            parts.push("ctrl".to_string());
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            parts.push("shift".to_string());
        }
        if self.modifiers.contains(Modifiers::ALT) {
            parts.push("alt".to_string());
        }
        if self.modifiers.contains(Modifiers::SUPER) {
            parts.push("super".to_string());
        }

        parts.push(self.key.to_string());
        write!(f, "{}", parts.join("+"))
    }
}

impl FromStr for Hotkey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Hotkey::parse(s)
    }
}

impl From<(Modifiers, Key)> for Hotkey {
    fn from((modifiers, key): (Modifiers, Key)) -> Self {
        Hotkey::new(modifiers, key)
    }
}
