//! Modifier masks and key combinations
//!
//! A [`KeyCombo`] pairs a 16-bit virtual key code with a [`Modifiers`] mask.
//! Equality and hashing for lookup purposes always go through
//! [`Modifiers::canonical`], which strips everything but the four primary
//! modifiers (Control / Option / Shift / Command) — layout bits and caps-lock
//! never affect a mapping match.

use serde::{Deserialize, Serialize};

/// Platform-independent virtual key code (macOS `CGKeyCode` space).
pub type VirtualKeyCode = u16;

bitflags::bitflags! {
    /// Modifier bitfield, as read from `CGEventFlags` and as carried by
    /// configured key mappings.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Modifiers: u64 {
        const CONTROL  = 1 << 0;
        const OPTION   = 1 << 1;
        const SHIFT    = 1 << 2;
        const COMMAND  = 1 << 3;
        const FUNCTION = 1 << 4;
        /// Set when caps-lock is physically engaged. Ignored by
        /// [`Modifiers::canonical`] — never part of a mapping match.
        const CAPS_LOCK = 1 << 5;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Modifiers::empty()
    }
}

impl Modifiers {
    /// The four modifiers a key combination is actually compared on.
    pub const PRIMARY: Modifiers =
        Modifiers::CONTROL.union(Modifiers::OPTION).union(Modifiers::SHIFT).union(Modifiers::COMMAND);

    /// Strip everything outside [`Modifiers::PRIMARY`]. Idempotent: calling
    /// this twice yields the same bits as calling it once.
    pub fn canonical(self) -> Modifiers {
        self & Modifiers::PRIMARY
    }
}

/// A key combination: a virtual key code plus the modifiers held with it.
///
/// `PartialEq` and `Hash` both route through [`Modifiers::canonical`], so two
/// combos that differ only in caps-lock or Function state compare equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KeyCombo {
    pub key_code: VirtualKeyCode,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key_code: VirtualKeyCode, modifiers: Modifiers) -> Self {
        Self { key_code, modifiers }
    }

    pub fn bare(key_code: VirtualKeyCode) -> Self {
        Self { key_code, modifiers: Modifiers::empty() }
    }
}

impl PartialEq for KeyCombo {
    fn eq(&self, other: &Self) -> bool {
        self.key_code == other.key_code
            && self.modifiers.canonical() == other.modifiers.canonical()
    }
}
impl Eq for KeyCombo {}

impl std::hash::Hash for KeyCombo {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key_code.hash(state);
        self.modifiers.canonical().bits().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_ignores_caps_lock_and_function() {
        let a = Modifiers::COMMAND | Modifiers::CAPS_LOCK;
        let b = Modifiers::COMMAND | Modifiers::FUNCTION;
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let m = Modifiers::SHIFT | Modifiers::CAPS_LOCK | Modifiers::COMMAND;
        assert_eq!(m.canonical(), m.canonical().canonical());
    }

    #[test]
    fn combo_equality_ignores_caps_lock() {
        let a = KeyCombo::new(0x04, Modifiers::SHIFT);
        let b = KeyCombo::new(0x04, Modifiers::SHIFT | Modifiers::CAPS_LOCK);
        assert_eq!(a, b);
    }

    #[test]
    fn combo_equality_differs_on_primary_modifier() {
        let a = KeyCombo::new(0x04, Modifiers::SHIFT);
        let b = KeyCombo::new(0x04, Modifiers::CONTROL);
        assert_ne!(a, b);
    }
}
