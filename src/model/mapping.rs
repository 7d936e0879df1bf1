//! Button, drag-direction and keyboard-remap mapping tables
//!
//! All three tables are small and finite, so per spec §9 they are kept as
//! fixed-capacity arrays indexed by ordinal rather than hash maps — no
//! hashing on the hot path.

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::modifiers::KeyCombo;

/// Lowest legal auxiliary button number. 0 and 1 are the primary clicks and
/// are rejected at construction time, never at the callback.
pub const MIN_AUX_BUTTON: u32 = 2;
/// Highest button number a mapping can target. Five-button mice plus a
/// couple of spares; generous enough for any real aux-button mouse.
pub const MAX_AUX_BUTTON: u32 = 8;

const BUTTON_SLOTS: usize = (MAX_AUX_BUTTON - MIN_AUX_BUTTON + 1) as usize;

/// At-most-one mapping per auxiliary button number (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonMapping {
    slots: [Option<Action>; BUTTON_SLOTS],
}

impl Default for ButtonMapping {
    fn default() -> Self {
        Self { slots: [None; BUTTON_SLOTS] }
    }
}

impl ButtonMapping {
    /// Insert a mapping for `button`. Returns `Err` if `button` is a primary
    /// click (0 or 1) or out of the supported range — rejected at policy
    /// time per §3/§8, never silently accepted.
    pub fn set(&mut self, button: u32, action: Action) -> Result<(), InvalidButton> {
        let idx = Self::index_of(button).ok_or(InvalidButton(button))?;
        self.slots[idx] = Some(action);
        Ok(())
    }

    pub fn get(&self, button: u32) -> Option<Action> {
        Self::index_of(button).and_then(|i| self.slots[i])
    }

    pub fn clear(&mut self, button: u32) {
        if let Some(idx) = Self::index_of(button) {
            self.slots[idx] = None;
        }
    }

    fn index_of(button: u32) -> Option<usize> {
        if button < MIN_AUX_BUTTON || button > MAX_AUX_BUTTON {
            return None;
        }
        Some((button - MIN_AUX_BUTTON) as usize)
    }
}

/// Rejected attempt to map a primary button (0/1) or an out-of-range number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidButton(pub u32);

impl std::fmt::Display for InvalidButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "button {} is reserved or out of range (mappable range is {}..={})", self.0, MIN_AUX_BUTTON, MAX_AUX_BUTTON)
    }
}
impl std::error::Error for InvalidButton {}

/// One of the four drag directions a committed middle-button drag can lock
/// to. Ordinal order fixes the array index below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragDirection {
    Up,
    Down,
    Left,
    Right,
}

impl DragDirection {
    const ALL: [DragDirection; 4] =
        [DragDirection::Up, DragDirection::Down, DragDirection::Left, DragDirection::Right];

    /// Classify a `(dx, dy)` offset from the drag-start point into the
    /// dominant direction, given the sign convention that down/right are
    /// positive pixel deltas (screen coordinates).
    pub fn dominant(dx: f64, dy: f64) -> DragDirection {
        if dx.abs() >= dy.abs() {
            if dx >= 0.0 { DragDirection::Right } else { DragDirection::Left }
        } else if dy >= 0.0 {
            DragDirection::Down
        } else {
            DragDirection::Up
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, DragDirection::Left | DragDirection::Right)
    }
}

/// At most one action per direction (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragDirectionMapping {
    slots: [Option<Action>; 4],
}

impl Default for DragDirectionMapping {
    fn default() -> Self {
        Self { slots: [None; 4] }
    }
}

impl DragDirectionMapping {
    pub fn set(&mut self, direction: DragDirection, action: Action) {
        self.slots[Self::index_of(direction)] = Some(action);
    }

    pub fn get(&self, direction: DragDirection) -> Option<Action> {
        self.slots[Self::index_of(direction)]
    }

    /// True iff at least one mapped direction is continuous-capable — the
    /// gate for entering continuous mode at all (§4.4).
    pub fn has_continuous_capable(&self) -> bool {
        DragDirection::ALL.iter().any(|&d| self.get(d).is_some_and(Action::is_continuous_capable))
    }

    fn index_of(direction: DragDirection) -> usize {
        match direction {
            DragDirection::Up => 0,
            DragDirection::Down => 1,
            DragDirection::Left => 2,
            DragDirection::Right => 3,
        }
    }
}

/// Named keys with dedicated macOS virtual key codes that are common remap
/// sources, plus an escape hatch for any other (keycode, modifier) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamedKey {
    Home,
    End,
    Insert,
    ForwardDelete,
    PageUp,
    PageDown,
    PrintScreen,
}

impl NamedKey {
    /// macOS virtual key code for this named key.
    pub fn key_code(self) -> u16 {
        use crate::platform::macos::keycode::mac;
        match self {
            NamedKey::Home => mac::HOME,
            NamedKey::End => mac::END,
            NamedKey::Insert => mac::HELP, // external keyboards map Insert to the Help/Insert key
            NamedKey::ForwardDelete => mac::FORWARD_DELETE,
            NamedKey::PageUp => mac::PAGE_UP,
            NamedKey::PageDown => mac::PAGE_DOWN,
            NamedKey::PrintScreen => mac::F13, // common PC-keyboard PrintScreen mapping
        }
    }
}

/// Source side of a keyboard remap: either a named key or an explicit combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemapSource {
    Named(NamedKey),
    Custom(KeyComboKey),
}

/// `serde`-friendly mirror of [`KeyCombo`] usable as a map key (`KeyCombo`
/// itself intentionally only implements canonical `Eq`/`Hash`, which is what
/// we want here too).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyComboKey {
    pub key_code: u16,
    pub modifiers: crate::model::modifiers::Modifiers,
}

impl From<KeyComboKey> for KeyCombo {
    fn from(k: KeyComboKey) -> Self {
        KeyCombo::new(k.key_code, k.modifiers)
    }
}

/// One entry in the keyboard-remap table: a source identifier plus the
/// action it resolves to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KeyboardRemap {
    pub source: RemapSource,
    pub target: Action,
}

impl KeyboardRemap {
    fn source_combo(&self) -> KeyCombo {
        match self.source {
            RemapSource::Named(n) => KeyCombo::bare(n.key_code()),
            RemapSource::Custom(c) => c.into(),
        }
    }

    /// Canonical-equality match against an observed combo (§3: "Match is by
    /// canonical keycode+modifier equality").
    pub fn matches(&self, observed: KeyCombo) -> bool {
        self.source_combo() == observed
    }
}

/// The full keyboard-remap table. A plain `Vec` rather than a fixed array:
/// unlike buttons/directions this key space isn't small and ordinal-indexed,
/// so a linear scan over user-configured entries (expected to number in the
/// single digits) is the simplest correct implementation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyboardRemapTable {
    entries: Vec<KeyboardRemap>,
}

impl KeyboardRemapTable {
    pub fn push(&mut self, remap: KeyboardRemap) {
        self.entries.push(remap);
    }

    pub fn lookup(&self, observed: KeyCombo) -> Option<Action> {
        self.entries.iter().find(|r| r.matches(observed)).map(|r| r.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::action::{Action, InertKind};

    #[test]
    fn button_mapping_rejects_primary_buttons() {
        let mut m = ButtonMapping::default();
        assert!(m.set(0, Action::Inert(InertKind::Suppress)).is_err());
        assert!(m.set(1, Action::Inert(InertKind::Suppress)).is_err());
    }

    #[test]
    fn button_mapping_round_trips() {
        let mut m = ButtonMapping::default();
        m.set(3, Action::Inert(InertKind::PassThrough)).unwrap();
        assert_eq!(m.get(3), Some(Action::Inert(InertKind::PassThrough)));
        assert_eq!(m.get(4), None);
    }

    #[test]
    fn dominant_direction_picks_larger_axis() {
        assert_eq!(DragDirection::dominant(5.0, -60.0), DragDirection::Up);
        assert_eq!(DragDirection::dominant(60.0, 5.0), DragDirection::Right);
    }

    #[test]
    fn drag_direction_mapping_at_most_one_per_direction() {
        let mut m = DragDirectionMapping::default();
        m.set(DragDirection::Up, Action::Inert(InertKind::Suppress));
        m.set(DragDirection::Up, Action::Inert(InertKind::PassThrough));
        assert_eq!(m.get(DragDirection::Up), Some(Action::Inert(InertKind::PassThrough)));
    }
}
