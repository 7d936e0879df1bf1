//! Action vocabulary
//!
//! An [`Action`] is what a button, drag direction, or remapped key resolves
//! to. System actions may be driven either by a synthesized key combo or by
//! the private symbolic-hotkey API (see `platform::macos::ffi`); editing
//! actions always resolve to a fixed key combo.

use serde::{Deserialize, Serialize};

use super::modifiers::{KeyCombo, Modifiers};

/// What an "inert" mapping does with the original event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InertKind {
    PassThrough,
    Suppress,
}

/// System-level actions driven by the private symbolic-hotkey API or a
/// dedicated function key, rather than an ordinary key combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemAction {
    MissionControl,
    AppExpose,
    ShowDesktop,
    Launchpad,
    SwitchSpaceLeft,
    SwitchSpaceRight,
}

impl SystemAction {
    /// The six actions that can be driven smoothly by a DockSwipe instead of
    /// only fired as a discrete shortcut (spec §4.4).
    pub fn is_continuous_capable(self) -> bool {
        true // all six named system actions are continuous-capable per spec
    }

    /// DockSwipe axis this action animates along when driven continuously.
    pub fn dockswipe_axis(self) -> crate::engine::gesture::DockSwipeAxis {
        use crate::engine::gesture::DockSwipeAxis::*;
        match self {
            SystemAction::SwitchSpaceLeft | SystemAction::SwitchSpaceRight => Horizontal,
            SystemAction::MissionControl | SystemAction::AppExpose => Vertical,
            SystemAction::ShowDesktop | SystemAction::Launchpad => Pinch,
        }
    }
}

/// Editing / navigation actions that always resolve to a fixed key combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditingAction {
    Back,
    Forward,
    Copy,
    Cut,
    Paste,
    Undo,
    Redo,
    SelectAll,
    Fullscreen,
    MiddleClick,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
}

impl EditingAction {
    /// Predetermined key combination for this action (§4.5). `MiddleClick`
    /// has no combo — it is handled specially by the button dispatcher.
    pub fn key_combo(self) -> Option<KeyCombo> {
        use crate::platform::macos::keycode::hid;
        let cmd = Modifiers::COMMAND;
        match self {
            EditingAction::Back => Some(KeyCombo::new(hid::KEY_LEFT_BRACKET, cmd)),
            EditingAction::Forward => Some(KeyCombo::new(hid::KEY_RIGHT_BRACKET, cmd)),
            EditingAction::Copy => Some(KeyCombo::new(hid::KEY_C, cmd)),
            EditingAction::Cut => Some(KeyCombo::new(hid::KEY_X, cmd)),
            EditingAction::Paste => Some(KeyCombo::new(hid::KEY_V, cmd)),
            EditingAction::Undo => Some(KeyCombo::new(hid::KEY_Z, cmd)),
            EditingAction::Redo => Some(KeyCombo::new(hid::KEY_Z, cmd | Modifiers::SHIFT)),
            EditingAction::SelectAll => Some(KeyCombo::new(hid::KEY_A, cmd)),
            EditingAction::Fullscreen => {
                Some(KeyCombo::new(hid::KEY_F, cmd | Modifiers::CONTROL))
            }
            EditingAction::MiddleClick => None,
            EditingAction::MoveLeft => Some(KeyCombo::bare(hid::KEY_LEFT_ARROW)),
            EditingAction::MoveRight => Some(KeyCombo::bare(hid::KEY_RIGHT_ARROW)),
            EditingAction::MoveUp => Some(KeyCombo::bare(hid::KEY_UP_ARROW)),
            EditingAction::MoveDown => Some(KeyCombo::bare(hid::KEY_DOWN_ARROW)),
        }
    }
}

/// A configured action: what a button, drag direction, or key remap does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Action {
    Inert(InertKind),
    System(SystemAction),
    Editing(EditingAction),
    Custom(KeyComboDef),
}

impl Action {
    pub fn is_inert(self) -> bool {
        matches!(self, Action::Inert(_))
    }

    /// True for actions the gesture engine can drive continuously given the
    /// user setting is on (spec §4.4).
    pub fn is_continuous_capable(self) -> bool {
        matches!(self, Action::System(s) if s.is_continuous_capable())
    }
}

/// Serializable mirror of [`KeyCombo`] — `Modifiers` already round-trips via
/// serde, this just gives `Action::Custom` a `Copy` + `Eq` payload type
/// distinct from the hot-path [`KeyCombo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyComboDef {
    pub key_code: u16,
    pub modifiers: Modifiers,
}

impl From<KeyComboDef> for KeyCombo {
    fn from(d: KeyComboDef) -> Self {
        KeyCombo::new(d.key_code, d.modifiers)
    }
}

impl From<KeyCombo> for KeyComboDef {
    fn from(c: KeyCombo) -> Self {
        KeyComboDef { key_code: c.key_code, modifiers: c.modifiers }
    }
}
