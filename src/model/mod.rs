//! Data model: modifiers, key combinations, actions and mapping tables
//!
//! Pure data types shared between configuration, the settings bridge and the
//! engines. Nothing in this module touches the platform layer directly,
//! except for resolving named-key virtual key codes, which defers to
//! `platform::macos::keycode`.

pub mod action;
pub mod mapping;
pub mod modifiers;

pub use action::{Action, EditingAction, InertKind, KeyComboDef, SystemAction};
pub use mapping::{
    ButtonMapping, DragDirection, DragDirectionMapping, InvalidButton, KeyComboKey,
    KeyboardRemap, KeyboardRemapTable, NamedKey, RemapSource, MAX_AUX_BUTTON, MIN_AUX_BUTTON,
};
pub use modifiers::{KeyCombo, Modifiers, VirtualKeyCode};
