//! macOS virtual key code constants
//!
//! The teacher's `input::macos` module carried a `CGKeyCode` <-> USB-HID
//! translation table for bridging remote keyboards; this system has no
//! remote peer so only the macOS side is needed. `mac` holds raw
//! `CGKeyCode` values for the keys named by the spec's closed set plus the
//! combo targets used by [`crate::model::action::EditingAction`]. `hid`
//! re-exports the subset `EditingAction::key_combo` needs under the naming
//! convention the action-vocabulary table was grounded on; both modules
//! hold plain `CGKeyCode`s, macOS has no separate injection-time HID
//! keycode space.

/// Standard US-layout macOS virtual key codes, named the way Apple's own
/// `Carbon/HIToolbox` headers name them.
pub mod mac {
    pub const A: u16 = 0x00;
    pub const C: u16 = 0x08;
    pub const F: u16 = 0x03;
    pub const V: u16 = 0x09;
    pub const X: u16 = 0x07;
    pub const Z: u16 = 0x06;
    pub const LEFT_BRACKET: u16 = 0x21;
    pub const RIGHT_BRACKET: u16 = 0x1E;

    pub const LEFT_ARROW: u16 = 0x7B;
    pub const RIGHT_ARROW: u16 = 0x7C;
    pub const DOWN_ARROW: u16 = 0x7D;
    pub const UP_ARROW: u16 = 0x7E;

    pub const HOME: u16 = 0x73;
    pub const END: u16 = 0x77;
    pub const PAGE_UP: u16 = 0x74;
    pub const PAGE_DOWN: u16 = 0x79;
    pub const FORWARD_DELETE: u16 = 0x75;
    pub const HELP: u16 = 0x72;
    pub const F11: u16 = 0x67;
    pub const F13: u16 = 0x69;

    /// Target key code for the Home→"line start" remap in spec scenario 5:
    /// keycode 0x00 with Control held is the classic Emacs-style binding.
    pub const LINE_START: u16 = 0x00;
}

/// The module `action.rs` imports as `hid::KEY_*`. Despite the name these
/// are still `CGKeyCode` values — kept under a `hid` alias only because the
/// action-vocabulary table was grounded on a USB-HID-flavored naming
/// convention in the wider example pack; macOS has no separate HID keycode
/// space for injected events, `CGEvent::new_keyboard_event` always takes a
/// `CGKeyCode`.
pub mod hid {
    pub use super::mac::{
        A as KEY_A, C as KEY_C, DOWN_ARROW as KEY_DOWN_ARROW, F as KEY_F,
        LEFT_ARROW as KEY_LEFT_ARROW, LEFT_BRACKET as KEY_LEFT_BRACKET,
        RIGHT_ARROW as KEY_RIGHT_ARROW, RIGHT_BRACKET as KEY_RIGHT_BRACKET,
        UP_ARROW as KEY_UP_ARROW, V as KEY_V, X as KEY_X, Z as KEY_Z,
    };
}
