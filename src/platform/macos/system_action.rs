//! Symbolic hotkey trigger (§4.5)
//!
//! `SystemAction` variants other than `ShowDesktop` have no ordinary key
//! combo — the platform drives them through Apple's private "symbolic
//! hotkey" numbering, the same mechanism System Preferences > Keyboard >
//! Shortcuts edits. There is no public entry point for it; the well-known
//! technique (used by several macOS automation tools) is to synthesize an
//! `NSEventTypeSystemDefined` event with subtype 8 and the hotkey id packed
//! into `data1`, then post its underlying `CGEvent`.
//!
//! The numeric ids below are reverse-engineered, not documented by Apple;
//! carried bit-for-bit the same way `platform::macos::ffi` carries the
//! DockSwipe field ids.

use cocoa::base::nil;
use cocoa::foundation::NSPoint;
use core_foundation::base::TCFType;
use core_graphics::event::{CGEvent, CGEventTapLocation};
use objc::{class, msg_send, sel, sel_impl};

use crate::model::SystemAction;
use super::ffi;

/// `NSEventTypeSystemDefined`.
const NS_EVENT_TYPE_SYSTEM_DEFINED: u64 = 14;
/// Subtype identifying a symbolic-hotkey payload within a system-defined
/// event.
const NX_SUBTYPE_AUX_CONTROL_BUTTONS: i16 = 8;

fn symbolic_hotkey_id(action: SystemAction) -> Option<i64> {
    match action {
        SystemAction::MissionControl => Some(32),
        SystemAction::AppExpose => Some(33),
        SystemAction::Launchpad => Some(160),
        SystemAction::SwitchSpaceLeft => Some(79),
        SystemAction::SwitchSpaceRight => Some(81),
        SystemAction::ShowDesktop => None,
    }
}

/// Fire `action`'s symbolic hotkey, if it has one. Returns `false` for
/// `ShowDesktop` (driven by `engine::dispatch::action_to_combo` instead) and
/// for any construction failure.
pub fn trigger(action: SystemAction) -> bool {
    let Some(id) = symbolic_hotkey_id(action) else { return false };

    for key_down in [true, false] {
        let data1 = (id << 16) | ((key_down as i64) << 8);
        if !post_system_defined(data1) {
            return false;
        }
    }
    true
}

fn post_system_defined(data1: i64) -> bool {
    unsafe {
        let event: cocoa::base::id = msg_send![
            class!(NSEvent),
            otherEventWithType: NS_EVENT_TYPE_SYSTEM_DEFINED
            location: NSPoint { x: 0.0, y: 0.0 }
            modifierFlags: 0xa00u64
            timestamp: 0.0f64
            windowNumber: 0i64
            context: nil
            subtype: NX_SUBTYPE_AUX_CONTROL_BUTTONS
            data1: data1
            data2: -1i64
        ];
        if event == nil {
            return false;
        }
        let cg_event_ref: core_graphics::sys::CGEventRef = msg_send![event, CGEvent];
        if cg_event_ref.is_null() {
            return false;
        }
        let cg_event = CGEvent::wrap_under_get_rule(cg_event_ref);
        ffi::tag_self_origin(&cg_event);
        cg_event.post(CGEventTapLocation::HID);
        true
    }
}
