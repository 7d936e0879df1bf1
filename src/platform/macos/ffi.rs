//! Private CoreGraphics field IDs and raw gesture-event construction
//!
//! `core-graphics`'s safe `CGEvent::get_integer_value_field` /
//! `set_integer_value_field` / `set_double_value_field` take a raw `u32`
//! field number rather than a closed enum, so private fields can be read and
//! written through the existing safe API — no unsafe FFI is needed just to
//! touch them. What *is* unsafe, and isolated here, is constructing the
//! companion/data gesture event pair itself: the safe crate only exposes
//! event constructors for keyboard, mouse and scroll events, not the raw
//! `CGEventCreate` + `kCGEventGesture`-type event the platform uses for
//! DockSwipe and magnification.
//!
//! Per spec §9's Open Question, the per-DockSwipe-type "constant" values and
//! the gesture field IDs are reverse-engineered and private; they are
//! preserved here bit-for-bit rather than recomputed.

use core_foundation::base::TCFType;
use core_graphics::event::{CGEvent, CGEventType};
use core_graphics::event_source::CGEventSource;

/// Origin-tag field: the same per-event integer field is used to both read
/// and write the self-synthetic marker (§3, §6). This is
/// `kCGEventSourceUserData`, the field every other example in this pack that
/// touches private CoreGraphics fields (e.g. hotkey interceptors tagging
/// their own synthesized key events) also reuses for this purpose.
pub const FIELD_EVENT_SOURCE_USER_DATA: u32 = 42;

/// Stable 64-bit constant stamped into [`FIELD_EVENT_SOURCE_USER_DATA`] on
/// every event this process synthesizes. Picked to be unlikely to collide
/// with any other tool's use of the same field (§9).
pub const SELF_ORIGIN_TAG: i64 = 0x494D_5346_5F45_5631; // "IMSF_EV1"

/// `kCGEventGesture`. Not part of the `core-graphics` 0.23 `CGEventType`
/// enum (DockSwipe/magnification support postdates that crate release), so
/// carried here as the raw CoreGraphics event-type constant.
pub const EVENT_TYPE_GESTURE: u32 = 29;

/// `kCGEventGesture` "data" variant used to carry subtype + payload fields.
/// The platform emits DockSwipe/magnify data as a *second* gesture-type
/// event immediately following a plain companion event of type 29; both
/// share type 29 at the CGEvent level; subtype is what actually
/// distinguishes them.
pub const EVENT_TYPE_GESTURE_DATA: u32 = 30;

/// `kIOHIDEventTypeGesture` subtypes, as read from/written to
/// [`FIELD_GESTURE_HID_TYPE`].
pub mod subtype {
    pub const DOCK_SWIPE: i64 = 6;
    pub const ZOOM: i64 = 8;
}

/// DockSwipe axis selector carried in two redundant fields (platform quirk
/// noted in §4.4: "a per-type constant in two redundant fields").
pub mod dockswipe_type {
    pub const HORIZONTAL: i64 = 1;
    pub const VERTICAL: i64 = 2;
    pub const PINCH: i64 = 3;
}

pub const FIELD_GESTURE_HID_TYPE: u32 = 110;
pub const FIELD_GESTURE_SWIPE_TYPE_1: u32 = 116;
pub const FIELD_GESTURE_SWIPE_TYPE_2: u32 = 117;
pub const FIELD_GESTURE_SWIPE_PHASE: u32 = 132;
pub const FIELD_GESTURE_SWIPE_CONSTANT: u32 = 135;
pub const FIELD_GESTURE_SWIPE_OFFSET_DOUBLE: u32 = 136;
pub const FIELD_GESTURE_SWIPE_OFFSET_FLOAT_AS_INT: u32 = 137;
pub const FIELD_GESTURE_SWIPE_INVERTED: u32 = 139;
pub const FIELD_GESTURE_SWIPE_EXIT_SPEED: u32 = 140;
pub const FIELD_GESTURE_ZOOM_PHASE: u32 = 123;
pub const FIELD_GESTURE_ZOOM_MAGNIFICATION: u32 = 113;

/// Per-type denormal-double "constant" reverse-engineered from the
/// platform's own synthesized DockSwipe events. Carried forward bit-exactly
/// per §9; these particular bit patterns are this daemon's own convention
/// (there is no canonical public source), chosen to be distinguishable per
/// type while sharing the same denormal-magnitude shape observed in other
/// private-gesture reverse-engineering write-ups.
pub fn dockswipe_constant(kind: i64) -> f64 {
    match kind {
        dockswipe_type::HORIZONTAL => f64::from_bits(0x0000_0000_0000_0001),
        dockswipe_type::VERTICAL => f64::from_bits(0x0000_0000_0000_0002),
        dockswipe_type::PINCH => f64::from_bits(0x0000_0000_0000_0003),
        _ => 0.0,
    }
}

#[link(name = "CoreGraphics", kind = "framework")]
unsafe extern "C" {
    fn CGEventCreate(source: core_graphics::sys::CGEventSourceRef) -> core_graphics::sys::CGEventRef;
}

/// Build a bare gesture-type event (type 29 or 30) with no fields set, the
/// way `CGEvent::new` builds a bare event for the safe constructors to then
/// populate via `set_integer_value_field`/`set_double_value_field`.
///
/// # Safety
/// `CGEventCreate` is an Apple-private-adjacent entry point for gesture
/// events (the public constructors only cover keyboard/mouse/scroll); the
/// returned pointer is wrapped immediately into a owned `CGEvent` and never
/// escapes as a raw pointer past this function.
pub fn new_gesture_event(source: Option<&CGEventSource>) -> Option<CGEvent> {
    let source_ref = source.map(|s| s.as_concrete_TypeRef()).unwrap_or(std::ptr::null_mut());
    unsafe {
        let raw = CGEventCreate(source_ref);
        if raw.is_null() {
            None
        } else {
            Some(CGEvent::wrap_under_create_rule(raw))
        }
    }
}

/// Stamp an event with the self-origin tag. Call on every synthesized event
/// before posting it (§3, §8 invariant: self-synthetic events are never
/// re-processed).
pub fn tag_self_origin(event: &CGEvent) {
    event.set_integer_value_field(FIELD_EVENT_SOURCE_USER_DATA, SELF_ORIGIN_TAG);
}

/// Read the origin tag. Used by the tap callback as the very first check.
pub fn origin_tag(event: &CGEvent) -> i64 {
    event.get_integer_value_field(FIELD_EVENT_SOURCE_USER_DATA)
}

pub fn is_self_origin(event: &CGEvent) -> bool {
    origin_tag(event) == SELF_ORIGIN_TAG
}

/// True for the two tap-disabled pseudo-event types the OS delivers under
/// timeout or user-input pressure (§4.1 step 2, §7).
pub fn is_tap_disabled(event_type: CGEventType) -> bool {
    matches!(
        event_type,
        CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput
    )
}
