//! Event Source Helper (§4.6)
//!
//! Constructs synthetic events, stamps them with the self-origin marker, and
//! posts them at the correct tap location. All four methods are the only
//! places in the codebase allowed to call `CGEvent::post` — engines build
//! intent, this module is the sole point of injection.

use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTapLocation, CGEventType, ScrollEventUnit,
};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};

use crate::model::{KeyCombo, Modifiers};

use super::ffi::{self, dockswipe_constant, subtype};

/// Errors constructing or posting a synthetic event. Per §7 ("event
/// construction returns nothing: drop this frame's emission"), callers treat
/// every variant as non-fatal and simply skip the emission.
#[derive(Debug, thiserror::Error)]
pub enum EventSourceError {
    #[error("failed to create CGEventSource")]
    SourceUnavailable,
    #[error("failed to construct event")]
    ConstructionFailed,
}

pub type EventSourceResult<T> = Result<T, EventSourceError>;

/// Thin wrapper owning the `CGEventSource` used for every synthesized event.
pub struct EventSourceHelper {
    source: CGEventSource,
}

impl EventSourceHelper {
    pub fn new() -> EventSourceResult<Self> {
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .map_err(|_| EventSourceError::SourceUnavailable)?;
        Ok(Self { source })
    }

    fn modifier_flags(modifiers: Modifiers) -> CGEventFlags {
        let mut flags = CGEventFlags::empty();
        if modifiers.contains(Modifiers::CONTROL) {
            flags |= CGEventFlags::CGEventFlagControl;
        }
        if modifiers.contains(Modifiers::OPTION) {
            flags |= CGEventFlags::CGEventFlagAlternate;
        }
        if modifiers.contains(Modifiers::SHIFT) {
            flags |= CGEventFlags::CGEventFlagShift;
        }
        if modifiers.contains(Modifiers::COMMAND) {
            flags |= CGEventFlags::CGEventFlagCommand;
        }
        if modifiers.contains(Modifiers::FUNCTION) {
            flags |= CGEventFlags::CGEventFlagSecondaryFn;
        }
        flags
    }

    /// `postKeyCombo`: key-down then key-up with the combo's modifiers,
    /// tagged and posted at the HID tap.
    pub fn post_key_combo(&self, combo: KeyCombo) -> EventSourceResult<()> {
        let flags = Self::modifier_flags(combo.modifiers);
        for pressed in [true, false] {
            let event = CGEvent::new_keyboard_event(Some(&self.source), combo.key_code, pressed)
                .map_err(|_| EventSourceError::ConstructionFailed)?;
            event.set_flags(flags);
            ffi::tag_self_origin(&event);
            event.post(CGEventTapLocation::HID);
        }
        Ok(())
    }

    /// `postScroll`: two-wheel pixel-unit scroll event, continuous=1, both
    /// delta representations set, tagged and posted at the HID tap.
    pub fn post_scroll(
        &self,
        delta_y: i32,
        delta_x: i32,
        scroll_phase: i64,
        momentum_phase: i64,
    ) -> EventSourceResult<()> {
        use core_graphics::event::EventField;

        let event = CGEvent::new_scroll_event(
            Some(&self.source),
            ScrollEventUnit::Pixel,
            2,
            delta_y,
            delta_x,
            0,
        )
        .map_err(|_| EventSourceError::ConstructionFailed)?;

        event.set_integer_value_field(EventField::SCROLL_WHEEL_EVENT_IS_CONTINUOUS, 1);
        event.set_integer_value_field(EventField::SCROLL_WHEEL_EVENT_SCROLL_PHASE, scroll_phase);
        event.set_integer_value_field(EventField::SCROLL_WHEEL_EVENT_MOMENTUM_PHASE, momentum_phase);
        event.set_integer_value_field(EventField::SCROLL_WHEEL_EVENT_POINT_DELTA_AXIS_1, delta_y as i64);
        event.set_integer_value_field(EventField::SCROLL_WHEEL_EVENT_POINT_DELTA_AXIS_2, delta_x as i64);
        event.set_integer_value_field(EventField::SCROLL_WHEEL_EVENT_FIXED_PT_DELTA_AXIS_1, delta_y as i64);
        event.set_integer_value_field(EventField::SCROLL_WHEEL_EVENT_FIXED_PT_DELTA_AXIS_2, delta_x as i64);

        ffi::tag_self_origin(&event);
        event.post(CGEventTapLocation::HID);
        Ok(())
    }

    /// `postGesturePair`: the companion event (type 29, no payload) plus the
    /// data event (type 30, DockSwipe subtype) carrying all required fields
    /// (§4.4 "DockSwipe event construction"). Both posted at the session tap.
    pub fn post_dockswipe_pair(
        &self,
        dockswipe_type: i64,
        phase: i64,
        cumulative_offset: f64,
        inverted: bool,
        exit_speed: Option<f64>,
    ) -> EventSourceResult<()> {
        let companion =
            ffi::new_gesture_event(Some(&self.source)).ok_or(EventSourceError::ConstructionFailed)?;
        ffi::tag_self_origin(&companion);
        companion.set_integer_value_field(ffi::FIELD_GESTURE_HID_TYPE, subtype::DOCK_SWIPE);
        companion.post(CGEventTapLocation::Session);

        let data =
            ffi::new_gesture_event(Some(&self.source)).ok_or(EventSourceError::ConstructionFailed)?;
        ffi::tag_self_origin(&data);
        data.set_integer_value_field(ffi::FIELD_GESTURE_HID_TYPE, subtype::DOCK_SWIPE);
        data.set_integer_value_field(ffi::FIELD_GESTURE_SWIPE_TYPE_1, dockswipe_type);
        data.set_integer_value_field(ffi::FIELD_GESTURE_SWIPE_TYPE_2, dockswipe_type);
        data.set_integer_value_field(ffi::FIELD_GESTURE_SWIPE_PHASE, phase);
        data.set_double_value_field(ffi::FIELD_GESTURE_SWIPE_CONSTANT, dockswipe_constant(dockswipe_type));
        data.set_double_value_field(ffi::FIELD_GESTURE_SWIPE_OFFSET_DOUBLE, cumulative_offset);
        data.set_integer_value_field(
            ffi::FIELD_GESTURE_SWIPE_OFFSET_FLOAT_AS_INT,
            (cumulative_offset as f32).to_bits() as i64,
        );
        data.set_integer_value_field(ffi::FIELD_GESTURE_SWIPE_INVERTED, inverted as i64);
        if let Some(speed) = exit_speed {
            data.set_double_value_field(ffi::FIELD_GESTURE_SWIPE_EXIT_SPEED, speed);
        }
        data.post(CGEventTapLocation::Session);
        Ok(())
    }

    /// `postMagnify`: single gesture event (type 29, Zoom subtype), posted
    /// at the HID tap.
    pub fn post_magnify(&self, phase: i64, magnification: f64) -> EventSourceResult<()> {
        let event =
            ffi::new_gesture_event(Some(&self.source)).ok_or(EventSourceError::ConstructionFailed)?;
        ffi::tag_self_origin(&event);
        event.set_integer_value_field(ffi::FIELD_GESTURE_HID_TYPE, subtype::ZOOM);
        event.set_integer_value_field(ffi::FIELD_GESTURE_ZOOM_PHASE, phase);
        event.set_double_value_field(ffi::FIELD_GESTURE_ZOOM_MAGNIFICATION, magnification);
        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

/// Some CGEventType variants (tap-disabled pseudo-events) never carry real
/// payload; this just documents that `event_type` below is inert data in
/// that case, referenced by the interceptor's match arm.
pub fn is_real_event(event_type: CGEventType) -> bool {
    !ffi::is_tap_disabled(event_type)
}
