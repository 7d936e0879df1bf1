//! Gesture Engine (§4.4)
//!
//! Tracks a middle-button drag through discrete and continuous modes and
//! computes the DockSwipe unit conversions. Event *construction* (the actual
//! `CGEvent` field writes) lives in `platform::macos::event_source`; this
//! module only decides what should be emitted.

use std::time::{Duration, Instant};

use crate::config::GestureConfig;
use crate::model::{Action, DragDirection, DragDirectionMapping};

/// DockSwipe axis a continuous-capable system action animates along (§4.4
/// step 1). Re-exported through `model::action` so `SystemAction` can name
/// its axis without a circular `engine -> model -> engine` import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockSwipeAxis {
    Horizontal,
    Vertical,
    Pinch,
}

impl DockSwipeAxis {
    pub fn dockswipe_type(self) -> i64 {
        use crate::platform::macos::ffi::dockswipe_type::*;
        match self {
            DockSwipeAxis::Horizontal => HORIZONTAL,
            DockSwipeAxis::Vertical => VERTICAL,
            DockSwipeAxis::Pinch => PINCH,
        }
    }
}

/// Retransmit schedule for a dropped end event (§4.4, §9: "bound the retry
/// count at two").
pub const END_RETRANSMIT_DELAYS: [Duration; 2] = [Duration::from_millis(300), Duration::from_millis(500)];

/// `originOffsetForOneSpace` (§4.4 step 3).
fn origin_offset_for_one_space(n_spaces: u32) -> f64 {
    if n_spaces >= 2 {
        1.0 + 1.0 / (n_spaces as f64 - 1.0)
    } else {
        2.0
    }
}

/// Convert an accumulated pixel offset to DockSwipe units (§4.4 step 3).
/// Sign convention: drag direction is inverted with respect to pixel deltas
/// (up/left negative).
pub fn pixels_to_dockswipe_units(
    axis: DockSwipeAxis,
    pixels: f64,
    n_spaces: u32,
    screen_width: f64,
    screen_height: f64,
) -> f64 {
    let magnitude = match axis {
        DockSwipeAxis::Horizontal => {
            (pixels * origin_offset_for_one_space(n_spaces)) / (screen_width + 63.0)
        }
        DockSwipeAxis::Vertical | DockSwipeAxis::Pinch => pixels / screen_height,
    };
    -magnitude
}

/// Discrete-trigger middle-button tracking state (§4.4 "Discrete trigger
/// mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisLock {
    Unset,
    Horizontal,
    Vertical,
}

/// Result of feeding one drag sample or button transition into the gesture
/// engine.
#[derive(Debug)]
pub enum GestureOutcome {
    /// Nothing to do; return the event unchanged.
    PassThrough,
    /// Suppress the raw event; a discrete action was (or will be) executed
    /// separately via the dispatcher.
    Suppress,
    /// Execute this action immediately (discrete trigger committed, or
    /// click-style action on up).
    ExecuteAction(Action),
    /// Enter continuous mode: enable the HID tap, dissociate the cursor,
    /// and emit a DockSwipe begin with this initial offset.
    BeginContinuous { axis: DockSwipeAxis, initial_offset_px: f64 },
    /// Emit a DockSwipe changed event with this frame's delta.
    ContinuousChanged { delta_px: f64 },
    /// End the continuous gesture: disable the HID tap, re-associate the
    /// cursor, emit DockSwipe end with the given exit speed, and schedule
    /// the two retransmits.
    EndContinuous { exit_speed: f64 },
    /// Forced cancel (teardown while a gesture is active): emit DockSwipe
    /// cancelled, same cleanup as `EndContinuous` otherwise.
    CancelContinuous,
}

/// Owns the middle-button drag and continuous-gesture state for one
/// interceptor instance (§3 "Interceptor state").
pub struct GestureEngine {
    start: Option<(f64, f64)>,
    committed: bool,
    axis_lock: AxisLock,
    continuous_active: bool,
    swipe_axis: Option<DockSwipeAxis>,
    cached_space_count: u32,
    cumulative_offset: f64,
    last_delta: f64,
    inverted: bool,
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self {
            start: None,
            committed: false,
            axis_lock: AxisLock::Unset,
            continuous_active: false,
            swipe_axis: None,
            cached_space_count: 1,
            cumulative_offset: 0.0,
            last_delta: 0.0,
            inverted: false,
        }
    }
}

impl GestureEngine {
    pub fn is_continuous_active(&self) -> bool {
        self.continuous_active
    }

    /// The axis locked in for the active (or just-ended) continuous gesture.
    pub fn swipe_axis(&self) -> Option<DockSwipeAxis> {
        self.swipe_axis
    }

    /// Cumulative DockSwipe-unit offset since the continuous gesture began.
    pub fn cumulative_offset(&self) -> f64 {
        self.cumulative_offset
    }

    /// Drag-start point in screen coordinates, while a middle-button drag is
    /// in progress.
    pub fn drag_start(&self) -> Option<(f64, f64)> {
        self.start
    }

    /// Auxiliary button #2 down (§4.4 discrete trigger mode).
    pub fn on_middle_down(&mut self, x: f64, y: f64, middle_click_action: Action) -> GestureOutcome {
        self.start = Some((x, y));
        self.committed = false;
        self.axis_lock = AxisLock::Unset;
        if matches!(middle_click_action, Action::Inert(crate::model::InertKind::PassThrough)) {
            GestureOutcome::PassThrough
        } else {
            GestureOutcome::Suppress
        }
    }

    /// A drag sample while the middle button is held.
    pub fn on_drag(
        &mut self,
        x: f64,
        y: f64,
        config: &GestureConfig,
        directions: &DragDirectionMapping,
        n_spaces: u32,
        screen_width: f64,
        screen_height: f64,
    ) -> GestureOutcome {
        let Some((sx, sy)) = self.start else { return GestureOutcome::PassThrough };

        if self.continuous_active {
            let (dx, dy) = (x - sx, y - sy);
            let pixels = match self.swipe_axis.unwrap() {
                DockSwipeAxis::Horizontal => dx,
                _ => dy,
            };
            let units =
                pixels_to_dockswipe_units(self.swipe_axis.unwrap(), pixels, n_spaces, screen_width, screen_height);
            let delta = units - self.cumulative_offset;
            self.cumulative_offset = units;
            self.last_delta = delta;
            return GestureOutcome::ContinuousChanged { delta_px: delta };
        }

        if self.committed {
            return GestureOutcome::Suppress;
        }

        let dx = x - sx;
        let dy = y - sy;
        let threshold = config.drag_threshold_px;
        let half_threshold = threshold / 2.0;

        let axis_candidate = if dx.abs().max(dy.abs()) >= half_threshold && self.axis_lock == AxisLock::Unset {
            Some(DragDirection::dominant(dx, dy))
        } else {
            None
        };

        if let Some(direction) = axis_candidate {
            let action = directions.get(direction);
            let continuous_ok = config.continuous_enabled
                && directions.has_continuous_capable()
                && action.is_some_and(Action::is_continuous_capable);

            if continuous_ok {
                self.axis_lock =
                    if direction.is_horizontal() { AxisLock::Horizontal } else { AxisLock::Vertical };
                let axis = match action.unwrap() {
                    Action::System(sys) => sys.dockswipe_axis(),
                    _ => unreachable!("continuous_ok implies a System action"),
                };
                self.swipe_axis = Some(axis);
                self.cached_space_count = n_spaces;
                self.continuous_active = true;

                let pixels = match axis {
                    DockSwipeAxis::Horizontal => dx,
                    _ => dy,
                };
                let offset = pixels_to_dockswipe_units(axis, pixels, n_spaces, screen_width, screen_height);
                self.cumulative_offset = offset;
                self.last_delta = offset;
                return GestureOutcome::BeginContinuous { axis, initial_offset_px: offset };
            }

            if dx.abs().max(dy.abs()) >= threshold {
                self.committed = true;
                self.axis_lock =
                    if direction.is_horizontal() { AxisLock::Horizontal } else { AxisLock::Vertical };
                if let Some(action) = action {
                    return GestureOutcome::ExecuteAction(action);
                }
                return GestureOutcome::Suppress;
            }
        }

        GestureOutcome::Suppress
    }

    /// Middle button released.
    pub fn on_middle_up(&mut self, middle_click_action: Action) -> GestureOutcome {
        let outcome = if self.continuous_active {
            self.continuous_active = false;
            GestureOutcome::EndContinuous { exit_speed: self.last_delta * 100.0 }
        } else if self.committed {
            GestureOutcome::Suppress
        } else if matches!(middle_click_action, Action::Inert(crate::model::InertKind::PassThrough)) {
            GestureOutcome::PassThrough
        } else {
            GestureOutcome::ExecuteAction(middle_click_action)
        };

        self.start = None;
        self.committed = false;
        self.axis_lock = AxisLock::Unset;
        self.swipe_axis = None;
        outcome
    }

    /// Forced stop (interceptor `stop()`, §4.1).
    pub fn force_cancel(&mut self) -> Option<GestureOutcome> {
        if !self.continuous_active {
            return None;
        }
        self.continuous_active = false;
        self.start = None;
        self.committed = false;
        self.axis_lock = AxisLock::Unset;
        self.swipe_axis = None;
        Some(GestureOutcome::CancelContinuous)
    }
}

/// End-retransmit work items scheduled after a DockSwipe end (§4.4, §9).
/// Cancelled on the next `begin` or on teardown.
pub struct EndRetransmitSchedule {
    pub scheduled_at: Instant,
}

impl EndRetransmitSchedule {
    pub fn new(now: Instant) -> Self {
        Self { scheduled_at: now }
    }

    pub fn fire_times(&self) -> [Instant; 2] {
        [self.scheduled_at + END_RETRANSMIT_DELAYS[0], self.scheduled_at + END_RETRANSMIT_DELAYS[1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nspaces_one_uses_origin_offset_two() {
        assert_eq!(origin_offset_for_one_space(1), 2.0);
    }

    #[test]
    fn nspaces_above_one_follows_formula() {
        assert_eq!(origin_offset_for_one_space(3), 1.0 + 1.0 / 2.0);
    }

    #[test]
    fn horizontal_pixels_convert_using_screen_width_plus_63() {
        let units = pixels_to_dockswipe_units(DockSwipeAxis::Horizontal, -100.0, 3, 1920.0, 1080.0);
        let expected = -((-100.0 * 1.5) / (1920.0 + 63.0));
        assert!((units - expected).abs() < 1e-9);
    }

    #[test]
    fn vertical_pixels_convert_by_screen_height() {
        let units = pixels_to_dockswipe_units(DockSwipeAxis::Vertical, 90.0, 4, 1920.0, 1080.0);
        assert!((units - (-(90.0 / 1080.0))).abs() < 1e-9);
    }
}
