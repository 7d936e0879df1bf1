//! Scroll Engine (§4.3)
//!
//! Classifies incoming wheel events, applies the modifier pipeline, and for
//! smooth mode drives a physics-based animator that emits continuous-phase
//! scroll events at display refresh. The animator's state machine mirrors
//! the Idle/Dwelling/Transition shape of the teacher's `screen::edge_detector`
//! state machine, generalized to Idle/Animating/Momentum (§3).

use std::time::{Duration, Instant};

use crate::config::{ScrollConfig, SmoothLevel};

/// Raw fields read off an incoming `CGEventType::ScrollWheel` event, already
/// translated out of CoreGraphics types so this module has no platform
/// dependency.
#[derive(Debug, Clone, Copy)]
pub struct WheelEventFields {
    pub is_continuous: bool,
    pub momentum_phase: i64,
    pub scroll_phase: i64,
    pub delta_axis_1: i64,
    pub delta_axis_2: i64,
    pub command_held: bool,
    pub shift_held: bool,
    pub option_held: bool,
    pub control_held: bool,
}

impl WheelEventFields {
    /// `momentumPhase == 0 ∧ scrollPhase == 0` (§4.3).
    pub fn is_mouse_origin(&self) -> bool {
        self.momentum_phase == 0 && self.scroll_phase == 0
    }

    /// `isContinuous ∧ ¬mouseOrigin` (§4.3): returned unchanged by the
    /// scroll engine.
    pub fn is_trackpad_origin(&self) -> bool {
        self.is_continuous && !self.is_mouse_origin()
    }
}

/// Result of running the modifier pipeline + smooth decision over one wheel
/// event.
#[derive(Debug)]
pub enum WheelOutcome {
    /// Trackpad-origin or otherwise untouched — return the event verbatim.
    Unchanged,
    /// Mutated integer/fixed-point/point deltas to write back, in that
    /// order (§4.3 "platform quirk").
    Mutated { delta_axis_1: i64, delta_axis_2: i64 },
    /// Smooth mode consumed this event; suppress it. The animator has
    /// already been fed.
    SuppressedForAnimator,
    /// Command+wheel zoom consumed this event; suppress it. Caller should
    /// also drive [`ZoomGesture`] with the computed magnification delta.
    SuppressedForZoom { magnification_delta: f64 },
}

/// Applies the five-step modifier pipeline (§4.3) to a mouse-origin wheel
/// event and decides whether smooth mode should consume it.
pub fn process_wheel_event(event: &WheelEventFields, config: &ScrollConfig, external_mouse: bool) -> WheelOutcome {
    if event.is_trackpad_origin() {
        return WheelOutcome::Unchanged;
    }
    if !event.is_mouse_origin() {
        return WheelOutcome::Unchanged;
    }

    // 1. Command + wheel = zoom.
    if config.command_zoom && event.command_held {
        let dominant = if event.delta_axis_1.abs() >= event.delta_axis_2.abs() {
            event.delta_axis_1
        } else {
            event.delta_axis_2
        };
        return WheelOutcome::SuppressedForZoom { magnification_delta: dominant as f64 / 50.0 };
    }

    let mut y = event.delta_axis_1;
    let mut x = event.delta_axis_2;
    let mut changed = false;

    // 2. Shift -> horizontal axis swap.
    let shift_swap = config.shift_horizontal && event.shift_held;
    if shift_swap {
        x = y;
        y = 0;
        changed = true;
    }

    // 3. Option -> precision scaling (mutually exclusive with smooth).
    let option_precision = config.option_precision && event.option_held;
    if option_precision {
        y = (y as f64 * config.precision_multiplier).round() as i64;
        x = (x as f64 * config.precision_multiplier).round() as i64;
        changed = true;
    }

    // 4. Control -> fast scaling.
    if config.control_fast && event.control_held {
        y = (y as f64 * config.fast_multiplier).round() as i64;
        x = (x as f64 * config.fast_multiplier).round() as i64;
        changed = true;
    }

    // 5. Reversal.
    if config.reverse && external_mouse {
        y = -y;
        x = -x;
        changed = true;
    }

    let smooth_applies = config.smooth_level != SmoothLevel::Off
        && !shift_swap
        && !option_precision
        && !(config.control_fast && event.control_held);

    if smooth_applies {
        return WheelOutcome::SuppressedForAnimator;
    }

    if changed {
        WheelOutcome::Mutated { delta_axis_1: y, delta_axis_2: x }
    } else {
        WheelOutcome::Unchanged
    }
}

/// Tunable parameters for one smooth-scroll preset (§4.3's parameter table).
#[derive(Debug, Clone, Copy)]
pub struct AnimatorPreset {
    pub base_duration: Duration,
    pub drag_coefficient: f64,
    pub drag_exponent: f64,
    pub px_per_tick: f64,
    pub max_velocity: f64,
    pub stop_speed: f64,
    pub input_timeout: Duration,
}

impl AnimatorPreset {
    pub const SMOOTH: AnimatorPreset = AnimatorPreset {
        base_duration: Duration::from_millis(140),
        drag_coefficient: 18.0,
        drag_exponent: 0.85,
        px_per_tick: 60.0,
        max_velocity: 2500.0,
        stop_speed: 8.0,
        input_timeout: Duration::from_millis(80),
    };

    pub const VERY_SMOOTH: AnimatorPreset = AnimatorPreset {
        base_duration: Duration::from_millis(220),
        drag_coefficient: 25.0,
        drag_exponent: 0.65,
        px_per_tick: 60.0 * 1.3,
        max_velocity: 2500.0,
        stop_speed: 8.0,
        input_timeout: Duration::from_millis(80),
    };

    pub fn for_level(level: SmoothLevel) -> Option<AnimatorPreset> {
        match level {
            SmoothLevel::Off => None,
            SmoothLevel::Smooth => Some(AnimatorPreset::SMOOTH),
            SmoothLevel::VerySmooth => Some(AnimatorPreset::VERY_SMOOTH),
        }
    }
}

/// Animator state-machine phase (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorPhase {
    Idle,
    Animating,
    Momentum,
}

/// Per-axis animation state. The animator runs one of these per axis, while
/// sharing phase and the began/ended flags across both (they always emit
/// together in a single `postScroll` call per frame, §4.3).
#[derive(Debug, Clone, Copy, Default)]
struct AxisState {
    target: f64,
    already_scrolled: f64,
    velocity: f64,
    anim_start: Option<Instant>,
    duration: Duration,
    last_delta: f64,
}

impl AxisState {
    fn begin(&mut self, px_to_add: f64, duration: Duration, now: Instant) {
        self.target = px_to_add;
        self.already_scrolled = 0.0;
        self.anim_start = Some(now);
        self.duration = duration;
        self.velocity = 0.0;
    }

    fn accumulate(&mut self, px_to_add: f64, duration: Duration, now: Instant) {
        self.target = (self.target - self.already_scrolled) + px_to_add;
        self.already_scrolled = 0.0;
        self.anim_start = Some(now);
        self.duration = duration;
    }

    fn elapsed_fraction(&self, now: Instant) -> f64 {
        let Some(start) = self.anim_start else { return 1.0 };
        let elapsed = now.duration_since(start).as_secs_f64();
        let total = self.duration.as_secs_f64().max(f64::EPSILON);
        (elapsed / total).min(1.0)
    }
}

/// One frame's emitted scroll event, matching `postScroll`'s parameters.
#[derive(Debug, Clone, Copy)]
pub struct ScrollEmission {
    pub delta_y: i32,
    pub delta_x: i32,
    pub scroll_phase: i64,
    pub momentum_phase: i64,
}

/// Smooth-scroll animator (§3, §4.3). Owned behind a mutex by the
/// interceptor core; lock scopes around calling these methods are kept
/// short per §5 item 2.
pub struct Animator {
    preset: AnimatorPreset,
    phase: AnimatorPhase,
    y: AxisState,
    x: AxisState,
    needs_began: bool,
    momentum_began: bool,
    last_input: Option<Instant>,
    last_frame: Option<Instant>,
}

impl Animator {
    pub fn new(preset: AnimatorPreset) -> Self {
        Self {
            preset,
            phase: AnimatorPhase::Idle,
            y: AxisState::default(),
            x: AxisState::default(),
            needs_began: false,
            momentum_began: false,
            last_input: None,
            last_frame: None,
        }
    }

    pub fn phase(&self) -> AnimatorPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == AnimatorPhase::Idle
    }

    /// Feed one wheel tick into the animator (§4.3 "On wheel input").
    pub fn on_input(&mut self, tick_delta_y: i64, tick_delta_x: i64, now: Instant) {
        let px_y = tick_delta_y as f64 * self.preset.px_per_tick;
        let px_x = tick_delta_x as f64 * self.preset.px_per_tick;

        let fresh = matches!(self.phase, AnimatorPhase::Idle | AnimatorPhase::Momentum);
        if fresh {
            self.y.begin(px_y, self.preset.base_duration, now);
            self.x.begin(px_x, self.preset.base_duration, now);
            self.needs_began = true;
            self.momentum_began = false;
        } else {
            self.y.accumulate(px_y, self.preset.base_duration, now);
            self.x.accumulate(px_x, self.preset.base_duration, now);
        }

        self.last_input = Some(now);
        self.phase = AnimatorPhase::Animating;
    }

    /// Drive one display-refresh frame (§4.3 "On each frame"). Returns the
    /// ordered emissions for this frame, per §4.3's "Emission order".
    pub fn on_frame(&mut self, now: Instant) -> Vec<ScrollEmission> {
        let dt = self.last_frame.map(|f| now.duration_since(f).as_secs_f64()).unwrap_or(0.0);
        self.last_frame = Some(now);

        let mut emissions = Vec::with_capacity(3);
        let mut should_send_gesture_ended = false;

        match self.phase {
            AnimatorPhase::Idle => return emissions,
            AnimatorPhase::Animating => {
                let timed_out = self
                    .last_input
                    .map(|t| now.duration_since(t) > self.preset.input_timeout)
                    .unwrap_or(false);

                if timed_out {
                    self.exit_to_momentum_on_timeout(now);
                    should_send_gesture_ended = true;
                } else if self.y.elapsed_fraction(now) >= 1.0 && self.x.elapsed_fraction(now) >= 1.0 {
                    self.finalize_into_momentum(now);
                    should_send_gesture_ended = true;
                } else {
                    self.ease_step(now);
                }
            }
            AnimatorPhase::Momentum => {
                self.momentum_step(dt);
            }
        }

        if self.needs_began && self.phase != AnimatorPhase::Momentum {
            emissions.push(ScrollEmission { delta_y: 0, delta_x: 0, scroll_phase: 1, momentum_phase: 0 });
            self.needs_began = false;
        }
        if should_send_gesture_ended {
            emissions.push(ScrollEmission { delta_y: 0, delta_x: 0, scroll_phase: 4, momentum_phase: 0 });
        }

        match self.phase {
            AnimatorPhase::Animating => {
                emissions.push(ScrollEmission {
                    delta_y: self.y.last_delta.round() as i32,
                    delta_x: self.x.last_delta.round() as i32,
                    scroll_phase: 2,
                    momentum_phase: 0,
                });
            }
            AnimatorPhase::Momentum => {
                let momentum_phase = if !self.momentum_began {
                    self.momentum_began = true;
                    1
                } else {
                    2
                };
                emissions.push(ScrollEmission {
                    delta_y: self.y.last_delta.round() as i32,
                    delta_x: self.x.last_delta.round() as i32,
                    scroll_phase: 0,
                    momentum_phase,
                });

                if self.y.velocity.abs() < self.preset.stop_speed
                    && self.x.velocity.abs() < self.preset.stop_speed
                {
                    emissions.push(ScrollEmission { delta_y: 0, delta_x: 0, scroll_phase: 0, momentum_phase: 3 });
                    emissions.push(ScrollEmission { delta_y: 0, delta_x: 0, scroll_phase: 4, momentum_phase: 0 });
                    self.reset_to_idle();
                }
            }
            AnimatorPhase::Idle => {}
        }

        emissions
    }

    fn exit_velocity(axis: &AxisState, preset: &AnimatorPreset, t: f64, clamp_fraction: f64) -> f64 {
        let speed = (2.0 * (1.0 - t)) * (axis.target / axis.duration.as_secs_f64().max(f64::EPSILON));
        speed.clamp(-preset.max_velocity * clamp_fraction, preset.max_velocity * clamp_fraction)
    }

    fn exit_to_momentum_on_timeout(&mut self, now: Instant) {
        let ty = self.y.elapsed_fraction(now);
        let tx = self.x.elapsed_fraction(now);
        self.y.velocity = Self::exit_velocity(&self.y, &self.preset, ty, 0.7);
        self.x.velocity = Self::exit_velocity(&self.x, &self.preset, tx, 0.7);
        self.y.last_delta = 0.0;
        self.x.last_delta = 0.0;
        self.phase = AnimatorPhase::Momentum;
        self.momentum_began = false;
    }

    fn finalize_into_momentum(&mut self, _now: Instant) {
        let remaining_y = self.y.target - self.y.already_scrolled;
        let remaining_x = self.x.target - self.x.already_scrolled;
        self.y.last_delta = remaining_y;
        self.x.last_delta = remaining_x;
        self.y.already_scrolled = self.y.target;
        self.x.already_scrolled = self.x.target;

        let scale = 0.5 * self.preset.max_velocity;
        self.y.velocity = remaining_y.signum() * scale.min(remaining_y.abs() * 10.0);
        self.x.velocity = remaining_x.signum() * scale.min(remaining_x.abs() * 10.0);
        self.phase = AnimatorPhase::Momentum;
        self.momentum_began = false;
    }

    fn ease_step(&mut self, now: Instant) {
        for axis in [&mut self.y, &mut self.x] {
            let t = axis.elapsed_fraction(now);
            let eased = 1.0 - (1.0 - t).powi(2);
            let position = axis.target * eased;
            axis.last_delta = position - axis.already_scrolled;
            axis.already_scrolled = position;
        }
    }

    fn momentum_step(&mut self, dt: f64) {
        for axis in [&mut self.y, &mut self.x] {
            axis.last_delta = axis.velocity * dt;
            let drag = axis.velocity.signum()
                * axis.velocity.abs().powf(self.preset.drag_exponent)
                * self.preset.drag_coefficient
                * dt;
            if drag.abs() >= axis.velocity.abs() {
                axis.velocity = 0.0;
            } else {
                axis.velocity -= drag;
            }
        }
    }

    fn reset_to_idle(&mut self) {
        self.phase = AnimatorPhase::Idle;
        self.y = AxisState::default();
        self.x = AxisState::default();
        self.needs_began = false;
        self.momentum_began = false;
        self.last_input = None;
        self.last_frame = None;
    }
}

/// Command+wheel magnification gesture (§4.3 step 1). A trailing ~300ms
/// timer after the last wheel tick emits the "ended" phase; the interceptor
/// owns the actual timer and calls [`ZoomGesture::command_released`] or lets
/// the timer fire.
pub struct ZoomGesture {
    active: bool,
}

impl Default for ZoomGesture {
    fn default() -> Self {
        Self { active: false }
    }
}

/// Trailing-end delay for an in-progress Command+wheel zoom (§4.3).
pub const ZOOM_END_DELAY: Duration = Duration::from_millis(300);

impl ZoomGesture {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns `true` if this call should emit a "begin" (magnification=0)
    /// before the "changed" event for `magnification_delta`.
    pub fn on_wheel_tick(&mut self) -> bool {
        let should_begin = !self.active;
        self.active = true;
        should_begin
    }

    pub fn end(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ScrollConfig {
        ScrollConfig::default()
    }

    #[test]
    fn trackpad_origin_is_untouched() {
        let event = WheelEventFields {
            is_continuous: true,
            momentum_phase: 0,
            scroll_phase: 2,
            delta_axis_1: 5,
            delta_axis_2: 0,
            command_held: false,
            shift_held: false,
            option_held: false,
            control_held: false,
        };
        assert!(matches!(process_wheel_event(&event, &base_config(), true), WheelOutcome::Unchanged));
    }

    #[test]
    fn reversal_negates_mouse_origin_deltas() {
        let mut config = base_config();
        config.reverse = true;
        config.smooth_level = SmoothLevel::Off;
        config.option_precision = false;
        config.control_fast = false;
        config.shift_horizontal = false;

        let event = WheelEventFields {
            is_continuous: false,
            momentum_phase: 0,
            scroll_phase: 0,
            delta_axis_1: 3,
            delta_axis_2: 0,
            command_held: false,
            shift_held: false,
            option_held: false,
            control_held: false,
        };

        match process_wheel_event(&event, &config, true) {
            WheelOutcome::Mutated { delta_axis_1, .. } => assert_eq!(delta_axis_1, -3),
            other => panic!("expected mutated outcome, got {other:?}"),
        }
    }

    #[test]
    fn reversal_applied_twice_is_identity() {
        let mut config = base_config();
        config.reverse = true;
        config.smooth_level = SmoothLevel::Off;
        config.option_precision = false;
        config.control_fast = false;
        config.shift_horizontal = false;

        let event = WheelEventFields {
            is_continuous: false,
            momentum_phase: 0,
            scroll_phase: 0,
            delta_axis_1: 3,
            delta_axis_2: -2,
            command_held: false,
            shift_held: false,
            option_held: false,
            control_held: false,
        };

        let once = match process_wheel_event(&event, &config, true) {
            WheelOutcome::Mutated { delta_axis_1, delta_axis_2 } => (delta_axis_1, delta_axis_2),
            _ => panic!("expected mutated"),
        };
        let mut reapplied = event;
        reapplied.delta_axis_1 = once.0;
        reapplied.delta_axis_2 = once.1;
        let twice = match process_wheel_event(&reapplied, &config, true) {
            WheelOutcome::Mutated { delta_axis_1, delta_axis_2 } => (delta_axis_1, delta_axis_2),
            _ => panic!("expected mutated"),
        };
        assert_eq!(twice, (event.delta_axis_1, event.delta_axis_2));
    }

    #[test]
    fn smooth_mode_suppresses_and_option_bypasses_it() {
        let mut config = base_config();
        config.smooth_level = SmoothLevel::Smooth;

        let mut event = WheelEventFields {
            is_continuous: false,
            momentum_phase: 0,
            scroll_phase: 0,
            delta_axis_1: 3,
            delta_axis_2: 0,
            command_held: false,
            shift_held: false,
            option_held: false,
            control_held: false,
        };
        assert!(matches!(
            process_wheel_event(&event, &config, true),
            WheelOutcome::SuppressedForAnimator
        ));

        event.option_held = true;
        assert!(!matches!(
            process_wheel_event(&event, &config, true),
            WheelOutcome::SuppressedForAnimator
        ));
    }

    #[test]
    fn animator_emits_began_then_changed_then_reaches_momentum() {
        let mut animator = Animator::new(AnimatorPreset::SMOOTH);
        let t0 = Instant::now();
        animator.on_input(3, 0, t0);

        let first = animator.on_frame(t0 + Duration::from_millis(16));
        assert_eq!(first[0].scroll_phase, 1);
        assert!(first.iter().any(|e| e.scroll_phase == 2));

        // Advance past the base duration to force the finalize branch.
        let after_duration = t0 + Duration::from_millis(200);
        let frame = animator.on_frame(after_duration);
        assert_eq!(animator.phase(), AnimatorPhase::Momentum);
        assert!(frame.iter().any(|e| e.scroll_phase == 4));
    }
}
