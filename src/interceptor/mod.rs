//! Interceptor Core (§4.1)
//!
//! Owns the session-level and HID-level `CGEventTap`s, routes classified
//! events to the scroll/gesture/dispatch engines, and is the only place that
//! decides retain/modify/suppress for the OS. Runs entirely on one dedicated
//! OS thread (mirroring the teacher's `input::macos::MacOSInputCapture`
//! event-tap thread), since `CGEventTap` callbacks must run on the thread
//! that registered their run-loop source.
//!
//! No `CVDisplayLink` binding exists anywhere in this crate's stack, so the
//! animator's per-frame tick piggybacks on the same run-loop poll already
//! used to drive tap callbacks: `CFRunLoop::run_in_mode` is called with a
//! ~16ms budget instead of the teacher's 100ms, turning the poll into an
//! approximate 60Hz frame driver without a second thread or timer source.

#![cfg(target_os = "macos")]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock as StdRwLock};
use std::time::{Duration, Instant};

use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_graphics::event::{
    CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventType, EventField,
};

use crate::config::GestureConfig;
use crate::engine::dispatch::{self, ButtonOutcome, KeyOutcome};
use crate::engine::gesture::{EndRetransmitSchedule, GestureEngine, GestureOutcome};
use crate::engine::scroll::{self, Animator, ScrollEmission, WheelEventFields, WheelOutcome, ZoomGesture, ZOOM_END_DELAY};
use crate::model::{Action, KeyCombo, Modifiers};
use crate::platform::macos::ffi;
use crate::platform::macos::workspace::FrontmostAppTracker;
use crate::platform::macos::EventSourceHelper;
use crate::settings::{SettingsBridge, SettingsSnapshot};

/// Errors starting or stopping the interceptor.
#[derive(Debug, thiserror::Error)]
pub enum InterceptorError {
    #[error("interceptor already running")]
    AlreadyRunning,
    #[error("interceptor not running")]
    NotRunning,
    #[error("failed to create event tap (check accessibility permission)")]
    TapCreationFailed,
    #[error("failed to construct event source: {0}")]
    EventSource(#[from] crate::platform::macos::EventSourceError),
}

/// Shared view of the device registry's externally-observed state, read by
/// the interceptor thread and written by whatever task owns the async
/// `DeviceRegistry` (§4.2's external-mouse/keyboard presence feeding §4.5's
/// keyboard-pipeline gate and §4.3's reversal/assume-external checks).
#[derive(Default)]
pub struct DevicePresence {
    pub external_mouse: StdRwLock<bool>,
    pub external_keyboard: StdRwLock<bool>,
}

impl DevicePresence {
    fn mouse(&self) -> bool {
        *self.external_mouse.read().unwrap()
    }
    fn keyboard(&self) -> bool {
        *self.external_keyboard.read().unwrap()
    }
}

/// Per-event mutable state the callback closures share. Lives behind an
/// `Rc<RefCell<_>>` because both taps' callbacks run on the same thread that
/// created them — no cross-thread sharing, so no `Mutex` is needed here
/// (unlike the teacher's `mouse_state`/`keyboard_state`, which were read from
/// outside the capture thread).
struct EngineState {
    gesture: GestureEngine,
    animator: Option<Animator>,
    zoom: ZoomGesture,
    event_source: EventSourceHelper,
    hid_drag_dx: f64,
    hid_drag_dy: f64,
    screen_width: f64,
    screen_height: f64,
    n_spaces: u32,
    end_retransmit: Option<PendingRetransmit>,
    last_wheel_tick: Option<Instant>,
    needs_hid_tap_enabled: bool,
    needs_hid_tap_disabled: bool,
}

/// A DockSwipe "end" that must be retransmitted up to twice more (§4.4, §9),
/// since the OS is known to occasionally drop the first end event.
struct PendingRetransmit {
    dockswipe_type: i64,
    cumulative_offset: f64,
    exit_speed: f64,
    schedule: EndRetransmitSchedule,
    fired: [bool; 2],
}

impl EngineState {
    fn new(event_source: EventSourceHelper, screen_width: f64, screen_height: f64) -> Self {
        Self {
            gesture: GestureEngine::default(),
            animator: None,
            zoom: ZoomGesture::default(),
            event_source,
            hid_drag_dx: 0.0,
            hid_drag_dy: 0.0,
            screen_width,
            screen_height,
            n_spaces: crate::platform::macos::managed_space_count(),
            end_retransmit: None,
            last_wheel_tick: None,
            needs_hid_tap_enabled: false,
            needs_hid_tap_disabled: false,
        }
    }

    fn emit_scroll(&self, emissions: &[ScrollEmission]) {
        for e in emissions {
            let _ = self.event_source.post_scroll(e.delta_y, e.delta_x, e.scroll_phase, e.momentum_phase);
        }
    }

    /// Handle one gesture outcome: post the corresponding DockSwipe/key event
    /// and flip the HID-tap enable flags the run loop reads after this
    /// callback returns (§4.1: "enable the HID tap only during continuous
    /// gestures").
    fn apply_gesture_outcome(&mut self, outcome: GestureOutcome) -> Option<crate::model::Action> {
        match outcome {
            GestureOutcome::PassThrough => None,
            GestureOutcome::Suppress => None,
            GestureOutcome::ExecuteAction(action) => Some(action),
            GestureOutcome::BeginContinuous { axis, initial_offset_px } => {
                self.needs_hid_tap_enabled = true;
                self.hid_drag_dx = 0.0;
                self.hid_drag_dy = 0.0;
                let _ = self.event_source.post_dockswipe_pair(
                    axis.dockswipe_type(),
                    1,
                    initial_offset_px,
                    false,
                    None,
                );
                None
            }
            GestureOutcome::ContinuousChanged { delta_px: _ } => {
                let axis = self.gesture.swipe_axis().expect("continuous gesture has a locked axis");
                let _ = self.event_source.post_dockswipe_pair(
                    axis.dockswipe_type(),
                    2,
                    self.gesture.cumulative_offset(),
                    false,
                    None,
                );
                None
            }
            GestureOutcome::EndContinuous { exit_speed } => {
                self.needs_hid_tap_disabled = true;
                let axis = self.gesture.swipe_axis().expect("continuous gesture has a locked axis");
                let dockswipe_type = axis.dockswipe_type();
                let cumulative_offset = self.gesture.cumulative_offset();
                let _ = self.event_source.post_dockswipe_pair(
                    dockswipe_type,
                    4,
                    cumulative_offset,
                    false,
                    Some(exit_speed),
                );
                self.end_retransmit = Some(PendingRetransmit {
                    dockswipe_type,
                    cumulative_offset,
                    exit_speed,
                    schedule: EndRetransmitSchedule::new(Instant::now()),
                    fired: [false, false],
                });
                None
            }
            GestureOutcome::CancelContinuous => {
                self.needs_hid_tap_disabled = true;
                let axis = self.gesture.swipe_axis().expect("continuous gesture has a locked axis");
                let _ = self.event_source.post_dockswipe_pair(axis.dockswipe_type(), 3, self.gesture.cumulative_offset(), false, None);
                self.end_retransmit = None;
                None
            }
        }
    }

    fn execute_action(&self, action: Action) {
        if let Action::System(system) = action {
            if dispatch::requires_symbolic_hotkey(system) {
                crate::platform::macos::system_action::trigger(system);
                return;
            }
        }
        if let Some(combo) = dispatch::action_to_combo(action) {
            let _ = self.event_source.post_key_combo(combo);
        }
    }
}

/// The running interceptor. `start` spawns the tap thread; `stop` signals it
/// to tear down and joins it.
pub struct Interceptor {
    running: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl Default for Interceptor {
    fn default() -> Self {
        Self { running: Arc::new(AtomicBool::new(false)), handle: None }
    }
}

impl Interceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the tap thread. `screen_size` is read once at startup (§4.4's
    /// DockSwipe pixel-to-unit conversion needs it); a real multi-monitor,
    /// display-reconfiguration-aware implementation would refresh it on
    /// `NSApplicationDidChangeScreenParametersNotification`, out of scope
    /// here.
    pub fn start(
        &mut self,
        settings: Arc<SettingsBridge>,
        presence: Arc<DevicePresence>,
        frontmost: FrontmostAppTracker,
        screen_size: (f64, f64),
    ) -> Result<(), InterceptorError> {
        if self.running.swap(true, Ordering::SeqCst) {
            self.running.store(false, Ordering::SeqCst);
            return Err(InterceptorError::AlreadyRunning);
        }

        let running = self.running.clone();
        let event_source = EventSourceHelper::new()?;
        let state = Rc::new(RefCell::new(EngineState::new(event_source, screen_size.0, screen_size.1)));

        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel::<Result<(), InterceptorError>>(0);

        let handle = std::thread::spawn(move || {
            run_tap_thread(running, settings, presence, frontmost, state, ready_tx);
        });

        match ready_rx.recv().unwrap_or(Err(InterceptorError::TapCreationFailed)) {
            Ok(()) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                let _ = handle.join();
                Err(e)
            }
        }
    }

    pub fn stop(&mut self) -> Result<(), InterceptorError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(InterceptorError::NotRunning);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

/// Body of the dedicated tap thread: build both taps, add their run-loop
/// sources, then poll the run loop at a ~60Hz cadence until `running` flips
/// false, driving the animator and the end-retransmit timer on every tick.
fn run_tap_thread(
    running: Arc<AtomicBool>,
    settings: Arc<SettingsBridge>,
    presence: Arc<DevicePresence>,
    frontmost: FrontmostAppTracker,
    state: Rc<RefCell<EngineState>>,
    ready: std::sync::mpsc::SyncSender<Result<(), InterceptorError>>,
) {
    let session_mask = (1u64 << CGEventType::ScrollWheel as u64)
        | (1u64 << CGEventType::OtherMouseDown as u64)
        | (1u64 << CGEventType::OtherMouseUp as u64)
        | (1u64 << CGEventType::OtherMouseDragged as u64)
        | (1u64 << CGEventType::KeyDown as u64)
        | (1u64 << CGEventType::KeyUp as u64);

    let session_settings = settings.clone();
    let session_presence = presence.clone();
    let session_frontmost = frontmost.clone();
    let session_state = state.clone();

    let session_callback = move |_proxy: *const std::ffi::c_void,
                                  event_type: CGEventType,
                                  event: &core_graphics::event::CGEvent|
          -> Option<core_graphics::event::CGEvent> {
        if ffi::is_self_origin(event) {
            return Some(event.clone());
        }
        if ffi::is_tap_disabled(event_type) {
            return Some(event.clone());
        }

        let snapshot = match session_settings.snapshot() {
            Ok(s) => s,
            Err(_) => crate::settings::SettingsBridge::disabled_snapshot(),
        };

        handle_session_event(
            event_type,
            event,
            &snapshot,
            &session_presence,
            &session_frontmost,
            &session_state,
        )
    };

    let session_tap = match CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::Default,
        session_mask,
        session_callback,
    ) {
        Ok(tap) => tap,
        Err(()) => {
            tracing::error!("failed to create session event tap; check accessibility permission");
            running.store(false, Ordering::SeqCst);
            let _ = ready.send(Err(InterceptorError::TapCreationFailed));
            return;
        }
    };

    let hid_mask = 1u64 << CGEventType::OtherMouseDragged as u64;
    let hid_state = state.clone();
    let hid_callback = move |_proxy: *const std::ffi::c_void,
                              event_type: CGEventType,
                              event: &core_graphics::event::CGEvent|
          -> Option<core_graphics::event::CGEvent> {
        if ffi::is_self_origin(event) || ffi::is_tap_disabled(event_type) {
            return Some(event.clone());
        }
        handle_hid_drag(event, &hid_state);
        None
    };

    let hid_tap = match CGEventTap::new(
        CGEventTapLocation::HID,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::Default,
        hid_mask,
        hid_callback,
    ) {
        Ok(tap) => tap,
        Err(()) => {
            tracing::error!("failed to create HID event tap; check accessibility permission");
            running.store(false, Ordering::SeqCst);
            let _ = ready.send(Err(InterceptorError::TapCreationFailed));
            return;
        }
    };

    let run_loop = CFRunLoop::get_current();
    unsafe {
        run_loop.add_source(&session_tap.mach_port_run_loop_source(), kCFRunLoopCommonModes);
        run_loop.add_source(&hid_tap.mach_port_run_loop_source(), kCFRunLoopCommonModes);
    }
    session_tap.enable();
    let _ = ready.send(Ok(()));
    tracing::info!("interceptor started");

    const FRAME_BUDGET: Duration = Duration::from_millis(16);

    while running.load(Ordering::SeqCst) {
        CFRunLoop::run_in_mode(unsafe { kCFRunLoopDefaultMode }, FRAME_BUDGET, false);

        {
            let mut s = state.borrow_mut();
            if s.needs_hid_tap_enabled {
                hid_tap.enable();
                s.needs_hid_tap_enabled = false;
            }
            if s.needs_hid_tap_disabled {
                hid_tap.disable();
                s.needs_hid_tap_disabled = false;
            }

            let now = Instant::now();
            if let Some(animator) = s.animator.as_mut() {
                if !animator.is_idle() {
                    let emissions = animator.on_frame(now);
                    s.emit_scroll(&emissions);
                }
            }

            if let Some(pending) = s.end_retransmit.as_mut() {
                let fires = pending.schedule.fire_times();
                for i in 0..2 {
                    if !pending.fired[i] && now >= fires[i] {
                        pending.fired[i] = true;
                        let _ = s.event_source.post_dockswipe_pair(
                            pending.dockswipe_type,
                            4,
                            pending.cumulative_offset,
                            false,
                            Some(pending.exit_speed),
                        );
                    }
                }
                if pending.fired.iter().all(|&f| f) {
                    s.end_retransmit = None;
                }
            }

            if s.zoom.is_active() {
                if let Some(last) = s.last_wheel_tick {
                    if now.duration_since(last) >= ZOOM_END_DELAY {
                        let _ = s.event_source.post_magnify(3, 0.0);
                        s.zoom.end();
                        s.last_wheel_tick = None;
                    }
                }
            }
        }
    }

    // Teardown: force-cancel any in-flight continuous gesture, silence both
    // taps, clear state. Run on this thread since the taps and the run loop
    // source both belong to it.
    {
        let mut s = state.borrow_mut();
        if let Some(outcome) = s.gesture.force_cancel() {
            let _ = s.apply_gesture_outcome(outcome);
        }
        s.animator = None;
        s.end_retransmit = None;
    }
    hid_tap.disable();
    session_tap.disable();
    tracing::info!("interceptor stopped");
}

fn handle_session_event(
    event_type: CGEventType,
    event: &core_graphics::event::CGEvent,
    snapshot: &SettingsSnapshot,
    presence: &DevicePresence,
    frontmost: &FrontmostAppTracker,
    state: &Rc<RefCell<EngineState>>,
) -> Option<core_graphics::event::CGEvent> {
    match event_type {
        CGEventType::ScrollWheel => handle_scroll(event, snapshot, presence, state),
        CGEventType::OtherMouseDown => handle_button_down(event, snapshot, presence, state),
        CGEventType::OtherMouseUp => handle_button_up(event, snapshot, state),
        CGEventType::OtherMouseDragged => handle_session_drag(event, snapshot, state),
        CGEventType::KeyDown => handle_key(event, snapshot, presence, frontmost, state, true),
        CGEventType::KeyUp => handle_key(event, snapshot, presence, frontmost, state, false),
        _ => Some(event.clone()),
    }
}

fn modifiers_from_flags(flags: CGEventFlags) -> Modifiers {
    let mut m = Modifiers::empty();
    if flags.contains(CGEventFlags::CGEventFlagControl) {
        m |= Modifiers::CONTROL;
    }
    if flags.contains(CGEventFlags::CGEventFlagAlternate) {
        m |= Modifiers::OPTION;
    }
    if flags.contains(CGEventFlags::CGEventFlagShift) {
        m |= Modifiers::SHIFT;
    }
    if flags.contains(CGEventFlags::CGEventFlagCommand) {
        m |= Modifiers::COMMAND;
    }
    if flags.contains(CGEventFlags::CGEventFlagSecondaryFn) {
        m |= Modifiers::FUNCTION;
    }
    if flags.contains(CGEventFlags::CGEventFlagAlphaShift) {
        m |= Modifiers::CAPS_LOCK;
    }
    m
}

fn handle_scroll(
    event: &core_graphics::event::CGEvent,
    snapshot: &SettingsSnapshot,
    presence: &DevicePresence,
    state: &Rc<RefCell<EngineState>>,
) -> Option<core_graphics::event::CGEvent> {
    let external_mouse = presence.mouse() || snapshot.device_overrides.assume_external_mouse;
    if !snapshot.mouse_enabled || !external_mouse {
        return Some(event.clone());
    }
    let config = &snapshot.scroll;
    let flags = event.get_flags();
    let fields = WheelEventFields {
        is_continuous: event.get_integer_value_field(EventField::SCROLL_WHEEL_EVENT_IS_CONTINUOUS) != 0,
        momentum_phase: event.get_integer_value_field(EventField::SCROLL_WHEEL_EVENT_MOMENTUM_PHASE),
        scroll_phase: event.get_integer_value_field(EventField::SCROLL_WHEEL_EVENT_SCROLL_PHASE),
        delta_axis_1: event.get_integer_value_field(EventField::SCROLL_WHEEL_EVENT_DELTA_AXIS_1),
        delta_axis_2: event.get_integer_value_field(EventField::SCROLL_WHEEL_EVENT_DELTA_AXIS_2),
        command_held: flags.contains(CGEventFlags::CGEventFlagCommand),
        shift_held: flags.contains(CGEventFlags::CGEventFlagShift),
        option_held: flags.contains(CGEventFlags::CGEventFlagAlternate),
        control_held: flags.contains(CGEventFlags::CGEventFlagControl),
    };

    let outcome = scroll::process_wheel_event(&fields, config, external_mouse);

    let mut s = state.borrow_mut();
    match outcome {
        WheelOutcome::Unchanged => Some(event.clone()),
        WheelOutcome::Mutated { delta_axis_1, delta_axis_2 } => {
            event.set_integer_value_field(EventField::SCROLL_WHEEL_EVENT_DELTA_AXIS_1, delta_axis_1);
            event.set_integer_value_field(EventField::SCROLL_WHEEL_EVENT_DELTA_AXIS_2, delta_axis_2);
            event.set_integer_value_field(EventField::SCROLL_WHEEL_EVENT_FIXED_PT_DELTA_AXIS_1, delta_axis_1);
            event.set_integer_value_field(EventField::SCROLL_WHEEL_EVENT_FIXED_PT_DELTA_AXIS_2, delta_axis_2);
            Some(event.clone())
        }
        WheelOutcome::SuppressedForAnimator => {
            if s.animator.is_none() {
                if let Some(preset) = scroll::AnimatorPreset::for_level(config.smooth_level) {
                    s.animator = Some(Animator::new(preset));
                }
            }
            if let Some(animator) = s.animator.as_mut() {
                animator.on_input(fields.delta_axis_1, fields.delta_axis_2, Instant::now());
            }
            None
        }
        WheelOutcome::SuppressedForZoom { magnification_delta } => {
            let begin = s.zoom.on_wheel_tick();
            if begin {
                let _ = s.event_source.post_magnify(1, 0.0);
            }
            let _ = s.event_source.post_magnify(2, magnification_delta);
            s.last_wheel_tick = Some(Instant::now());
            None
        }
    }
}

fn handle_button_down(
    event: &core_graphics::event::CGEvent,
    snapshot: &SettingsSnapshot,
    presence: &DevicePresence,
    state: &Rc<RefCell<EngineState>>,
) -> Option<core_graphics::event::CGEvent> {
    let button = event.get_integer_value_field(EventField::MOUSE_EVENT_BUTTON_NUMBER) as u32;
    if !(presence.mouse() || snapshot.device_overrides.assume_external_mouse) || !snapshot.mouse_enabled {
        return Some(event.clone());
    }
    let location = event.location();

    if button == 2 {
        let mut s = state.borrow_mut();
        let outcome = s.gesture.on_middle_down(location.x, location.y, snapshot.buttons.middle_click);
        match outcome {
            GestureOutcome::PassThrough => Some(event.clone()),
            _ => {
                let action = s.apply_gesture_outcome(outcome);
                if let Some(action) = action {
                    s.execute_action(action);
                }
                None
            }
        }
    } else {
        match dispatch::dispatch_button(&snapshot.buttons.buttons, button, true) {
            ButtonOutcome::PassThrough => Some(event.clone()),
            ButtonOutcome::Suppress => None,
            ButtonOutcome::Execute(action) => {
                state.borrow().execute_action(action);
                None
            }
        }
    }
}

fn handle_button_up(
    event: &core_graphics::event::CGEvent,
    snapshot: &SettingsSnapshot,
    state: &Rc<RefCell<EngineState>>,
) -> Option<core_graphics::event::CGEvent> {
    let button = event.get_integer_value_field(EventField::MOUSE_EVENT_BUTTON_NUMBER) as u32;

    if button == 2 {
        let mut s = state.borrow_mut();
        let outcome = s.gesture.on_middle_up(snapshot.buttons.middle_click);
        match outcome {
            GestureOutcome::PassThrough => Some(event.clone()),
            _ => {
                let action = s.apply_gesture_outcome(outcome);
                if let Some(action) = action {
                    s.execute_action(action);
                }
                None
            }
        }
    } else {
        match dispatch::dispatch_button(&snapshot.buttons.buttons, button, false) {
            ButtonOutcome::PassThrough => Some(event.clone()),
            _ => None,
        }
    }
}

fn handle_session_drag(
    event: &core_graphics::event::CGEvent,
    snapshot: &SettingsSnapshot,
    state: &Rc<RefCell<EngineState>>,
) -> Option<core_graphics::event::CGEvent> {
    let mut s = state.borrow_mut();
    if s.gesture.is_continuous_active() {
        // Continuous-mode deltas come from the HID tap instead (raw deltas
        // survive cursor dissociation); suppress the session-level echo.
        return None;
    }
    let location = event.location();
    let (screen_w, screen_h, n_spaces) = (s.screen_width, s.screen_height, s.n_spaces);
    let outcome = s.gesture.on_drag(
        location.x,
        location.y,
        &snapshot.gesture,
        &snapshot.buttons.directions,
        n_spaces,
        screen_w,
        screen_h,
    );
    match outcome {
        GestureOutcome::PassThrough => Some(event.clone()),
        _ => {
            let action = s.apply_gesture_outcome(outcome);
            if let Some(action) = action {
                s.execute_action(action);
            }
            None
        }
    }
}

fn handle_hid_drag(event: &core_graphics::event::CGEvent, state: &Rc<RefCell<EngineState>>) {
    let dx = event.get_integer_value_field(EventField::MOUSE_EVENT_DELTA_X) as f64;
    let dy = event.get_integer_value_field(EventField::MOUSE_EVENT_DELTA_Y) as f64;

    let mut s = state.borrow_mut();
    if !s.gesture.is_continuous_active() {
        return;
    }
    s.hid_drag_dx += dx;
    s.hid_drag_dy += dy;
    let (start_x, start_y) = s.gesture.drag_start().unwrap_or((0.0, 0.0));
    let (hid_dx, hid_dy) = (s.hid_drag_dx, s.hid_drag_dy);
    let (screen_w, screen_h, n_spaces) = (s.screen_width, s.screen_height, s.n_spaces);
    let gesture_config = GestureConfig::default();
    let direction_mapping = crate::model::DragDirectionMapping::default();
    let outcome = s.gesture.on_drag(
        start_x + hid_dx,
        start_y + hid_dy,
        &gesture_config,
        &direction_mapping,
        n_spaces,
        screen_w,
        screen_h,
    );
    let _ = s.apply_gesture_outcome(outcome);
}

fn handle_key(
    event: &core_graphics::event::CGEvent,
    snapshot: &SettingsSnapshot,
    presence: &DevicePresence,
    frontmost: &FrontmostAppTracker,
    state: &Rc<RefCell<EngineState>>,
    pressed: bool,
) -> Option<core_graphics::event::CGEvent> {
    if !snapshot.keyboard_enabled {
        return Some(event.clone());
    }

    let enabled = dispatch::keyboard_pipeline_enabled(
        presence.keyboard(),
        snapshot.device_overrides.assume_external_keyboard,
        frontmost.bundle_id().as_deref(),
        &snapshot.excluded_bundle_ids,
    );
    if !enabled {
        return Some(event.clone());
    }

    let key_code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
    let modifiers = modifiers_from_flags(event.get_flags());
    let observed = KeyCombo::new(key_code, modifiers);

    match dispatch::dispatch_key(&snapshot.keyboard.remaps, observed, pressed) {
        KeyOutcome::PassThrough => Some(event.clone()),
        KeyOutcome::Suppress => None,
        KeyOutcome::Remap(combo) => {
            let s = state.borrow();
            let _ = s.event_source.post_key_combo(combo);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    // The tap thread itself needs a live run loop and accessibility
    // permission and so isn't exercised here; `engine::gesture`,
    // `engine::scroll` and `engine::dispatch` carry the behavioral coverage
    // for everything this module wires together.
}
