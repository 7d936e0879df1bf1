//! Button & Key Dispatcher (§4.5)

use crate::model::{
    Action, ButtonMapping, EditingAction, KeyCombo, KeyboardRemapTable, SystemAction,
    MAX_AUX_BUTTON, MIN_AUX_BUTTON,
};

/// What the dispatcher decided to do with a button event.
#[derive(Debug)]
pub enum ButtonOutcome {
    /// No mapping for this button, or it's a primary button — unchanged.
    PassThrough,
    /// Swallow the raw event; nothing else to do yet (e.g. a press-style
    /// mapping swallows `up`, a click-style mapping swallows `down`).
    Suppress,
    /// Swallow the raw event and execute this action now.
    Execute(Action),
}

/// Look up and validate an auxiliary button press. Primary buttons (0, 1)
/// are rejected here defensively even though `ButtonMapping` already refuses
/// to store a mapping for them (§3, §8 boundary behavior).
pub fn dispatch_button(mapping: &ButtonMapping, button: u32, pressed: bool) -> ButtonOutcome {
    if button < MIN_AUX_BUTTON || button > MAX_AUX_BUTTON {
        return ButtonOutcome::PassThrough;
    }
    let Some(action) = mapping.get(button) else {
        return ButtonOutcome::PassThrough;
    };

    // Press-style actions execute on down; click-style (anything resolving
    // through `MiddleClick`) execute on up. Since regular aux buttons have
    // no up/down asymmetry in the spec beyond this, everything non-middle
    // executes on down and is merely suppressed on the matching up.
    if pressed {
        ButtonOutcome::Execute(action)
    } else {
        ButtonOutcome::Suppress
    }
}

/// Whether the keyboard-remap pipeline should run at all for this event
/// (§4.5: "iff external keyboard is present ... and the frontmost
/// application's bundle id is not in the excluded set").
pub fn keyboard_pipeline_enabled(
    external_keyboard_present: bool,
    assume_external_keyboard: bool,
    frontmost_bundle_id: Option<&str>,
    excluded_bundle_ids: &std::collections::HashSet<String>,
) -> bool {
    let keyboard_present = external_keyboard_present || assume_external_keyboard;
    if !keyboard_present {
        return false;
    }
    match frontmost_bundle_id {
        Some(id) => !excluded_bundle_ids.contains(id),
        None => true,
    }
}

/// Result of running a key event through the remap table.
#[derive(Debug)]
pub enum KeyOutcome {
    /// No mapping, or mapping is inert pass-through — unchanged.
    PassThrough,
    /// Suppress the raw up/down of a mapped source key.
    Suppress,
    /// Suppress the raw key-down and synthesize this combo's down+up.
    Remap(KeyCombo),
}

/// §4.5 "Keys": canonical lookup, on key-down synthesize the mapped combo
/// and suppress original; on key-up of a mapped source, suppress only.
pub fn dispatch_key(remaps: &KeyboardRemapTable, observed: KeyCombo, pressed: bool) -> KeyOutcome {
    let Some(action) = remaps.lookup(observed) else {
        return KeyOutcome::PassThrough;
    };
    if matches!(action, Action::Inert(crate::model::InertKind::PassThrough)) {
        return KeyOutcome::PassThrough;
    }

    if !pressed {
        return KeyOutcome::Suppress;
    }

    match action_to_combo(action) {
        Some(combo) => KeyOutcome::Remap(combo),
        None => KeyOutcome::Suppress,
    }
}

/// Resolve a named or custom action down to the key combo that should
/// actually be synthesized, for actions driven by ordinary key injection
/// rather than the symbolic-hotkey API (§4.5).
pub fn action_to_combo(action: Action) -> Option<KeyCombo> {
    match action {
        Action::Editing(editing) => editing.key_combo(),
        Action::Custom(combo) => Some(combo.into()),
        Action::System(system) => system_action_combo(system),
        Action::Inert(_) => None,
    }
}

/// Some system actions have a dedicated function-key combo fallback when
/// the symbolic-hotkey API path isn't used (§4.5: "Show Desktop uses F11
/// with the function-key flag").
fn system_action_combo(system: SystemAction) -> Option<KeyCombo> {
    use crate::model::Modifiers;
    use crate::platform::macos::keycode::mac;
    match system {
        SystemAction::ShowDesktop => {
            Some(KeyCombo::new(mac::F11, Modifiers::FUNCTION))
        }
        // MissionControl / AppExpose / Launchpad / SwitchSpace* are driven
        // via the private symbolic-hotkey API (see
        // `platform::macos::system_action`), not a synthesized key combo.
        _ => None,
    }
}

/// Whether `system` must go through the symbolic-hotkey trigger rather than
/// `system_action_combo`.
pub fn requires_symbolic_hotkey(system: SystemAction) -> bool {
    system_action_combo(system).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InertKind;

    #[test]
    fn primary_buttons_always_pass_through() {
        let mapping = ButtonMapping::default();
        assert!(matches!(dispatch_button(&mapping, 0, true), ButtonOutcome::PassThrough));
        assert!(matches!(dispatch_button(&mapping, 1, true), ButtonOutcome::PassThrough));
    }

    #[test]
    fn unmapped_button_passes_through() {
        let mapping = ButtonMapping::default();
        assert!(matches!(dispatch_button(&mapping, 3, true), ButtonOutcome::PassThrough));
    }

    #[test]
    fn excluded_app_disables_keyboard_pipeline() {
        let mut excluded = std::collections::HashSet::new();
        excluded.insert("com.example.terminal".to_string());
        assert!(!keyboard_pipeline_enabled(true, false, Some("com.example.terminal"), &excluded));
        assert!(keyboard_pipeline_enabled(true, false, Some("com.example.editor"), &excluded));
    }

    #[test]
    fn no_external_keyboard_and_no_override_disables_pipeline() {
        let excluded = std::collections::HashSet::new();
        assert!(!keyboard_pipeline_enabled(false, false, None, &excluded));
        assert!(keyboard_pipeline_enabled(false, true, None, &excluded));
    }

    #[test]
    fn inert_editing_action_has_no_combo() {
        assert_eq!(EditingAction::MiddleClick.key_combo(), None);
    }

    #[test]
    fn custom_action_resolves_to_its_combo() {
        use crate::model::{KeyComboDef, Modifiers};
        let def = KeyComboDef { key_code: 0x20, modifiers: Modifiers::COMMAND };
        let combo = action_to_combo(Action::Custom(def)).unwrap();
        assert_eq!(combo.key_code, 0x20);
    }

    #[test]
    fn inert_pass_through_action_has_no_combo() {
        assert_eq!(action_to_combo(Action::Inert(InertKind::PassThrough)), None);
    }
}
