//! Configuration module
//!
//! On-disk policy store. This is the concrete realization of the "settings
//! collaborator" §6 treats as an external interface: a TOML file plus a
//! `Config` struct mirroring the Settings Snapshot data model from §3.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Action, ButtonMapping, DragDirectionMapping, KeyboardRemapTable};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Smooth-scroll level (§3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmoothLevel {
    Off,
    #[default]
    Smooth,
    VerySmooth,
}

/// Scroll-engine settings: reversal, axis swap, modifier scaling, smooth
/// level (§3, §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub smooth_level: SmoothLevel,
    #[serde(default = "default_true")]
    pub shift_horizontal: bool,
    #[serde(default = "default_true")]
    pub option_precision: bool,
    #[serde(default = "default_precision_multiplier")]
    pub precision_multiplier: f64,
    #[serde(default = "default_true")]
    pub control_fast: bool,
    #[serde(default = "default_fast_multiplier")]
    pub fast_multiplier: f64,
    #[serde(default = "default_true")]
    pub command_zoom: bool,
}

fn default_precision_multiplier() -> f64 {
    0.25
}
fn default_fast_multiplier() -> f64 {
    3.0
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            reverse: false,
            smooth_level: SmoothLevel::default(),
            shift_horizontal: true,
            option_precision: true,
            precision_multiplier: default_precision_multiplier(),
            control_fast: true,
            fast_multiplier: default_fast_multiplier(),
            command_zoom: true,
        }
    }
}

/// Gesture-engine settings: drag threshold, continuous mode (§3, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold_px: f64,
    #[serde(default = "default_true")]
    pub continuous_enabled: bool,
}

fn default_drag_threshold() -> f64 {
    30.0
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self { drag_threshold_px: default_drag_threshold(), continuous_enabled: true }
    }
}

/// Button mappings plus the drag-direction table used by the gesture engine
/// while a middle-button drag is in progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ButtonConfig {
    #[serde(default)]
    pub buttons: ButtonMapping,
    #[serde(default)]
    pub directions: DragDirectionMapping,
    /// Action taken on an uncommitted middle-button click (§4.4).
    #[serde(default = "default_middle_click_action")]
    pub middle_click: Action,
}

fn default_middle_click_action() -> Action {
    Action::Editing(crate::model::EditingAction::MiddleClick)
}

/// Keyboard remap table (§3, §4.5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyboardConfig {
    #[serde(default)]
    pub remaps: KeyboardRemapTable,
}

/// Device-override flags (§3: "assume external mouse / keyboard" even if
/// the Device Registry disagrees — useful for devices that misreport their
/// vendor id).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceOverrideConfig {
    #[serde(default)]
    pub assume_external_mouse: bool,
    #[serde(default)]
    pub assume_external_keyboard: bool,
}

/// Master enables and the excluded-application set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_true")]
    pub mouse_enabled: bool,
    #[serde(default = "default_true")]
    pub keyboard_enabled: bool,
    #[serde(default)]
    pub excluded_bundle_ids: HashSet<String>,
    /// Enable verbose (`debug`/`trace`) logging on the hot path, gated per
    /// §7's "logging is rate-limited and gated on a debug flag".
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            mouse_enabled: true,
            keyboard_enabled: true,
            excluded_bundle_ids: HashSet::new(),
            verbose: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Top-level on-disk configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub buttons: ButtonConfig,
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    #[serde(default)]
    pub device_overrides: DeviceOverrideConfig,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default per-user location, falling back
    /// to `Config::default()` (all-features-disabled behavior is the
    /// Settings Bridge's job, not this loader's — see §7 "settings bridge
    /// failure").
    pub fn load_default() -> ConfigResult<Self> {
        let candidates = [
            dirs::config_dir().map(|p| p.join("inputmorph/config.toml")),
            Some(PathBuf::from("./inputmorph.toml")),
        ];

        for path in candidates.iter().flatten() {
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("inputmorph/config.toml"))
    }
}

/// Generate a commented sample configuration, the `config generate` CLI
/// subcommand's payload.
pub fn generate_sample_config() -> String {
    let config = Config::default();
    toml::to_string_pretty(&config).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_has_both_master_enables_on() {
        let config = Config::default();
        assert!(config.general.mouse_enabled);
        assert!(config.general.keyboard_enabled);
    }

    #[test]
    fn save_and_load_round_trips() {
        let mut config = Config::default();
        config.scroll.reverse = true;
        config.general.excluded_bundle_ids.insert("com.example.app".to_string());

        let file = NamedTempFile::new().unwrap();
        config.save(file.path()).unwrap();

        let loaded = Config::load(file.path()).unwrap();
        assert_eq!(loaded.scroll.reverse, true);
        assert!(loaded.general.excluded_bundle_ids.contains("com.example.app"));
    }

    #[test]
    fn sample_config_parses_back() {
        let sample = generate_sample_config();
        let parsed: Config = toml::from_str(&sample).unwrap();
        assert!(parsed.general.mouse_enabled);
    }
}
