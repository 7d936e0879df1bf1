//! Platform boundary (§6)
//!
//! This daemon is macOS-only — its entire purpose is intercepting CGEventTap
//! traffic — so unlike the teacher's cross-platform `input` module there is
//! only one backend, gated behind `cfg(target_os = "macos")` so the crate
//! still type-checks (minus the platform module) when linted on another OS.

#[cfg(target_os = "macos")]
pub mod macos;
