//! macOS platform layer
//!
//! Everything that touches CoreGraphics, IOKit or AppKit directly lives
//! here. The engines and interceptor core above this module only see
//! `CGEvent`/`CGEventType` values and the small set of helper types exposed
//! below — no raw pointers or `objc` calls leak past this module boundary.

#![cfg(target_os = "macos")]

pub mod event_source;
pub mod ffi;
pub mod keycode;
pub mod system_action;
pub mod workspace;

pub use event_source::{EventSourceError, EventSourceHelper, EventSourceResult};
pub use workspace::{ActivationObserver, FrontmostAppTracker};

/// Check if the process has accessibility permissions. Required for both
/// taps (§7 "permission denied" taxonomy entry).
pub fn has_accessibility_permission() -> bool {
    unsafe {
        #[link(name = "ApplicationServices", kind = "framework")]
        unsafe extern "C" {
            fn AXIsProcessTrusted() -> bool;
        }
        AXIsProcessTrusted()
    }
}

/// Prompt the user to grant accessibility permission, via the
/// `kAXTrustedCheckOptionPrompt` option dictionary.
pub fn request_accessibility_permission() -> bool {
    use core_foundation::base::TCFType;
    use core_foundation::boolean::CFBoolean;
    use core_foundation::dictionary::CFDictionary;
    use core_foundation::string::CFString;

    unsafe {
        #[link(name = "ApplicationServices", kind = "framework")]
        unsafe extern "C" {
            fn AXIsProcessTrustedWithOptions(options: core_foundation::dictionary::CFDictionaryRef) -> bool;
        }

        let key = CFString::new("AXTrustedCheckOptionPrompt");
        let value = CFBoolean::true_value();
        let options = CFDictionary::from_CFType_pairs(&[(key.as_CFType(), value.as_CFType())]);
        AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef())
    }
}

/// Pixel dimensions of the main display, used to seed the interceptor's
/// DockSwipe pixel-to-unit conversion (§4.4).
pub fn main_display_size() -> (f64, f64) {
    use core_graphics::display::CGDisplay;

    let display = CGDisplay::main();
    (display.pixels_wide() as f64, display.pixels_high() as f64)
}

/// Query the window server for the number of managed display spaces, used
/// to compute `originOffsetForOneSpace` (§4.4). No public Cocoa API exposes
/// this; the private `CGSGetNumberOfSpaces`-family calls this daemon relies
/// on are represented here as a single seam so the gesture engine never
/// talks to CoreGraphics SPI directly.
pub fn managed_space_count() -> u32 {
    // A hard zero-dependency fallback: real space-counting goes through a
    // private `CGSDefaultConnection`/`CGSCopyManagedDisplaySpaces` pair that
    // isn't part of any public crate in this stack. Conservatively report a
    // single space so `originOffsetForOneSpace` takes its documented
    // `nSpaces == 1` branch (§8 boundary behavior) until that SPI binding is
    // written.
    1
}
