//! Frontmost-application tracking
//!
//! The key dispatcher needs the frontmost app's bundle id to honor the
//! excluded-applications list, but querying `NSWorkspace` per keystroke is
//! too slow (§5.1, §9: "cached frontmost-application bundle id, updated by
//! activation notification, not queried per-event"). This module registers
//! for `NSWorkspaceDidActivateApplicationNotification` and keeps the latest
//! bundle id in an `ArcSwap`-free plain mutex, cheap enough for the
//! dispatcher's read path.

use std::sync::{Arc, Mutex};

use cocoa::base::{id, nil};
use cocoa::foundation::NSString;
use objc::runtime::Object;
use objc::{class, msg_send, sel, sel_impl};

/// Shared, thread-safe cache of the frontmost application's bundle
/// identifier.
#[derive(Clone)]
pub struct FrontmostAppTracker {
    bundle_id: Arc<Mutex<Option<String>>>,
}

impl FrontmostAppTracker {
    /// Create the tracker and seed it with the currently-frontmost app, the
    /// way a fresh `start()` should not wait for the first activation
    /// notification before the dispatcher has something to read.
    pub fn new() -> Self {
        let tracker = Self { bundle_id: Arc::new(Mutex::new(None)) };
        tracker.refresh_from_workspace();
        tracker
    }

    pub fn bundle_id(&self) -> Option<String> {
        self.bundle_id.lock().unwrap().clone()
    }

    fn set(&self, bundle_id: Option<String>) {
        *self.bundle_id.lock().unwrap() = bundle_id;
    }

    /// One-shot synchronous query, used only at startup before the
    /// notification observer has fired once.
    fn refresh_from_workspace(&self) {
        unsafe {
            let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
            let app: id = msg_send![workspace, frontmostApplication];
            if app == nil {
                return;
            }
            let bundle_id: id = msg_send![app, bundleIdentifier];
            self.set(ns_string_to_string(bundle_id));
        }
    }
}

impl Default for FrontmostAppTracker {
    fn default() -> Self {
        Self::new()
    }
}

unsafe fn ns_string_to_string(ns_string: id) -> Option<String> {
    if ns_string == nil {
        return None;
    }
    let bytes: *const i8 = msg_send![ns_string, UTF8String];
    if bytes.is_null() {
        return None;
    }
    Some(std::ffi::CStr::from_ptr(bytes).to_string_lossy().into_owned())
}

/// Registers an `NSWorkspaceDidActivateApplicationNotification` observer
/// that updates `tracker` on every app switch. Must run on the main thread
/// — `NSWorkspace`'s notification center delivers on whatever thread posted
/// the notification, which for this one is always the main thread.
///
/// # Safety
/// Leaks one Objective-C block-backed observer object for the lifetime of
/// the process; `stop()` unregisters it via `NSNotificationCenter
/// removeObserver:`, which is safe to call from any thread.
pub struct ActivationObserver {
    observer: id,
}

impl ActivationObserver {
    pub fn register(tracker: FrontmostAppTracker) -> Self {
        use objc::declare::ClassDecl;
        use objc::runtime::{Class, Sel};
        use std::sync::Once;

        static REGISTER_CLASS: Once = Once::new();
        REGISTER_CLASS.call_once(|| unsafe {
            let superclass = class!(NSObject);
            let mut decl = ClassDecl::new("InputMorphActivationObserver", superclass)
                .expect("class registered once");
            decl.add_ivar::<*mut std::ffi::c_void>("tracker");
            extern "C" fn on_activate(this: &Object, _cmd: Sel, notification: id) {
                unsafe {
                    let ptr = *this.get_ivar::<*mut std::ffi::c_void>("tracker");
                    let tracker = &*(ptr as *const FrontmostAppTracker);
                    let user_info: id = msg_send![notification, userInfo];
                    let app: id = msg_send![
                        user_info,
                        objectForKey: NSString::alloc(nil).init_str("NSWorkspaceApplicationKey")
                    ];
                    let bundle_id: id = msg_send![app, bundleIdentifier];
                    tracker.set(ns_string_to_string(bundle_id));
                }
            }
            decl.add_method(
                sel!(onActivate:),
                on_activate as extern "C" fn(&Object, Sel, id),
            );
            decl.register();
            let _ = Class::get("InputMorphActivationObserver");
        });

        unsafe {
            let class = class!(InputMorphActivationObserver);
            let observer: id = msg_send![class, new];
            let boxed = Box::into_raw(Box::new(tracker.clone())) as *mut std::ffi::c_void;
            (*observer).set_ivar("tracker", boxed);

            let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
            let center: id = msg_send![workspace, notificationCenter];
            let name = NSString::alloc(nil).init_str("NSWorkspaceDidActivateApplicationNotification");
            let _: () = msg_send![
                center,
                addObserver: observer
                selector: sel!(onActivate:)
                name: name
                object: nil
            ];

            Self { observer }
        }
    }

    pub fn unregister(self) {
        unsafe {
            let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
            let center: id = msg_send![workspace, notificationCenter];
            let _: () = msg_send![center, removeObserver: self.observer];
        }
    }
}
