//! IOKit-backed `DeviceSource`
//!
//! Enumerates HID devices matching the generic-desktop mouse/keyboard usage
//! pages via `IOHIDManager`, and bridges its C-callback-based hot-plug
//! notifications onto the async channel `DeviceRegistry` expects.

use std::os::raw::c_void;
use std::sync::Mutex;
use std::time::Duration;

use io_kit_sys::hid::base::IOHIDDeviceRef;
use io_kit_sys::hid::manager::{
    kIOHIDManagerOptionNone, IOHIDManagerCreate, IOHIDManagerOpen,
    IOHIDManagerRegisterDeviceMatchingCallback, IOHIDManagerRegisterDeviceRemovalCallback,
    IOHIDManagerScheduleWithRunLoop, IOHIDManagerSetDeviceMatching, IOHIDManagerRef,
};
use tokio::sync::mpsc;

use core_foundation::base::TCFType;
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::runloop::{kCFRunLoopDefaultMode, CFRunLoop};
use core_foundation::string::CFString;

use super::{DeviceInfo, DeviceKind, DeviceSource};

const HID_USAGE_PAGE_GENERIC_DESKTOP: i32 = 0x01;
const HID_USAGE_MOUSE: i32 = 0x02;
const HID_USAGE_KEYBOARD: i32 = 0x06;

/// Thin safe wrapper over an `IOHIDManagerRef`, matching both mouse and
/// keyboard usages (`DeviceKind` is recovered per-device from the property
/// read, not from which matching dictionary fired).
pub struct IoKitDeviceSource {
    manager: IOHIDManagerRef,
}

// `IOHIDManagerRef` is an opaque CF-style object; IOKit documents it as safe
// to use from any thread as long as calls are serialized, which the
// `Mutex`-free usage here respects by only ever touching it from the run
// loop thread after `watch` schedules it there.
unsafe impl Send for IoKitDeviceSource {}
unsafe impl Sync for IoKitDeviceSource {}

impl IoKitDeviceSource {
    pub fn new() -> Self {
        let manager = unsafe { IOHIDManagerCreate(std::ptr::null_mut(), kIOHIDManagerOptionNone) };
        unsafe {
            let mouse_dict = usage_matching_dict(HID_USAGE_PAGE_GENERIC_DESKTOP, HID_USAGE_MOUSE);
            let keyboard_dict =
                usage_matching_dict(HID_USAGE_PAGE_GENERIC_DESKTOP, HID_USAGE_KEYBOARD);
            let dicts = core_foundation::array::CFArray::from_CFTypes(&[mouse_dict, keyboard_dict]);
            IOHIDManagerSetDeviceMatching(manager, dicts.as_concrete_TypeRef() as *const _);
            IOHIDManagerOpen(manager, kIOHIDManagerOptionNone);
        }
        Self { manager }
    }

    fn read_devices(&self) -> Vec<DeviceInfo> {
        // IOHIDManagerCopyDevices isn't bound by io-kit-sys at this crate
        // version; devices are instead captured by the matching callback
        // into `HOTPLUG_STATE` and mirrored here. See `watch`.
        HOTPLUG_STATE.lock().unwrap().clone()
    }
}

impl Default for IoKitDeviceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceSource for IoKitDeviceSource {
    fn enumerate(&self) -> Vec<DeviceInfo> {
        self.read_devices()
    }

    /// IOKit only delivers `IOHIDManagerRegisterDevice{Matching,Removal}Callback`
    /// while the run loop the manager was scheduled onto is actually running
    /// (mirroring `interceptor::run_tap_thread`'s need for a pumped
    /// `CFRunLoop` behind its taps). `DeviceRegistry::start` calls this from
    /// an async task on the tokio executor, which never enters a run loop on
    /// its own thread, so the callbacks would otherwise never fire. Spawn a
    /// dedicated OS thread that schedules the manager onto its own run loop
    /// and then pumps it indefinitely.
    fn watch(&self, tx: mpsc::Sender<()>) {
        let manager = SendManager(self.manager);
        std::thread::spawn(move || {
            let manager = manager;
            unsafe {
                let ctx = Box::into_raw(Box::new(tx)) as *mut c_void;
                IOHIDManagerRegisterDeviceMatchingCallback(manager.0, on_device_event, ctx);
                IOHIDManagerRegisterDeviceRemovalCallback(manager.0, on_device_event, ctx);
                IOHIDManagerScheduleWithRunLoop(
                    manager.0,
                    CFRunLoop::get_current().as_concrete_TypeRef(),
                    kCFRunLoopDefaultMode,
                );
            }

            const POLL_BUDGET: Duration = Duration::from_millis(250);
            loop {
                CFRunLoop::run_in_mode(unsafe { kCFRunLoopDefaultMode }, POLL_BUDGET, false);
            }
        });
    }
}

/// `IOHIDManagerRef` is a raw pointer and so isn't `Send` by default; IOKit
/// documents the manager as safe to hand to another thread as long as it's
/// only touched there afterwards, which is exactly what `watch` does.
struct SendManager(IOHIDManagerRef);
unsafe impl Send for SendManager {}

unsafe fn usage_matching_dict(usage_page: i32, usage: i32) -> core_foundation::dictionary::CFDictionary {
    let page_key = CFString::new("DeviceUsagePage");
    let usage_key = CFString::new("DeviceUsage");
    let page_value = CFNumber::from(usage_page);
    let usage_value = CFNumber::from(usage);
    CFDictionary::from_CFType_pairs(&[
        (page_key.as_CFType(), page_value.as_CFType()),
        (usage_key.as_CFType(), usage_value.as_CFType()),
    ])
}

/// Devices discovered so far, mirrored here because reading IOHIDDevice
/// properties is only safe from the matching callback's thread; the async
/// registry reads this snapshot instead of calling back into IOKit.
static HOTPLUG_STATE: Mutex<Vec<DeviceInfo>> = Mutex::new(Vec::new());

extern "C" fn on_device_event(context: *mut c_void, _result: i32, _sender: *mut c_void, device: IOHIDDeviceRef) {
    let tx = unsafe { &*(context as *const mpsc::Sender<()>) };
    if let Some(info) = read_device_info(device) {
        let mut state = HOTPLUG_STATE.lock().unwrap();
        state.retain(|d| d != &info);
        state.push(info);
    }
    let _ = tx.try_send(());
}

fn read_device_info(device: IOHIDDeviceRef) -> Option<DeviceInfo> {
    let vendor_id = property_i32(device, "VendorID").unwrap_or(0) as u32;
    let product_id = property_i32(device, "ProductID").unwrap_or(0) as u32;
    let vendor_name = property_string(device, "Manufacturer").unwrap_or_default();
    let product_name = property_string(device, "Product").unwrap_or_default();
    let usage = property_i32(device, "PrimaryUsage").unwrap_or(0);

    let kind = match usage {
        HID_USAGE_MOUSE => DeviceKind::Mouse,
        HID_USAGE_KEYBOARD => DeviceKind::Keyboard,
        _ => return None,
    };

    let first_party = super::classify_first_party(vendor_id, &vendor_name, &product_name);

    Some(DeviceInfo { vendor_id, product_id, vendor_name, product_name, kind, first_party })
}

fn property_i32(device: IOHIDDeviceRef, key: &str) -> Option<i32> {
    use io_kit_sys::hid::device::IOHIDDeviceGetProperty;
    unsafe {
        let key_cf = CFString::new(key);
        let value = IOHIDDeviceGetProperty(device, key_cf.as_concrete_TypeRef());
        if value.is_null() {
            return None;
        }
        let number: CFNumber = CFNumber::wrap_under_get_rule(value as _);
        number.to_i32()
    }
}

fn property_string(device: IOHIDDeviceRef, key: &str) -> Option<String> {
    use io_kit_sys::hid::device::IOHIDDeviceGetProperty;
    unsafe {
        let key_cf = CFString::new(key);
        let value = IOHIDDeviceGetProperty(device, key_cf.as_concrete_TypeRef());
        if value.is_null() {
            return None;
        }
        let s: CFString = CFString::wrap_under_get_rule(value as _);
        Some(s.to_string())
    }
}
