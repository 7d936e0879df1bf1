//! Device Registry (§4.2)
//!
//! Enumerates attached HID mice/keyboards, classifies each as external vs
//! first-party, and notifies subscribers on hot-plug. Architecture mirrors
//! the teacher's `discovery::Discovery`: an `Arc<RwLock<...>>` table, an
//! `mpsc` event channel, and a background `tokio::spawn` loop — here driving
//! IOKit callbacks plus a coarse safety-net timer instead of mDNS browsing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, RwLock};

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
pub use macos::IoKitDeviceSource;

/// Registry errors.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IOKit error: {0}")]
    IoKit(String),

    #[error("already running")]
    AlreadyRunning,

    #[error("not running")]
    NotRunning,
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// HID generic-desktop usage this device was enumerated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Mouse,
    Keyboard,
}

/// A single attached HID device, as classified by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub vendor_id: u32,
    pub product_id: u32,
    pub vendor_name: String,
    pub product_name: String,
    pub kind: DeviceKind,
    pub first_party: bool,
}

/// Source of truth a real IOKit-backed implementation must provide. Kept as
/// a trait so the registry's hot-plug/dedup/timer logic can be exercised in
/// tests without IOKit.
pub trait DeviceSource: Send + Sync + 'static {
    /// One-shot enumeration of currently attached devices.
    fn enumerate(&self) -> Vec<DeviceInfo>;

    /// Start delivering match/removal callbacks onto `tx`. Implementations
    /// spawn their own run-loop thread; this call returns immediately.
    fn watch(&self, tx: mpsc::Sender<()>);
}

/// Notification emitted when the connected-device set changes (§4.2).
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    DevicesChanged(Vec<DeviceInfo>),
}

/// First-party vendor id and brand substring. macOS's own mice/keyboards
/// report Apple's USB vendor id; Bluetooth variants sometimes only expose
/// the brand name, hence the case-insensitive substring fallback (§4.2).
const FIRST_PARTY_VENDOR_ID: u32 = 0x05AC;
const FIRST_PARTY_BRAND: &str = "apple";

fn classify_first_party(vendor_id: u32, vendor_name: &str, product_name: &str) -> bool {
    vendor_id == FIRST_PARTY_VENDOR_ID
        || vendor_name.to_lowercase().contains(FIRST_PARTY_BRAND)
        || product_name.to_lowercase().contains(FIRST_PARTY_BRAND)
}

/// Value-equality key used for hot-plug dedup (§4.2: "ignoring synthetic
/// per-instance identity to avoid redraw storms from the refresh timer").
type DedupKey = (u32, u32, String, String, bool, bool);

fn dedup_key(d: &DeviceInfo) -> DedupKey {
    (
        d.vendor_id,
        d.product_id,
        d.vendor_name.clone(),
        d.product_name.clone(),
        d.kind == DeviceKind::Mouse,
        d.first_party,
    )
}

/// Safety-net refresh interval for devices whose hot-plug callbacks don't
/// fire reliably (some Bluetooth stacks) — §4.2: "coarse, ~30 s".
const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Device Registry: owns the connected-device table and notifies
/// subscribers of value-equality changes.
pub struct DeviceRegistry<S: DeviceSource> {
    source: Arc<S>,
    devices: Arc<RwLock<Vec<DeviceInfo>>>,
    event_tx: mpsc::Sender<RegistryEvent>,
    event_rx: Option<mpsc::Receiver<RegistryEvent>>,
    running: Arc<RwLock<bool>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl<S: DeviceSource> DeviceRegistry<S> {
    pub fn new(source: S) -> Self {
        let (event_tx, event_rx) = mpsc::channel(32);
        Self {
            source: Arc::new(source),
            devices: Arc::new(RwLock::new(Vec::new())),
            event_tx,
            event_rx: Some(event_rx),
            running: Arc::new(RwLock::new(false)),
            shutdown_tx: None,
        }
    }

    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<RegistryEvent>> {
        self.event_rx.take()
    }

    pub async fn start(&mut self) -> RegistryResult<()> {
        {
            let running = self.running.read().await;
            if *running {
                return Err(RegistryError::AlreadyRunning);
            }
        }

        let initial = self.source.enumerate();
        {
            let mut devices = self.devices.write().await;
            *devices = initial;
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);
        {
            let mut running = self.running.write().await;
            *running = true;
        }

        let (hotplug_tx, mut hotplug_rx) = mpsc::channel(8);
        self.source.watch(hotplug_tx);

        let source = self.source.clone();
        let devices = self.devices.clone();
        let event_tx = self.event_tx.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = hotplug_rx.recv() => {
                        Self::refresh(&source, &devices, &event_tx).await;
                    }
                    _ = tokio::time::sleep(REFRESH_INTERVAL) => {
                        Self::refresh(&source, &devices, &event_tx).await;
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
            *running.write().await = false;
            tracing::info!("device registry stopped");
        });

        tracing::info!("device registry started");
        Ok(())
    }

    pub async fn stop(&mut self) -> RegistryResult<()> {
        {
            let running = self.running.read().await;
            if !*running {
                return Err(RegistryError::NotRunning);
            }
        }
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        Ok(())
    }

    async fn refresh(
        source: &Arc<S>,
        devices: &Arc<RwLock<Vec<DeviceInfo>>>,
        event_tx: &mpsc::Sender<RegistryEvent>,
    ) {
        let fresh = source.enumerate();
        let mut current = devices.write().await;

        let changed = {
            let mut current_keys: Vec<_> = current.iter().map(dedup_key).collect();
            let mut fresh_keys: Vec<_> = fresh.iter().map(dedup_key).collect();
            current_keys.sort();
            fresh_keys.sort();
            current_keys != fresh_keys
        };

        if changed {
            *current = fresh.clone();
            let _ = event_tx.send(RegistryEvent::DevicesChanged(fresh)).await;
        }
    }

    pub async fn connected_devices(&self) -> Vec<DeviceInfo> {
        self.devices.read().await.clone()
    }

    pub async fn external_mouse_present(&self) -> bool {
        self.devices
            .read()
            .await
            .iter()
            .any(|d| d.kind == DeviceKind::Mouse && !d.first_party)
    }

    pub async fn external_keyboard_present(&self) -> bool {
        self.devices
            .read()
            .await
            .iter()
            .any(|d| d.kind == DeviceKind::Keyboard && !d.first_party)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct FixedSource {
        devices: StdMutex<Vec<DeviceInfo>>,
    }

    impl DeviceSource for FixedSource {
        fn enumerate(&self) -> Vec<DeviceInfo> {
            self.devices.lock().unwrap().clone()
        }
        fn watch(&self, _tx: mpsc::Sender<()>) {}
    }

    fn external_mouse() -> DeviceInfo {
        DeviceInfo {
            vendor_id: 0x046D,
            product_id: 0xC52B,
            vendor_name: "Logitech".into(),
            product_name: "MX Master 3".into(),
            kind: DeviceKind::Mouse,
            first_party: false,
        }
    }

    #[test]
    fn classifies_apple_vendor_id_as_first_party() {
        assert!(classify_first_party(FIRST_PARTY_VENDOR_ID, "Apple Inc.", "Magic Mouse"));
    }

    #[test]
    fn classifies_by_brand_substring_case_insensitively() {
        assert!(classify_first_party(0x1234, "aPpLe Inc.", "Bluetooth Keyboard"));
    }

    #[test]
    fn external_vendor_is_not_first_party() {
        assert!(!classify_first_party(0x046D, "Logitech", "MX Master 3"));
    }

    #[tokio::test]
    async fn start_populates_initial_devices() {
        let source = FixedSource { devices: StdMutex::new(vec![external_mouse()]) };
        let mut registry = DeviceRegistry::new(source);
        registry.start().await.unwrap();
        assert!(registry.external_mouse_present().await);
        assert!(!registry.external_keyboard_present().await);
        registry.stop().await.unwrap();
    }
}
