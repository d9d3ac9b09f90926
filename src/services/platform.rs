// Camera Wi-Fi Setup - Wi-Fi Platform Abstraction
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Abstraction over the host's Wi-Fi, connectivity and location services.
//!
//! Queries are synchronous reads of whatever the platform last reported.
//! Commands are fire-and-forget; their effect shows up later as a
//! [`PlatformEvent`] delivered to registered listeners.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// One raw scan result as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub ssid: String,
    pub bssid: String,
    /// Signal level in dBm.
    pub level: i32,
    /// Capabilities string, e.g. `[WPA2-PSK-CCMP][ESS]`.
    pub capabilities: String,
}

/// Details of the active wireless connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// SSID, possibly wrapped in double quotes.
    pub ssid: Option<String>,
    pub bssid: Option<String>,
    pub rssi: Option<i32>,
}

/// State-change broadcasts from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// The radio was switched on or off.
    RadioStateChanged { enabled: bool },
    /// A scan finished and fresh results can be read.
    ScanResultsAvailable,
    /// The active network changed.
    ConnectivityChanged,
    /// A command was refused by the host's authorization policy.
    PermissionDenied,
}

/// System settings screens the user can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsPanel {
    Wifi,
    Location,
}

/// Callback invoked for every platform broadcast.
pub type PlatformListener = Arc<dyn Fn(PlatformEvent) + Send + Sync>;

/// Registration token returned by [`WifiPlatform::register_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Host Wi-Fi services.
pub trait WifiPlatform: Send + Sync + 'static {
    fn is_wifi_enabled(&self) -> bool;

    /// Whether location services are on (required for scan results on some hosts).
    fn is_location_enabled(&self) -> bool;

    /// Ask the radio for a fresh scan.
    fn start_scan(&self);

    /// Results of the most recent scan, in platform order.
    fn scan_results(&self) -> Vec<ScanResult>;

    fn connection_info(&self) -> Option<ConnectionInfo>;

    /// Whether the active network transport is Wi-Fi.
    fn is_wifi_transport_active(&self) -> bool;

    fn set_wifi_enabled(&self, enabled: bool);

    fn open_settings(&self, panel: SettingsPanel);

    fn register_listener(&self, listener: PlatformListener) -> ListenerId;

    /// Remove a listener. Unknown ids are ignored.
    fn unregister_listener(&self, id: ListenerId);
}

/// Listener bookkeeping shared by platform implementations.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<u64, PlatformListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: PlatformListener) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.with_listeners(|l| {
            l.insert(id, listener);
        });
        debug!("Registered platform listener {}", id);
        ListenerId(id)
    }

    /// Returns true if the listener was still registered.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let removed = self.with_listeners(|l| l.remove(&id.0).is_some());
        if removed {
            debug!("Unregistered platform listener {}", id.0);
        }
        removed
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.with_listeners(|l| l.len())
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver an event to every listener.
    ///
    /// Listeners are called outside the lock so they may register or
    /// unregister from inside the callback.
    pub fn dispatch(&self, event: PlatformEvent) {
        let listeners: Vec<PlatformListener> = self.with_listeners(|l| l.values().cloned().collect());
        debug!("Dispatching {:?} to {} listener(s)", event, listeners.len());
        for listener in listeners {
            listener(event);
        }
    }

    fn with_listeners<R>(&self, f: impl FnOnce(&mut HashMap<u64, PlatformListener>) -> R) -> R {
        match self.listeners.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => {
                warn!("Listener lock poisoned, recovering");
                f(&mut poisoned.into_inner())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_register_dispatch_unregister() {
        let registry = ListenerRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = registry.register(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        registry.dispatch(PlatformEvent::ScanResultsAvailable);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());

        registry.dispatch(PlatformEvent::ConnectivityChanged);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = ListenerRegistry::new();
        let a = registry.register(Arc::new(|_| {}));
        let b = registry.register(Arc::new(|_| {}));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }
}
