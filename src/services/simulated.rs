// Camera Wi-Fi Setup - Simulated Wi-Fi Platform
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! In-process Wi-Fi platform.
//!
//! Backs `--simulate` sessions on machines without NetworkManager and drives
//! the service tests. State is changed through the `set_*` helpers; radio
//! toggles broadcast like a real platform would, everything else is
//! announced explicitly by the tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{info, warn};

use super::platform::{
    ConnectionInfo, ListenerId, ListenerRegistry, PlatformEvent, PlatformListener, ScanResult,
    SettingsPanel, WifiPlatform,
};

#[derive(Debug, Clone, Default)]
struct SimState {
    wifi_enabled: bool,
    location_enabled: bool,
    results: Vec<ScanResult>,
    connection: Option<ConnectionInfo>,
    wifi_transport: bool,
}

/// Simulated Wi-Fi platform.
#[derive(Default)]
pub struct SimulatedWifiPlatform {
    state: Mutex<SimState>,
    listeners: ListenerRegistry,
    scan_requests: AtomicUsize,
    opened_panels: Mutex<Vec<SettingsPanel>>,
}

impl SimulatedWifiPlatform {
    /// Platform with the radio and location on and nothing in range.
    pub fn new() -> Self {
        let platform = Self::default();
        platform.update(|s| {
            s.wifi_enabled = true;
            s.location_enabled = true;
        });
        platform
    }

    /// Platform pre-populated with a few neighbours and an active connection.
    pub fn demo() -> Self {
        let platform = Self::new();
        platform.set_scan_results(vec![
            scan_result("Cafe Guest", "3C:84:6A:10:22:01", -81, "[ESS]"),
            scan_result("HomeNet", "F4:F2:6D:A0:11:5C", -48, "[WPA2-PSK-CCMP][ESS]"),
            scan_result("HomeNet-5G", "F4:F2:6D:A0:11:5D", -61, "[WPA3-SAE-CCMP][ESS]"),
            scan_result("Office", "00:1D:7E:44:9A:10", -72, "[WPA2-EAP-CCMP][ESS]"),
        ]);
        platform.set_connection(Some(ConnectionInfo {
            ssid: Some("\"HomeNet\"".to_string()),
            bssid: Some("F4:F2:6D:A0:11:5C".to_string()),
            rssi: Some(-48),
        }));
        platform
    }

    pub fn set_scan_results(&self, results: Vec<ScanResult>) {
        self.update(|s| s.results = results);
    }

    /// Set the active connection; `Some` also marks Wi-Fi as the active transport.
    pub fn set_connection(&self, connection: Option<ConnectionInfo>) {
        self.update(|s| {
            s.wifi_transport = connection.is_some();
            s.connection = connection;
        });
    }

    #[cfg(test)]
    pub fn set_location_enabled(&self, enabled: bool) {
        self.update(|s| s.location_enabled = enabled);
    }

    #[cfg(test)]
    /// Broadcast an event to every registered listener.
    pub fn emit(&self, event: PlatformEvent) {
        self.listeners.dispatch(event);
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    #[cfg(test)]
    pub fn scan_requests(&self) -> usize {
        self.scan_requests.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn opened_panels(&self) -> Vec<SettingsPanel> {
        match self.opened_panels.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&SimState) -> R) -> R {
        match self.state.lock() {
            Ok(guard) => f(&guard),
            Err(poisoned) => {
                warn!("Simulated platform lock poisoned, recovering");
                f(&poisoned.into_inner())
            }
        }
    }

    fn update(&self, f: impl FnOnce(&mut SimState)) {
        match self.state.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => {
                warn!("Simulated platform lock poisoned, recovering");
                f(&mut poisoned.into_inner())
            }
        }
    }
}

impl WifiPlatform for SimulatedWifiPlatform {
    fn is_wifi_enabled(&self) -> bool {
        self.read(|s| s.wifi_enabled)
    }

    fn is_location_enabled(&self) -> bool {
        self.read(|s| s.location_enabled)
    }

    fn start_scan(&self) {
        self.scan_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn scan_results(&self) -> Vec<ScanResult> {
        self.read(|s| if s.wifi_enabled { s.results.clone() } else { Vec::new() })
    }

    fn connection_info(&self) -> Option<ConnectionInfo> {
        self.read(|s| if s.wifi_enabled { s.connection.clone() } else { None })
    }

    fn is_wifi_transport_active(&self) -> bool {
        self.read(|s| s.wifi_enabled && s.wifi_transport)
    }

    fn set_wifi_enabled(&self, enabled: bool) {
        info!("Simulated radio {}", if enabled { "on" } else { "off" });
        self.update(|s| s.wifi_enabled = enabled);
        self.listeners.dispatch(PlatformEvent::RadioStateChanged { enabled });
    }

    fn open_settings(&self, panel: SettingsPanel) {
        info!("Simulated settings panel: {:?}", panel);
        match self.opened_panels.lock() {
            Ok(mut guard) => guard.push(panel),
            Err(poisoned) => poisoned.into_inner().push(panel),
        }
    }

    fn register_listener(&self, listener: PlatformListener) -> ListenerId {
        self.listeners.register(listener)
    }

    fn unregister_listener(&self, id: ListenerId) {
        self.listeners.unregister(id);
    }
}

/// Convenience constructor for a raw scan result.
pub fn scan_result(ssid: &str, bssid: &str, level: i32, capabilities: &str) -> ScanResult {
    ScanResult {
        ssid: ssid.to_string(),
        bssid: bssid.to_string(),
        level,
        capabilities: capabilities.to_string(),
    }
}
