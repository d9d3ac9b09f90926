// Camera Wi-Fi Setup - Network Observation Service
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Wi-Fi network observation.
//!
//! The observer turns platform queries into ranked [`NetworkSnapshot`]
//! lists and publishes them, together with the radio state and the
//! currently connected network, through `watch` channels. Channels carry
//! only the latest value.
//!
//! Platform broadcasts are consumed through [`WifiObserver::watch`], which
//! registers a listener for as long as the returned [`WifiEvents`] handle
//! lives. Each broadcast refreshes the published state before the handle
//! is signalled.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::models::{sort_by_signal, NetworkSnapshot, SecurityClass};
use crate::network_utils::strip_ssid_quotes;

use super::platform::{ListenerId, PlatformEvent, ScanResult, SettingsPanel, WifiPlatform};

/// BSSID reported for a connection the platform gives no address for.
const UNKNOWN_BSSID: &str = "N/A";

const PERMISSION_NOTICE: &str = "Not allowed to change Wi-Fi settings on this system.";

struct ObserverInner<P: WifiPlatform> {
    platform: Arc<P>,
    networks: watch::Sender<Vec<NetworkSnapshot>>,
    wifi_enabled: watch::Sender<bool>,
    location_enabled: watch::Sender<bool>,
    connected: watch::Sender<Option<NetworkSnapshot>>,
    notices: watch::Sender<Option<String>>,
}

impl<P: WifiPlatform> ObserverInner<P> {
    fn clear(&self) {
        self.networks.send_replace(Vec::new());
        self.connected.send_replace(None);
    }

    /// Re-read radio and location preconditions. Returns true when scan
    /// results may be used.
    fn refresh_preconditions(&self) -> bool {
        let enabled = self.platform.is_wifi_enabled();
        self.wifi_enabled.send_replace(enabled);
        if !enabled {
            self.clear();
            return false;
        }

        let location = self.platform.is_location_enabled();
        self.location_enabled.send_replace(location);
        if !location {
            debug!("Location services are off, scan results unavailable");
            self.clear();
            return false;
        }
        true
    }

    fn scan_networks(&self) {
        if !self.refresh_preconditions() {
            return;
        }
        self.platform.start_scan();
        self.publish_scan_results();
    }

    fn refresh_networks(&self) {
        if !self.refresh_preconditions() {
            return;
        }
        self.publish_scan_results();
    }

    fn publish_scan_results(&self) {
        let connected_ssid = self.connected_ssid();
        let networks = snapshots_from_scan(self.platform.scan_results(), connected_ssid.as_deref());
        debug!("Publishing {} network(s)", networks.len());
        self.networks.send_replace(networks);
        self.refresh_connected();
    }

    fn connected_ssid(&self) -> Option<String> {
        if !self.platform.is_wifi_transport_active() {
            return None;
        }
        self.platform
            .connection_info()
            .and_then(|info| info.ssid)
            .map(|ssid| strip_ssid_quotes(&ssid))
    }

    fn refresh_connected(&self) {
        let connected = self.connected_ssid().map(|ssid| {
            let known = self
                .networks
                .borrow()
                .iter()
                .find(|n| n.ssid == ssid)
                .map(NetworkSnapshot::as_current);
            known.unwrap_or_else(|| {
                let info = self.platform.connection_info().unwrap_or_default();
                NetworkSnapshot {
                    ssid,
                    bssid: info.bssid.unwrap_or_else(|| UNKNOWN_BSSID.to_string()),
                    signal_strength: info.rssi.unwrap_or(0),
                    security: SecurityClass::Unknown,
                    is_current: true,
                }
            })
        });
        self.connected.send_replace(connected);
    }

    fn handle_event(&self, event: PlatformEvent) {
        match event {
            PlatformEvent::RadioStateChanged { enabled } => {
                info!("Wi-Fi radio {}", if enabled { "enabled" } else { "disabled" });
                self.wifi_enabled.send_replace(enabled);
                if enabled {
                    self.scan_networks();
                } else {
                    self.clear();
                }
            }
            PlatformEvent::ScanResultsAvailable => self.refresh_networks(),
            PlatformEvent::ConnectivityChanged => self.refresh_connected(),
            PlatformEvent::PermissionDenied => {
                self.notices.send_replace(Some(PERMISSION_NOTICE.to_string()));
            }
        }
    }
}

/// Map raw scan results to snapshots, strongest first.
pub fn snapshots_from_scan(results: Vec<ScanResult>, connected_ssid: Option<&str>) -> Vec<NetworkSnapshot> {
    let mut networks: Vec<NetworkSnapshot> = results
        .into_iter()
        .map(|r| {
            let is_current = connected_ssid == Some(r.ssid.as_str());
            NetworkSnapshot {
                security: SecurityClass::from_capabilities(&r.capabilities),
                ssid: r.ssid,
                bssid: r.bssid,
                signal_strength: r.level,
                is_current,
            }
        })
        .collect();
    sort_by_signal(&mut networks);
    networks
}

/// Observes the host's Wi-Fi state.
pub struct WifiObserver<P: WifiPlatform> {
    inner: Arc<ObserverInner<P>>,
}

impl<P: WifiPlatform> Clone for WifiObserver<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: WifiPlatform> WifiObserver<P> {
    /// Create an observer. The radio state is read once up front; lists
    /// start empty until the first scan.
    pub fn new(platform: Arc<P>) -> Self {
        let enabled = platform.is_wifi_enabled();
        let location = platform.is_location_enabled();
        Self {
            inner: Arc::new(ObserverInner {
                platform,
                networks: watch::Sender::new(Vec::new()),
                wifi_enabled: watch::Sender::new(enabled),
                location_enabled: watch::Sender::new(location),
                connected: watch::Sender::new(None),
                notices: watch::Sender::new(None),
            }),
        }
    }

    /// Request a scan and republish networks and the connected network.
    ///
    /// With the radio or location services off both lists are cleared.
    pub fn scan_networks(&self) {
        self.inner.scan_networks();
    }

    /// Latest published networks, strongest first.
    pub fn current_snapshots(&self) -> Vec<NetworkSnapshot> {
        self.inner.networks.borrow().clone()
    }

    /// Latest published connected network.
    pub fn currently_connected(&self) -> Option<NetworkSnapshot> {
        self.inner.connected.borrow().clone()
    }

    pub fn is_wifi_enabled(&self) -> bool {
        *self.inner.wifi_enabled.borrow()
    }

    pub fn networks(&self) -> watch::Receiver<Vec<NetworkSnapshot>> {
        self.inner.networks.subscribe()
    }

    pub fn wifi_enabled(&self) -> watch::Receiver<bool> {
        self.inner.wifi_enabled.subscribe()
    }

    pub fn location_enabled(&self) -> watch::Receiver<bool> {
        self.inner.location_enabled.subscribe()
    }

    pub fn connected_network(&self) -> watch::Receiver<Option<NetworkSnapshot>> {
        self.inner.connected.subscribe()
    }

    /// Notices about refused commands. Every refusal republishes, even
    /// with the same text.
    pub fn notices(&self) -> watch::Receiver<Option<String>> {
        self.inner.notices.subscribe()
    }

    /// Start receiving platform broadcasts.
    ///
    /// The platform listener stays registered until the returned handle is
    /// dropped or closed.
    pub fn watch(&self) -> WifiEvents<P> {
        let (tx, rx) = watch::channel(0u64);
        let inner = Arc::clone(&self.inner);
        let id = self.inner.platform.register_listener(Arc::new(move |event| {
            inner.handle_event(event);
            tx.send_modify(|n| *n = n.wrapping_add(1));
        }));
        WifiEvents {
            platform: Arc::clone(&self.inner.platform),
            id: Some(id),
            signal: rx,
        }
    }

    pub fn set_wifi_enabled(&self, enabled: bool) {
        self.inner.platform.set_wifi_enabled(enabled);
    }

    /// Ask the platform for a scan; results arrive as a broadcast.
    pub fn start_scan(&self) {
        self.inner.platform.start_scan();
    }

    pub fn open_wifi_settings(&self) {
        self.inner.platform.open_settings(SettingsPanel::Wifi);
    }

    pub fn open_location_settings(&self) {
        self.inner.platform.open_settings(SettingsPanel::Location);
    }
}

/// Subscription to platform broadcasts.
///
/// Each received item means "state changed, re-read it". Signals that
/// arrive faster than they are consumed coalesce into one.
pub struct WifiEvents<P: WifiPlatform> {
    platform: Arc<P>,
    id: Option<ListenerId>,
    signal: watch::Receiver<u64>,
}

impl<P: WifiPlatform> WifiEvents<P> {
    /// Wait for the next change signal. Returns `None` once closed.
    pub async fn recv(&mut self) -> Option<()> {
        self.id?;
        self.signal.changed().await.ok()
    }

    /// Deregister the platform listener. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(id) = self.id.take() {
            self.platform.unregister_listener(id);
        }
    }
}

impl<P: WifiPlatform> Drop for WifiEvents<P> {
    fn drop(&mut self) {
        self.close();
    }
}
