// Camera Wi-Fi Setup - NetworkManager Backend
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Wi-Fi platform backed by NetworkManager on the system D-Bus.
//!
//! NetworkManager state is sampled on an interval by a background task and
//! cached, so the synchronous [`WifiPlatform`] queries never block on the
//! bus. Differences between two samples are turned into platform
//! broadcasts. Commands are sent from tasks on the runtime that created the
//! backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use zbus::zvariant::{OwnedObjectPath, Value};
use zbus::{proxy, Connection};

use crate::models::{Error, Result};
use crate::network_utils::{capabilities_from_nm_flags, decode_ssid, launch_settings_panel, strength_percent_to_dbm};
use crate::services::platform::{
    ConnectionInfo, ListenerId, ListenerRegistry, PlatformEvent, PlatformListener, ScanResult,
    SettingsPanel, WifiPlatform,
};

/// NMDeviceType for Wi-Fi devices.
const DEVICE_TYPE_WIFI: u32 = 2;

/// Connection type reported for Wi-Fi in `PrimaryConnectionType`.
const WIRELESS_CONNECTION_TYPE: &str = "802-11-wireless";

/// Object path NetworkManager uses for "no object".
const NO_OBJECT_PATH: &str = "/";

#[proxy(
    interface = "org.freedesktop.NetworkManager",
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager",
    gen_blocking = false
)]
trait NetworkManager {
    fn get_devices(&self) -> zbus::Result<Vec<OwnedObjectPath>>;

    #[zbus(property)]
    fn wireless_enabled(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn set_wireless_enabled(&self, value: bool) -> zbus::Result<()>;

    #[zbus(property)]
    fn primary_connection_type(&self) -> zbus::Result<String>;
}

#[proxy(
    interface = "org.freedesktop.NetworkManager.Device",
    default_service = "org.freedesktop.NetworkManager",
    gen_blocking = false
)]
trait Device {
    #[zbus(property)]
    fn device_type(&self) -> zbus::Result<u32>;
}

#[proxy(
    interface = "org.freedesktop.NetworkManager.Device.Wireless",
    default_service = "org.freedesktop.NetworkManager",
    gen_blocking = false
)]
trait Wireless {
    fn get_all_access_points(&self) -> zbus::Result<Vec<OwnedObjectPath>>;

    fn request_scan(&self, options: HashMap<&str, Value<'_>>) -> zbus::Result<()>;

    #[zbus(property)]
    fn active_access_point(&self) -> zbus::Result<OwnedObjectPath>;

    /// CLOCK_BOOTTIME milliseconds of the last finished scan, -1 if none.
    #[zbus(property)]
    fn last_scan(&self) -> zbus::Result<i64>;
}

#[proxy(
    interface = "org.freedesktop.NetworkManager.AccessPoint",
    default_service = "org.freedesktop.NetworkManager",
    gen_blocking = false
)]
trait AccessPoint {
    #[zbus(property)]
    fn ssid(&self) -> zbus::Result<Vec<u8>>;

    #[zbus(property)]
    fn strength(&self) -> zbus::Result<u8>;

    #[zbus(property)]
    fn hw_address(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn flags(&self) -> zbus::Result<u32>;

    #[zbus(property)]
    fn wpa_flags(&self) -> zbus::Result<u32>;

    #[zbus(property)]
    fn rsn_flags(&self) -> zbus::Result<u32>;
}

/// One sample of NetworkManager's Wi-Fi state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct NmSample {
    wifi_enabled: bool,
    last_scan: i64,
    results: Vec<ScanResult>,
    connection: Option<ConnectionInfo>,
    wifi_transport: bool,
}

impl NmSample {
    fn bssids(&self) -> Vec<&str> {
        let mut bssids: Vec<&str> = self.results.iter().map(|r| r.bssid.as_str()).collect();
        bssids.sort_unstable();
        bssids
    }
}

/// Broadcasts implied by moving from one sample to the next.
fn diff_samples(previous: &NmSample, next: &NmSample) -> Vec<PlatformEvent> {
    let mut events = Vec::new();
    if previous.wifi_enabled != next.wifi_enabled {
        events.push(PlatformEvent::RadioStateChanged {
            enabled: next.wifi_enabled,
        });
    }
    if next.wifi_enabled && (previous.last_scan != next.last_scan || previous.bssids() != next.bssids()) {
        events.push(PlatformEvent::ScanResultsAvailable);
    }
    if previous.wifi_transport != next.wifi_transport || !same_access_point(&previous.connection, &next.connection) {
        events.push(PlatformEvent::ConnectivityChanged);
    }
    events
}

/// Whether two samples point at the same network. Signal level is ignored.
fn same_access_point(a: &Option<ConnectionInfo>, b: &Option<ConnectionInfo>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.ssid == b.ssid && a.bssid == b.bssid,
        (None, None) => true,
        _ => false,
    }
}

fn scan_result_from_ap(
    ssid: &[u8],
    strength: u8,
    hw_address: String,
    flags: u32,
    wpa_flags: u32,
    rsn_flags: u32,
) -> ScanResult {
    ScanResult {
        ssid: decode_ssid(ssid),
        bssid: hw_address.to_uppercase(),
        level: strength_percent_to_dbm(strength),
        capabilities: capabilities_from_nm_flags(flags, wpa_flags, rsn_flags),
    }
}

async fn read_access_point(conn: &Connection, path: OwnedObjectPath) -> Result<ScanResult> {
    let ap = AccessPointProxy::builder(conn).path(path)?.build().await?;
    Ok(scan_result_from_ap(
        &ap.ssid().await?,
        ap.strength().await?,
        ap.hw_address().await?,
        ap.flags().await?,
        ap.wpa_flags().await?,
        ap.rsn_flags().await?,
    ))
}

async fn wifi_devices(conn: &Connection) -> Result<Vec<WirelessProxy<'static>>> {
    let nm = NetworkManagerProxy::new(conn).await?;
    let mut devices = Vec::new();
    for path in nm.get_devices().await? {
        let device = DeviceProxy::builder(conn).path(path.clone())?.build().await?;
        if device.device_type().await? == DEVICE_TYPE_WIFI {
            devices.push(WirelessProxy::builder(conn).path(path)?.build().await?);
        }
    }
    Ok(devices)
}

async fn sample(conn: &Connection) -> Result<NmSample> {
    let nm = NetworkManagerProxy::new(conn).await?;
    let wifi_enabled = nm.wireless_enabled().await?;
    let mut next = NmSample {
        wifi_enabled,
        ..NmSample::default()
    };
    if !wifi_enabled {
        return Ok(next);
    }

    let primary = nm.primary_connection_type().await.unwrap_or_default();
    next.wifi_transport = primary == WIRELESS_CONNECTION_TYPE;

    for device in wifi_devices(conn).await? {
        next.last_scan = next.last_scan.max(device.last_scan().await.unwrap_or(-1));
        for path in device.get_all_access_points().await? {
            // Access points can disappear between listing and reading.
            match read_access_point(conn, path).await {
                Ok(result) => next.results.push(result),
                Err(e) => debug!("Skipping access point: {}", e),
            }
        }

        if next.connection.is_none() {
            let active = device.active_access_point().await?;
            if active.as_str() != NO_OBJECT_PATH {
                let ap = read_access_point(conn, active).await?;
                next.connection = Some(ConnectionInfo {
                    ssid: Some(ap.ssid),
                    bssid: Some(ap.bssid),
                    rssi: Some(ap.level),
                });
            }
        }
    }
    Ok(next)
}

/// NetworkManager-backed [`WifiPlatform`].
pub struct NmWifiPlatform {
    me: Weak<NmWifiPlatform>,
    connection: Connection,
    runtime: Handle,
    state: RwLock<NmSample>,
    listeners: ListenerRegistry,
    sampler: Mutex<Option<JoinHandle<()>>>,
}

impl NmWifiPlatform {
    /// Connect to the system bus, take a first sample and start sampling
    /// every `poll_interval`.
    pub async fn connect(poll_interval: Duration) -> Result<Arc<Self>> {
        let connection = match Connection::system().await {
            Ok(conn) => {
                debug!("Connected to system D-Bus");
                conn
            }
            Err(e) => {
                error!("Failed to connect to system D-Bus: {}", e);
                return Err(Error::DbusConnectionFailed(e.to_string()));
            }
        };

        let initial = sample(&connection)
            .await
            .map_err(|e| Error::NetworkManagerDbus(e.to_string()))?;
        info!(
            "NetworkManager reachable (radio {}, {} access point(s))",
            if initial.wifi_enabled { "on" } else { "off" },
            initial.results.len()
        );

        let platform = Arc::new_cyclic(|me| Self {
            me: me.clone(),
            connection,
            runtime: Handle::current(),
            state: RwLock::new(initial),
            listeners: ListenerRegistry::new(),
            sampler: Mutex::new(None),
        });
        platform.start_sampling(poll_interval);
        Ok(platform)
    }

    fn start_sampling(&self, poll_interval: Duration) {
        let me = self.me.clone();
        let task = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(platform) = me.upgrade() else {
                    break;
                };
                platform.resample().await;
            }
            debug!("NetworkManager sampling stopped");
        });
        *self.sampler_slot() = Some(task);
    }

    /// Take a new sample and broadcast whatever changed. Failures keep the
    /// previous state.
    async fn resample(&self) {
        let next = match sample(&self.connection).await {
            Ok(next) => next,
            Err(e) => {
                warn!("NetworkManager sampling failed: {}", e);
                return;
            }
        };
        let events = {
            let mut state = self.write_state();
            let events = diff_samples(&state, &next);
            *state = next;
            events
        };
        for event in events {
            self.listeners.dispatch(event);
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, NmSample> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("NetworkManager state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, NmSample> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("NetworkManager state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn sampler_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.sampler.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WifiPlatform for NmWifiPlatform {
    fn is_wifi_enabled(&self) -> bool {
        self.read_state().wifi_enabled
    }

    /// NetworkManager has no location gate on scan results.
    fn is_location_enabled(&self) -> bool {
        true
    }

    fn start_scan(&self) {
        let Some(platform) = self.me.upgrade() else {
            return;
        };
        self.runtime.spawn(async move {
            let devices = match wifi_devices(&platform.connection).await {
                Ok(devices) => devices,
                Err(e) => {
                    warn!("Cannot list Wi-Fi devices: {}", e);
                    return;
                }
            };
            for device in devices {
                if let Err(e) = device.request_scan(HashMap::new()).await {
                    // NetworkManager rejects scans requested too soon after the last one.
                    debug!("Scan request rejected: {}", Error::from(e));
                }
            }
        });
    }

    fn scan_results(&self) -> Vec<ScanResult> {
        self.read_state().results.clone()
    }

    fn connection_info(&self) -> Option<ConnectionInfo> {
        self.read_state().connection.clone()
    }

    fn is_wifi_transport_active(&self) -> bool {
        self.read_state().wifi_transport
    }

    fn set_wifi_enabled(&self, enabled: bool) {
        let Some(platform) = self.me.upgrade() else {
            return;
        };
        self.runtime.spawn(async move {
            let result = async {
                let nm = NetworkManagerProxy::new(&platform.connection).await?;
                nm.set_wireless_enabled(enabled).await?;
                Ok::<(), Error>(())
            }
            .await;
            match result {
                Ok(()) => {
                    info!("Wi-Fi radio switched {}", if enabled { "on" } else { "off" });
                    platform.resample().await;
                }
                Err(Error::PermissionDenied(e)) => {
                    warn!("Not authorized to switch the Wi-Fi radio: {}", e);
                    platform.listeners.dispatch(PlatformEvent::PermissionDenied);
                }
                Err(e) => error!("Failed to switch the Wi-Fi radio: {}", e),
            }
        });
    }

    fn open_settings(&self, panel: SettingsPanel) {
        launch_settings_panel(panel);
    }

    fn register_listener(&self, listener: PlatformListener) -> ListenerId {
        self.listeners.register(listener)
    }

    fn unregister_listener(&self, id: ListenerId) {
        self.listeners.unregister(id);
    }
}

impl Drop for NmWifiPlatform {
    fn drop(&mut self) {
        if let Some(task) = self.sampler_slot().take() {
            task.abort();
        }
    }
}
