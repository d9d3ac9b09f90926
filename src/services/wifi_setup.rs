// Camera Wi-Fi Setup - Network Selection and Connection
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! View state for the "pick network, enter password, connect" flow.
//!
//! The controller mirrors the observer's published state into a single
//! [`WifiSetupState`] snapshot and layers the user's selection, password
//! and connection status on top. Every transition publishes a whole new
//! snapshot.
//!
//! Only one provisioning attempt is in flight at a time: a new
//! [`WifiSetupController::connect`] supersedes the previous attempt, which
//! is cancelled and never publishes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::NetworkSnapshot;

use super::platform::WifiPlatform;
use super::provisioner::{ProvisionOutcome, ProvisionRequest, Provisioner};
use super::wifi_observer::WifiObserver;

/// Snapshot of the selection/connection screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiSetupState {
    pub available_networks: Vec<NetworkSnapshot>,
    pub is_wifi_enabled: bool,
    pub is_location_enabled: bool,
    pub current_connected_network: Option<NetworkSnapshot>,
    pub selected_network: Option<NetworkSnapshot>,
    pub password: String,
    pub connection_status_message: Option<String>,
    pub show_connection_status: bool,
    pub is_connecting: bool,
}

impl Default for WifiSetupState {
    fn default() -> Self {
        Self {
            available_networks: Vec::new(),
            is_wifi_enabled: false,
            is_location_enabled: true,
            current_connected_network: None,
            selected_network: None,
            password: String::new(),
            connection_status_message: None,
            show_connection_status: false,
            is_connecting: false,
        }
    }
}

/// Which panel the screen should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupPanel {
    WifiOff,
    LocationOff,
    Networks,
}

impl WifiSetupState {
    pub fn panel(&self) -> SetupPanel {
        if !self.is_wifi_enabled {
            SetupPanel::WifiOff
        } else if !self.is_location_enabled {
            SetupPanel::LocationOff
        } else {
            SetupPanel::Networks
        }
    }
}

/// Drives network selection and the provisioning attempt for one camera.
pub struct WifiSetupController<P: WifiPlatform> {
    observer: WifiObserver<P>,
    provisioner: Arc<dyn Provisioner>,
    camera_serial: Option<String>,
    state: Arc<watch::Sender<WifiSetupState>>,
    attempt_generation: Arc<AtomicU64>,
    attempt: Mutex<Option<JoinHandle<()>>>,
    binding: Mutex<Option<JoinHandle<()>>>,
}

impl<P: WifiPlatform> WifiSetupController<P> {
    pub fn new(
        observer: WifiObserver<P>,
        provisioner: Arc<dyn Provisioner>,
        camera_serial: Option<String>,
    ) -> Self {
        let initial = WifiSetupState {
            is_wifi_enabled: observer.is_wifi_enabled(),
            is_location_enabled: *observer.location_enabled().borrow(),
            ..WifiSetupState::default()
        };
        Self {
            observer,
            provisioner,
            camera_serial,
            state: Arc::new(watch::Sender::new(initial)),
            attempt_generation: Arc::new(AtomicU64::new(0)),
            attempt: Mutex::new(None),
            binding: Mutex::new(None),
        }
    }

    pub fn camera_serial(&self) -> Option<&str> {
        self.camera_serial.as_deref()
    }

    pub fn state(&self) -> WifiSetupState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WifiSetupState> {
        self.state.subscribe()
    }

    /// Start mirroring the observer into the view state.
    ///
    /// Also keeps a platform subscription open, so broadcasts refresh the
    /// observer while this controller is bound. Must be called inside a
    /// tokio runtime. Binding twice replaces the earlier binding.
    pub fn bind(&self) {
        let mut networks = self.observer.networks();
        let mut enabled = self.observer.wifi_enabled();
        let mut location = self.observer.location_enabled();
        let mut connected = self.observer.connected_network();
        let mut notices = self.observer.notices();
        let mut events = self.observer.watch();
        let state = Arc::clone(&self.state);

        let task = tokio::spawn(async move {
            apply_networks(&state, networks.borrow_and_update().clone());
            apply_wifi_enabled(&state, *enabled.borrow_and_update());
            apply_location_enabled(&state, *location.borrow_and_update());
            apply_connected(&state, connected.borrow_and_update().clone());
            // Only refusals that happen while bound are shown.
            notices.mark_unchanged();

            loop {
                tokio::select! {
                    changed = networks.changed() => {
                        if changed.is_err() { break; }
                        apply_networks(&state, networks.borrow_and_update().clone());
                    }
                    changed = enabled.changed() => {
                        if changed.is_err() { break; }
                        apply_wifi_enabled(&state, *enabled.borrow_and_update());
                    }
                    changed = location.changed() => {
                        if changed.is_err() { break; }
                        apply_location_enabled(&state, *location.borrow_and_update());
                    }
                    changed = connected.changed() => {
                        if changed.is_err() { break; }
                        apply_connected(&state, connected.borrow_and_update().clone());
                    }
                    changed = notices.changed() => {
                        if changed.is_err() { break; }
                        if let Some(notice) = notices.borrow_and_update().clone() {
                            apply_notice(&state, notice);
                        }
                    }
                    signal = events.recv() => {
                        if signal.is_none() { break; }
                    }
                }
            }
            debug!("Wi-Fi setup binding ended");
        });

        if let Some(previous) = lock_slot(&self.binding).replace(task) {
            previous.abort();
        }
    }

    pub fn scan_networks(&self) {
        self.observer.scan_networks();
    }

    /// Store the selection. Visibility in the current scan is not checked.
    pub fn select_network(&self, network: NetworkSnapshot) {
        debug!("Selected network {} ({})", network.ssid, network.bssid);
        self.state.send_modify(|s| s.selected_network = Some(network));
    }

    /// Store the password verbatim.
    pub fn set_password(&self, password: impl Into<String>) {
        let password = password.into();
        self.state.send_modify(|s| s.password = password);
    }

    /// Push the selected network's credentials to the camera.
    ///
    /// Does nothing without a selection. The "attempting" status is
    /// published before this returns; the terminal status follows when the
    /// attempt resolves. Must be called inside a tokio runtime.
    pub fn connect(&self) {
        let (selected, password) = {
            let s = self.state.borrow();
            (s.selected_network.clone(), s.password.clone())
        };
        let Some(selected) = selected else {
            debug!("Connect requested without a selected network");
            return;
        };

        let generation = self.attempt_generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = lock_slot(&self.attempt).take() {
            if !previous.is_finished() {
                info!("Superseding in-flight provisioning attempt");
            }
            previous.abort();
        }

        info!(
            "Provisioning camera {} with network {}",
            self.camera_serial.as_deref().unwrap_or("<none>"),
            selected.ssid
        );
        let ssid = selected.ssid.clone();
        self.state.send_modify(|s| {
            s.connection_status_message = Some(format!("Trying to connect to {}...", ssid));
            s.show_connection_status = true;
            s.is_connecting = true;
        });

        let attempt = self.provisioner.provision(ProvisionRequest {
            camera_serial: self.camera_serial.clone(),
            ssid: selected.ssid,
            bssid: selected.bssid,
            password,
        });
        let state = Arc::clone(&self.state);
        let generations = Arc::clone(&self.attempt_generation);

        let task = tokio::spawn(async move {
            let message = match attempt.await {
                Ok(ProvisionOutcome::Connected) => {
                    info!("Provisioning succeeded for {}", ssid);
                    format!("Connected successfully to {}!", ssid)
                }
                Ok(ProvisionOutcome::Failed) => {
                    warn!("Provisioning failed for {}", ssid);
                    format!("Failed to connect to {}.", ssid)
                }
                Err(e) => {
                    warn!("Provisioning error for {}: {}", ssid, e);
                    format!("Error: {}", e)
                }
            };
            if generations.load(Ordering::SeqCst) != generation {
                debug!("Dropping result of superseded attempt for {}", ssid);
                return;
            }
            state.send_modify(|s| {
                s.connection_status_message = Some(message);
                s.show_connection_status = true;
                s.is_connecting = false;
            });
        });
        *lock_slot(&self.attempt) = Some(task);
    }

    /// Hide the status message. Idempotent.
    pub fn dismiss_status(&self) {
        self.state.send_if_modified(|s| {
            let changed = s.show_connection_status || s.connection_status_message.is_some();
            s.show_connection_status = false;
            s.connection_status_message = None;
            changed
        });
    }

    pub fn set_wifi_enabled(&self, enabled: bool) {
        self.observer.set_wifi_enabled(enabled);
    }

    pub fn open_wifi_settings(&self) {
        self.observer.open_wifi_settings();
    }

    pub fn open_location_settings(&self) {
        self.observer.open_location_settings();
    }
}

impl<P: WifiPlatform> Drop for WifiSetupController<P> {
    fn drop(&mut self) {
        // The in-flight attempt is left running; only the mirror stops.
        if let Some(binding) = lock_slot(&self.binding).take() {
            binding.abort();
        }
    }
}

fn apply_networks(state: &watch::Sender<WifiSetupState>, networks: Vec<NetworkSnapshot>) {
    state.send_modify(|s| s.available_networks = networks);
}

fn apply_wifi_enabled(state: &watch::Sender<WifiSetupState>, enabled: bool) {
    state.send_modify(|s| s.is_wifi_enabled = enabled);
}

fn apply_location_enabled(state: &watch::Sender<WifiSetupState>, enabled: bool) {
    state.send_modify(|s| s.is_location_enabled = enabled);
}

/// Track the connected network and pre-select it when nothing is selected.
fn apply_connected(state: &watch::Sender<WifiSetupState>, connected: Option<NetworkSnapshot>) {
    state.send_modify(|s| {
        if s.selected_network.is_none() {
            if let Some(network) = &connected {
                debug!("Auto-selecting connected network {}", network.ssid);
                s.selected_network = Some(network.clone());
            }
        }
        s.current_connected_network = connected;
    });
}

/// Show a platform notice in the dismissible status line.
fn apply_notice(state: &watch::Sender<WifiSetupState>, notice: String) {
    state.send_modify(|s| {
        s.connection_status_message = Some(notice);
        s.show_connection_status = true;
    });
}

fn lock_slot(slot: &Mutex<Option<JoinHandle<()>>>) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Task slot lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SecurityClass;
    use crate::services::platform::{ConnectionInfo, PlatformEvent};
    use crate::services::provisioner::SimulatedProvisioner;
    use crate::services::simulated::{scan_result, SimulatedWifiPlatform};
    use std::time::Duration;

    const DELAY: Duration = Duration::from_secs(2);

    fn setup(provisioner: SimulatedProvisioner) -> (Arc<SimulatedWifiPlatform>, WifiSetupController<SimulatedWifiPlatform>) {
        let platform = Arc::new(SimulatedWifiPlatform::new());
        platform.set_scan_results(vec![
            scan_result("HomeNet", "F4:F2:6D:A0:11:5C", -48, "[WPA2-PSK-CCMP][ESS]"),
            scan_result("Cafe", "3C:84:6A:10:22:01", -80, "[ESS]"),
        ]);
        let observer = WifiObserver::new(Arc::clone(&platform));
        let controller = WifiSetupController::new(observer, Arc::new(provisioner), Some("ABC123".to_string()));
        (platform, controller)
    }

    fn network(ssid: &str) -> NetworkSnapshot {
        NetworkSnapshot::new(ssid, "00:11:22:33:44:55", -50, SecurityClass::Wpa2)
    }

    async fn wait_until(
        rx: &mut watch::Receiver<WifiSetupState>,
        predicate: impl FnMut(&WifiSetupState) -> bool,
    ) -> WifiSetupState {
        tokio::time::timeout(Duration::from_secs(30), rx.wait_for(predicate))
            .await
            .expect("state did not converge in time")
            .expect("state channel closed")
            .clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_publishes_attempting_then_result() {
        let (_platform, controller) = setup(SimulatedProvisioner::new(DELAY));
        controller.select_network(network("HomeNet"));
        controller.set_password("secret");
        let mut rx = controller.subscribe();

        controller.connect();
        let state = controller.state();
        assert_eq!(
            state.connection_status_message.as_deref(),
            Some("Trying to connect to HomeNet...")
        );
        assert!(state.show_connection_status);
        assert!(state.is_connecting);

        let done = wait_until(&mut rx, |s| !s.is_connecting).await;
        assert_eq!(
            done.connection_status_message.as_deref(),
            Some("Connected successfully to HomeNet!")
        );
        assert!(done.show_connection_status);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_and_error_messages() {
        let (_platform, controller) =
            setup(SimulatedProvisioner::with_outcome(DELAY, ProvisionOutcome::Failed));
        controller.select_network(network("Cafe"));
        let mut rx = controller.subscribe();
        controller.connect();
        let done = wait_until(&mut rx, |s| !s.is_connecting).await;
        assert_eq!(done.connection_status_message.as_deref(), Some("Failed to connect to Cafe."));

        let (_platform, controller) = setup(SimulatedProvisioner::failing(DELAY, "timeout"));
        controller.select_network(network("Cafe"));
        let mut rx = controller.subscribe();
        controller.connect();
        let done = wait_until(&mut rx, |s| !s.is_connecting).await;
        assert_eq!(
            done.connection_status_message.as_deref(),
            Some("Error: Provisioning failed: Cafe - timeout")
        );
    }

    #[tokio::test]
    async fn test_connect_without_selection_is_noop() {
        let (_platform, controller) = setup(SimulatedProvisioner::new(DELAY));
        let before = controller.state();
        controller.connect();
        assert_eq!(controller.state(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_attempt_supersedes_previous() {
        let (_platform, controller) = setup(SimulatedProvisioner::new(DELAY));
        let mut rx = controller.subscribe();

        controller.select_network(network("First"));
        controller.connect();
        tokio::time::sleep(Duration::from_millis(500)).await;

        controller.select_network(network("Second"));
        controller.connect();

        let done = wait_until(&mut rx, |s| !s.is_connecting).await;
        assert_eq!(
            done.connection_status_message.as_deref(),
            Some("Connected successfully to Second!")
        );

        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(
            controller.state().connection_status_message.as_deref(),
            Some("Connected successfully to Second!")
        );
    }

    #[tokio::test]
    async fn test_dismiss_status_is_idempotent() {
        let (_platform, controller) = setup(SimulatedProvisioner::new(DELAY));
        controller.select_network(network("HomeNet"));
        controller.connect();

        controller.dismiss_status();
        let state = controller.state();
        assert!(state.connection_status_message.is_none());
        assert!(!state.show_connection_status);

        controller.dismiss_status();
        assert_eq!(controller.state(), state);
    }

    #[tokio::test]
    async fn test_password_and_selection_are_stored_verbatim() {
        let (_platform, controller) = setup(SimulatedProvisioner::new(DELAY));
        controller.set_password("  spaced  ");
        controller.select_network(network("Not Visible"));
        let state = controller.state();
        assert_eq!(state.password, "  spaced  ");
        assert_eq!(state.selected_network.map(|n| n.ssid).as_deref(), Some("Not Visible"));
    }

    #[tokio::test]
    async fn test_bind_mirrors_observer_and_auto_selects() {
        let (platform, controller) = setup(SimulatedProvisioner::new(DELAY));
        platform.set_connection(Some(ConnectionInfo {
            ssid: Some("\"HomeNet\"".to_string()),
            bssid: Some("F4:F2:6D:A0:11:5C".to_string()),
            rssi: Some(-48),
        }));
        let mut rx = controller.subscribe();
        controller.bind();
        controller.scan_networks();

        let state = wait_until(&mut rx, |s| s.available_networks.len() == 2 && s.selected_network.is_some()).await;
        assert_eq!(state.available_networks[0].ssid, "HomeNet");
        assert_eq!(state.selected_network.as_ref().map(|n| n.ssid.as_str()), Some("HomeNet"));
        assert_eq!(
            state.current_connected_network.as_ref().map(|n| n.ssid.as_str()),
            Some("HomeNet")
        );
        assert_eq!(state.panel(), SetupPanel::Networks);
    }

    #[tokio::test]
    async fn test_auto_select_keeps_user_choice() {
        let (platform, controller) = setup(SimulatedProvisioner::new(DELAY));
        controller.select_network(network("Cafe"));
        platform.set_connection(Some(ConnectionInfo {
            ssid: Some("HomeNet".to_string()),
            bssid: None,
            rssi: None,
        }));
        let mut rx = controller.subscribe();
        controller.bind();
        controller.scan_networks();

        let state = wait_until(&mut rx, |s| s.current_connected_network.is_some()).await;
        assert_eq!(state.selected_network.map(|n| n.ssid).as_deref(), Some("Cafe"));
    }

    #[tokio::test]
    async fn test_radio_off_broadcast_reaches_view_state() {
        let (platform, controller) = setup(SimulatedProvisioner::new(DELAY));
        let mut rx = controller.subscribe();
        controller.bind();
        controller.scan_networks();
        wait_until(&mut rx, |s| s.available_networks.len() == 2).await;

        platform.set_wifi_enabled(false);
        let state = wait_until(&mut rx, |s| !s.is_wifi_enabled).await;
        let state = if state.available_networks.is_empty() {
            state
        } else {
            wait_until(&mut rx, |s| s.available_networks.is_empty()).await
        };
        assert!(state.current_connected_network.is_none());
        assert_eq!(state.panel(), SetupPanel::WifiOff);
    }

    #[tokio::test]
    async fn test_permission_refusal_shows_dismissible_notice() {
        let (platform, controller) = setup(SimulatedProvisioner::new(DELAY));
        let mut rx = controller.subscribe();
        controller.bind();
        controller.scan_networks();
        wait_until(&mut rx, |s| s.available_networks.len() == 2).await;

        platform.emit(PlatformEvent::PermissionDenied);
        let state = wait_until(&mut rx, |s| s.show_connection_status).await;
        assert_eq!(
            state.connection_status_message.as_deref(),
            Some("Not allowed to change Wi-Fi settings on this system.")
        );
        assert_eq!(state.available_networks.len(), 2);

        controller.dismiss_status();
        let state = controller.state();
        assert!(!state.show_connection_status);
        assert!(state.connection_status_message.is_none());
    }

    #[tokio::test]
    async fn test_drop_releases_platform_listener() {
        let (platform, controller) = setup(SimulatedProvisioner::new(DELAY));
        controller.bind();
        assert_eq!(platform.listener_count(), 1);

        drop(controller);
        for _ in 0..10 {
            if platform.listener_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(platform.listener_count(), 0);

        platform.emit(PlatformEvent::ScanResultsAvailable);
    }
}
