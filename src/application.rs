// Camera Wi-Fi Setup - Application
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Application root: owns the services for one session and hands out
//! Wi-Fi setup controllers.

use std::sync::Arc;
use tracing::info;

use crate::models::{AppConfig, Error, Result, ThemeMode};
use crate::services::{
    CameraListController, CameraRegistry, Provisioner, WifiObserver, WifiPlatform, WifiSetupController,
};
use crate::storage::PreferenceStore;
use crate::{APP_NAME, VERSION};

/// Session-wide services.
pub struct Application<P: WifiPlatform> {
    store: Arc<PreferenceStore>,
    camera_list: CameraListController,
    observer: WifiObserver<P>,
    provisioner: Arc<dyn Provisioner>,
}

impl<P: WifiPlatform> Application<P> {
    pub fn new(store: Arc<PreferenceStore>, platform: Arc<P>, provisioner: Arc<dyn Provisioner>) -> Self {
        info!("{} {} starting up", APP_NAME, VERSION);
        let registry = Arc::new(CameraRegistry::new());
        let app = Self {
            store,
            camera_list: CameraListController::new(registry),
            observer: WifiObserver::new(platform),
            provisioner,
        };
        app.apply_theme(app.store.theme_mode());
        app
    }

    pub fn config(&self) -> AppConfig {
        self.store.settings()
    }

    pub fn camera_list(&self) -> &CameraListController {
        &self.camera_list
    }

    pub fn registry(&self) -> &Arc<CameraRegistry> {
        self.camera_list.registry()
    }

    pub fn observer(&self) -> &WifiObserver<P> {
        &self.observer
    }

    /// Open the Wi-Fi setup flow, optionally for a registered camera.
    ///
    /// The returned controller is bound and a first scan is requested.
    /// Must be called inside a tokio runtime.
    pub fn open_wifi_setup(&self, camera_serial: Option<&str>) -> Result<WifiSetupController<P>> {
        if let Some(serial) = camera_serial {
            if self.registry().find_by_id(serial).is_none() {
                return Err(Error::CameraNotFound(serial.to_string()));
            }
        }
        info!("Opening Wi-Fi setup for {}", camera_serial.unwrap_or("<no camera>"));
        let controller = WifiSetupController::new(
            self.observer.clone(),
            Arc::clone(&self.provisioner),
            camera_serial.map(str::to_string),
        );
        controller.bind();
        controller.scan_networks();
        Ok(controller)
    }

    /// Flip the theme and persist it.
    pub fn toggle_theme(&self) -> Result<ThemeMode> {
        let mode = self.store.toggle_theme()?;
        self.apply_theme(mode);
        Ok(mode)
    }

    /// Apply the theme preference.
    fn apply_theme(&self, mode: ThemeMode) {
        info!("Theme: {}", mode.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CameraRecord;
    use crate::services::{SimulatedProvisioner, SimulatedWifiPlatform};
    use std::time::Duration;

    fn app(dir: &tempfile::TempDir) -> Application<SimulatedWifiPlatform> {
        Application::new(
            Arc::new(PreferenceStore::with_config_dir(dir.path().to_path_buf())),
            Arc::new(SimulatedWifiPlatform::demo()),
            Arc::new(SimulatedProvisioner::new(Duration::from_secs(2))),
        )
    }

    #[tokio::test]
    async fn test_open_wifi_setup_requires_known_camera() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(&dir);
        assert!(matches!(
            app.open_wifi_setup(Some("ABC123")),
            Err(Error::CameraNotFound(serial)) if serial == "ABC123"
        ));

        app.registry().add(CameraRecord::new("ABC123", "C001", "Ezviz"));
        let setup = app.open_wifi_setup(Some("ABC123")).expect("camera is registered");
        assert_eq!(setup.camera_serial(), Some("ABC123"));
        assert_eq!(app.observer().current_snapshots().len(), 4);
    }

    #[tokio::test]
    async fn test_open_wifi_setup_without_camera() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(&dir);
        let setup = app.open_wifi_setup(None).expect("setup opens");
        assert_eq!(setup.camera_serial(), None);
    }

    #[test]
    fn test_toggle_theme_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(&dir);
        assert_eq!(app.toggle_theme().expect("saved"), ThemeMode::Dark);
        assert_eq!(app.config().theme_mode, ThemeMode::Dark);
    }
}
