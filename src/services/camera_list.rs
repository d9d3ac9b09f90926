// Camera Wi-Fi Setup - Camera List Controller
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Actions behind the camera list screen.
//!
//! Navigation requests go out as one-shot [`CameraListEvent`]s and user
//! notices as one-shot messages. Each channel holds at most one pending
//! value until it is consumed, so a notice and the navigation it precedes
//! do not overwrite each other.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::models::validation::{validate_camera_code, validate_camera_name};
use crate::models::{parse_qr_payload, CameraRecord};

use super::camera_registry::CameraRegistry;

/// Requests from the camera list to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraListEvent {
    /// Open Wi-Fi setup for the camera with this serial.
    NavigateToWifiScan(String),
    ShowRenameDialog(CameraRecord),
    StartQrCodeScan,
    /// Ask for the camera's code before opening Wi-Fi setup.
    PromptForCameraCodeBeforeWifi(String),
}

/// Drives the camera list.
pub struct CameraListController {
    registry: Arc<CameraRegistry>,
    events: watch::Sender<Option<CameraListEvent>>,
    notices: watch::Sender<Option<String>>,
}

impl CameraListController {
    pub fn new(registry: Arc<CameraRegistry>) -> Self {
        Self {
            registry,
            events: watch::Sender::new(None),
            notices: watch::Sender::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<CameraRegistry> {
        &self.registry
    }

    /// Take the pending event, if any.
    pub fn consume_event(&self) -> Option<CameraListEvent> {
        self.events.send_replace(None)
    }

    /// Take the pending notice, if any.
    pub fn consume_notice(&self) -> Option<String> {
        self.notices.send_replace(None)
    }

    /// Rename a camera. Blank names are rejected with a notice.
    pub fn rename_camera(&self, camera: &CameraRecord, name: &str) {
        match validate_camera_name(name) {
            Ok(name) => {
                self.registry.rename(&camera.id, &name);
            }
            Err(e) => {
                debug!("Rename of {} rejected: {}", camera.id, e);
                self.notify("Name cannot be empty.");
            }
        }
    }

    /// Handle text decoded from a camera QR code.
    ///
    /// Unknown cameras are registered first; either way Wi-Fi setup is
    /// requested for the scanned serial.
    pub fn process_qr_text(&self, text: &str) {
        let info = match parse_qr_payload(text) {
            Ok(info) => info,
            Err(e) => {
                info!("Rejected QR payload: {}", e);
                self.notify("Invalid QR code format.");
                return;
            }
        };

        if self.registry.exists(&info.serial, &info.code) {
            self.notify(format!("Camera {} already exists. Opening Wi-Fi setup.", info.serial));
        } else {
            self.registry.add_from_qr(&info);
            self.notify(format!("Camera {} added and ready for Wi-Fi setup.", info.serial));
        }
        self.emit(CameraListEvent::NavigateToWifiScan(info.serial));
    }

    /// Open Wi-Fi setup once the (serial, code) pair is known.
    pub fn validate_code_and_navigate(&self, serial: &str, code: &str) {
        let Ok(code) = validate_camera_code(code) else {
            self.notify("Camera code cannot be empty.");
            return;
        };
        if self.registry.exists(serial, &code) {
            self.emit(CameraListEvent::NavigateToWifiScan(serial.to_string()));
        } else {
            self.notify(format!(
                "Camera with serial {} and code {} not found. Check it or add the camera first.",
                serial, code
            ));
        }
    }

    pub fn on_add_wifi_clicked(&self, camera: &CameraRecord) {
        self.emit(CameraListEvent::PromptForCameraCodeBeforeWifi(camera.serial.clone()));
    }

    pub fn on_rename_clicked(&self, camera: &CameraRecord) {
        self.emit(CameraListEvent::ShowRenameDialog(camera.clone()));
    }

    pub fn on_watch_live_clicked(&self, camera: &CameraRecord) {
        self.notify(format!("Watch live: {}", camera.name));
    }

    pub fn on_watch_recordings_clicked(&self, camera: &CameraRecord) {
        self.notify(format!("Watch recordings: {}", camera.name));
    }

    pub fn on_scan_qr_clicked(&self) {
        self.emit(CameraListEvent::StartQrCodeScan);
    }

    fn emit(&self, event: CameraListEvent) {
        debug!("Camera list event: {:?}", event);
        self.events.send_replace(Some(event));
    }

    fn notify(&self, message: impl Into<String>) {
        self.notices.send_replace(Some(message.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = "Ezviz\nABC123\nC001\nC6CN";

    fn controller() -> CameraListController {
        CameraListController::new(Arc::new(CameraRegistry::new()))
    }

    #[test]
    fn test_qr_registers_new_camera_and_navigates() {
        let list = controller();
        list.process_qr_text(PAYLOAD);

        assert!(list.registry().exists("ABC123", "C001"));
        assert_eq!(
            list.consume_notice().as_deref(),
            Some("Camera ABC123 added and ready for Wi-Fi setup.")
        );
        assert_eq!(
            list.consume_event(),
            Some(CameraListEvent::NavigateToWifiScan("ABC123".to_string()))
        );
        assert_eq!(list.consume_event(), None);
    }

    #[test]
    fn test_qr_for_known_camera_does_not_duplicate() {
        let list = controller();
        list.process_qr_text(PAYLOAD);
        list.process_qr_text(PAYLOAD);

        assert_eq!(list.registry().len(), 1);
        assert_eq!(
            list.consume_notice().as_deref(),
            Some("Camera ABC123 already exists. Opening Wi-Fi setup.")
        );
        assert_eq!(
            list.consume_event(),
            Some(CameraListEvent::NavigateToWifiScan("ABC123".to_string()))
        );
    }

    #[test]
    fn test_invalid_qr_is_rejected_without_mutation() {
        let list = controller();
        list.process_qr_text("Ezviz\nABC123");

        assert!(list.registry().is_empty());
        assert_eq!(list.consume_notice().as_deref(), Some("Invalid QR code format."));
        assert_eq!(list.consume_event(), None);
    }

    #[test]
    fn test_rename_rejects_blank_name() {
        let list = controller();
        list.process_qr_text(PAYLOAD);
        list.consume_notice();
        let camera = list.registry().cameras().remove(0);

        list.rename_camera(&camera, "   ");
        assert_eq!(list.consume_notice().as_deref(), Some("Name cannot be empty."));
        assert_eq!(list.registry().cameras()[0].name, "ABC123");

        list.rename_camera(&camera, "Front door");
        assert_eq!(list.registry().cameras()[0].name, "Front door");
        assert_eq!(list.consume_notice(), None);
    }

    #[test]
    fn test_padded_input_is_trimmed() {
        let list = controller();
        list.process_qr_text(PAYLOAD);
        list.consume_notice();
        list.consume_event();
        let camera = list.registry().cameras().remove(0);

        list.rename_camera(&camera, "  Front door  ");
        assert_eq!(list.registry().cameras()[0].name, "Front door");

        list.validate_code_and_navigate("ABC123", " C001 ");
        assert_eq!(list.consume_notice(), None);
        assert_eq!(
            list.consume_event(),
            Some(CameraListEvent::NavigateToWifiScan("ABC123".to_string()))
        );
    }

    #[test]
    fn test_code_validation() {
        let list = controller();
        list.process_qr_text(PAYLOAD);
        list.consume_notice();
        list.consume_event();

        list.validate_code_and_navigate("ABC123", " ");
        assert_eq!(list.consume_notice().as_deref(), Some("Camera code cannot be empty."));

        list.validate_code_and_navigate("ABC123", "WRONG");
        assert_eq!(
            list.consume_notice().as_deref(),
            Some("Camera with serial ABC123 and code WRONG not found. Check it or add the camera first.")
        );
        assert_eq!(list.consume_event(), None);

        list.validate_code_and_navigate("ABC123", "C001");
        assert_eq!(
            list.consume_event(),
            Some(CameraListEvent::NavigateToWifiScan("ABC123".to_string()))
        );
    }

    #[test]
    fn test_menu_actions_publish_events() {
        let list = controller();
        let camera = CameraRecord::new("ABC123", "C001", "Ezviz");

        list.on_add_wifi_clicked(&camera);
        assert_eq!(
            list.consume_event(),
            Some(CameraListEvent::PromptForCameraCodeBeforeWifi("ABC123".to_string()))
        );

        list.on_rename_clicked(&camera);
        assert_eq!(list.consume_event(), Some(CameraListEvent::ShowRenameDialog(camera.clone())));

        list.on_scan_qr_clicked();
        assert_eq!(list.consume_event(), Some(CameraListEvent::StartQrCodeScan));

        list.on_watch_live_clicked(&camera);
        assert_eq!(list.consume_notice().as_deref(), Some("Watch live: ABC123"));
        list.on_watch_recordings_clicked(&camera);
        assert_eq!(list.consume_notice().as_deref(), Some("Watch recordings: ABC123"));
    }
}
