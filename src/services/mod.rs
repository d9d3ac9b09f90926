// Camera Wi-Fi Setup - Services
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Stateful services behind the console front end.
//!
//! - Platform: host Wi-Fi abstraction and its simulated implementation
//! - WifiObserver: publishes ranked scan results and radio state
//! - WifiSetupController: network selection and camera provisioning
//! - CameraRegistry / CameraListController: known cameras and their actions

pub mod camera_list;
pub mod camera_registry;
pub mod platform;
pub mod provisioner;
pub mod simulated;
pub mod wifi_observer;
pub mod wifi_setup;

pub use camera_list::{CameraListController, CameraListEvent};
pub use camera_registry::CameraRegistry;
pub use platform::{SettingsPanel, WifiPlatform};
pub use provisioner::{Provisioner, SimulatedProvisioner};
pub use simulated::SimulatedWifiPlatform;
pub use wifi_observer::WifiObserver;
pub use wifi_setup::{SetupPanel, WifiSetupController, WifiSetupState};
