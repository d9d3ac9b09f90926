// Camera Wi-Fi Setup - Data Models
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Data Models
//!
//! Shared types used by the services and the console front end:
//!
//! - **Network**: observed wireless networks and their security class
//! - **Camera**: registered cameras and the QR onboarding payload
//! - **Config**: persisted application settings
//! - **Error**: shared error types

pub mod camera;
pub mod config;
pub mod error;
pub mod network;
pub mod validation;

// Re-export main types for convenience
pub use camera::{parse_qr_payload, CameraRecord, QrCodeInfo, DEFAULT_CAMERA_CODE};
pub use config::{AppConfig, ThemeMode};
pub use error::{Error, Result};
pub use network::{sort_by_signal, NetworkSnapshot, SecurityClass};

/// Configuration directory name (under XDG_CONFIG_HOME).
pub const CONFIG_DIR_NAME: &str = "camera-wifi-setup";
