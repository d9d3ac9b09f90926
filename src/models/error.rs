// Camera Wi-Fi Setup - Error Types
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Shared error types for the camera setup application.

use thiserror::Error;

/// Result type alias for camera setup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for camera setup operations.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================
    // Input Errors
    // ========================================
    #[error("Invalid QR code format: expected 4 fields, found {found}")]
    InvalidQrFormat { found: usize },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid MAC address: {0}")]
    InvalidMacAddress(String),

    // ========================================
    // Registry Errors
    // ========================================
    #[error("Camera not found: {0}")]
    CameraNotFound(String),

    // ========================================
    // Provisioning Errors
    // ========================================
    #[error("Provisioning failed: {ssid} - {reason}")]
    ProvisioningFailed { ssid: String, reason: String },

    // ========================================
    // D-Bus Errors
    // ========================================
    #[error("D-Bus error: {0}")]
    Dbus(String),

    #[error("NetworkManager D-Bus error: {0}")]
    NetworkManagerDbus(String),

    #[error("D-Bus connection failed: {0}")]
    DbusConnectionFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // ========================================
    // Storage Errors
    // ========================================
    #[error("Failed to write configuration: {0}")]
    ConfigWriteFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParseFailed(String),

    // ========================================
    // System Errors
    // ========================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new provisioning failed error.
    pub fn provisioning_failed(ssid: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProvisioningFailed {
            ssid: ssid.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error means the system bus is unusable.
    pub fn is_bus_unavailable(&self) -> bool {
        matches!(self, Self::DbusConnectionFailed(_))
    }

    /// Check if this error was caused by rejected user input.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidQrFormat { .. } | Self::ValidationFailed(_) | Self::InvalidMacAddress(_)
        )
    }
}

// Convert from zbus errors, keeping authorization failures distinguishable
impl From<zbus::Error> for Error {
    fn from(err: zbus::Error) -> Self {
        let text = err.to_string();
        if text.contains("PermissionDenied") || text.contains("AccessDenied") {
            Error::PermissionDenied(text)
        } else {
            Error::Dbus(text)
        }
    }
}

// Convert from toml parse errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParseFailed(err.to_string())
    }
}

// Convert from toml serialize errors
impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::ConfigWriteFailed(err.to_string())
    }
}
