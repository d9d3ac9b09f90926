// Camera Wi-Fi Setup - Camera Data Model
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Camera records and the QR onboarding payload.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::{Error, Result};

/// Provisioning code used when none is known yet.
pub const DEFAULT_CAMERA_CODE: &str = "NOCODE";

/// A registered camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraRecord {
    /// Unique identifier (the serial number).
    pub id: String,
    /// User-visible name; starts out as the serial.
    pub name: String,
    /// Device serial number.
    pub serial: String,
    /// Provisioning (verification) code printed on the device.
    pub code: String,
    /// Vendor brand.
    pub brand: String,
}

impl CameraRecord {
    /// Create a record keyed by its serial, named after the serial.
    pub fn new(serial: impl Into<String>, code: impl Into<String>, brand: impl Into<String>) -> Self {
        let serial = serial.into();
        Self {
            id: serial.clone(),
            name: serial.clone(),
            serial,
            code: code.into(),
            brand: brand.into(),
        }
    }

    /// Whether this record matches the exact (serial, code) pair.
    pub fn matches(&self, serial: &str, code: &str) -> bool {
        self.serial == serial && self.code == code
    }
}

impl From<&QrCodeInfo> for CameraRecord {
    fn from(info: &QrCodeInfo) -> Self {
        Self::new(info.serial.clone(), info.code.clone(), info.brand.clone())
    }
}

/// Decoded camera QR payload: `brand\nserial\ncode\nmodel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCodeInfo {
    pub brand: String,
    pub serial: String,
    pub code: String,
    pub model: String,
}

impl FromStr for QrCodeInfo {
    type Err = Error;

    /// Parse the four-line payload. Any other field count is rejected as a
    /// whole; fields are taken verbatim.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('\n').collect();
        match parts.as_slice() {
            [brand, serial, code, model] => Ok(Self {
                brand: brand.to_string(),
                serial: serial.to_string(),
                code: code.to_string(),
                model: model.to_string(),
            }),
            _ => Err(Error::InvalidQrFormat { found: parts.len() }),
        }
    }
}

/// Parse a decoded QR text payload.
pub fn parse_qr_payload(text: &str) -> Result<QrCodeInfo> {
    text.parse()
}
