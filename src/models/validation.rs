// Camera Wi-Fi Setup - Validation Utilities
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Input validation for user-entered text.

use super::error::{Error, Result};

/// Trim user text and reject it when nothing is left.
pub fn validate_not_blank(s: &str, message: &str) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::ValidationFailed(message.to_string()));
    }
    Ok(s.to_string())
}

/// Validate a new camera name.
pub fn validate_camera_name(s: &str) -> Result<String> {
    validate_not_blank(s, "Name cannot be empty.")
}

/// Validate a camera provisioning code.
pub fn validate_camera_code(s: &str) -> Result<String> {
    validate_not_blank(s, "Camera code cannot be empty.")
}

/// Validate a MAC address string.
pub fn validate_mac_address(s: &str) -> Result<String> {
    // Accept formats: AA:BB:CC:DD:EE:FF or AA-BB-CC-DD-EE-FF
    let normalized = s.replace('-', ":").to_uppercase();
    let parts: Vec<&str> = normalized.split(':').collect();

    if parts.len() != 6 {
        return Err(Error::InvalidMacAddress(s.to_string()));
    }

    for part in &parts {
        if part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidMacAddress(s.to_string()));
        }
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank_trims() {
        assert_eq!(validate_camera_name("  Living room ").unwrap(), "Living room");
        assert!(validate_camera_name("   ").is_err());
        assert!(validate_camera_code("").is_err());
    }

    #[test]
    fn test_blank_messages() {
        let err = validate_camera_code(" ").unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: Camera code cannot be empty.");
    }

    #[test]
    fn test_validate_mac() {
        assert!(validate_mac_address("AA:BB:CC:DD:EE:FF").is_ok());
        assert_eq!(validate_mac_address("aa-bb-cc-dd-ee-ff").unwrap(), "AA:BB:CC:DD:EE:FF");
        assert!(validate_mac_address("invalid").is_err());
        assert!(validate_mac_address("AA:BB:CC:DD:EE").is_err());
    }
}
