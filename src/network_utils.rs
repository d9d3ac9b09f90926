// Camera Wi-Fi Setup - Network Utilities
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Conversions between NetworkManager's representation of access points
//! and the scan-result form the observer works with, plus launching the
//! desktop's settings panels.

use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::services::SettingsPanel;

// NM80211ApFlags
const AP_FLAGS_PRIVACY: u32 = 0x1;

// NM80211ApSecurityFlags
const AP_SEC_KEY_MGMT_PSK: u32 = 0x100;
const AP_SEC_KEY_MGMT_802_1X: u32 = 0x200;
const AP_SEC_KEY_MGMT_SAE: u32 = 0x400;

/// Remove every double quote from an SSID as reported by the platform.
pub fn strip_ssid_quotes(ssid: &str) -> String {
    ssid.replace('"', "")
}

/// Decode raw SSID bytes, replacing invalid UTF-8.
pub fn decode_ssid(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Map NetworkManager's 0-100 strength to an approximate dBm level.
pub fn strength_percent_to_dbm(percent: u8) -> i32 {
    i32::from(percent.min(100)) / 2 - 100
}

/// Build a capabilities string (`[WPA2-PSK][ESS]` style) from access point
/// flags.
pub fn capabilities_from_nm_flags(flags: u32, wpa_flags: u32, rsn_flags: u32) -> String {
    let mut caps = String::new();
    if rsn_flags & AP_SEC_KEY_MGMT_SAE != 0 {
        caps.push_str("[WPA3-SAE]");
    }
    if rsn_flags & AP_SEC_KEY_MGMT_PSK != 0 {
        caps.push_str("[WPA2-PSK]");
    }
    if rsn_flags & AP_SEC_KEY_MGMT_802_1X != 0 {
        caps.push_str("[WPA2-EAP]");
    }
    if wpa_flags & AP_SEC_KEY_MGMT_PSK != 0 {
        caps.push_str("[WPA-PSK]");
    }
    if wpa_flags & AP_SEC_KEY_MGMT_802_1X != 0 {
        caps.push_str("[WPA-EAP]");
    }
    if flags & AP_FLAGS_PRIVACY != 0 && wpa_flags == 0 && rsn_flags == 0 {
        caps.push_str("[WEP]");
    }
    caps.push_str("[ESS]");
    caps
}

fn settings_commands(panel: SettingsPanel) -> &'static [(&'static str, &'static [&'static str])] {
    match panel {
        SettingsPanel::Wifi => &[
            ("gnome-control-center", &["wifi"]),
            ("nm-connection-editor", &[]),
        ],
        SettingsPanel::Location => &[("gnome-control-center", &["location"])],
    }
}

/// Open the desktop settings panel. Returns false if no launcher could be
/// started.
pub fn launch_settings_panel(panel: SettingsPanel) -> bool {
    for (program, args) in settings_commands(panel) {
        match spawn_detached(program, args) {
            Ok(_) => {
                info!("Opened {:?} settings with {}", panel, program);
                return true;
            }
            Err(e) => debug!("Could not start {}: {}", program, e),
        }
    }
    warn!("No settings application available for {:?}", panel);
    false
}

/// Start a program without waiting for it. A background thread reaps the
/// child when it exits.
fn spawn_detached(program: &'static str, args: &[&str]) -> std::io::Result<JoinHandle<Option<ExitStatus>>> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(thread::spawn(move || match child.wait() {
        Ok(status) => {
            debug!("{} exited with {}", program, status);
            Some(status)
        }
        Err(e) => {
            warn!("Failed to wait for {}: {}", program, e);
            None
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SecurityClass;

    #[cfg(unix)]
    #[test]
    fn test_spawned_launcher_is_reaped() {
        let waiter = spawn_detached("true", &[]).expect("true is available");
        let status = waiter.join().expect("waiter thread").expect("child waited");
        assert!(status.success());
        assert!(spawn_detached("no-such-settings-launcher", &[]).is_err());
    }

    #[test]
    fn test_strip_ssid_quotes() {
        assert_eq!(strip_ssid_quotes("\"HomeNet\""), "HomeNet");
        assert_eq!(strip_ssid_quotes("Home\"Net"), "HomeNet");
        assert_eq!(strip_ssid_quotes("plain"), "plain");
    }

    #[test]
    fn test_decode_ssid() {
        assert_eq!(decode_ssid(b"Cafe"), "Cafe");
        assert_eq!(decode_ssid(&[0x43, 0xff]), "C\u{fffd}");
    }

    #[test]
    fn test_strength_percent_to_dbm() {
        assert_eq!(strength_percent_to_dbm(100), -50);
        assert_eq!(strength_percent_to_dbm(0), -100);
        assert_eq!(strength_percent_to_dbm(70), -65);
        assert_eq!(strength_percent_to_dbm(255), -50);
    }

    #[test]
    fn test_capabilities_classify_like_platform_strings() {
        let class = |f, w, r| SecurityClass::from_capabilities(&capabilities_from_nm_flags(f, w, r));
        assert_eq!(class(0x1, 0, 0x400), SecurityClass::Wpa3);
        assert_eq!(class(0x1, 0x100, 0x100), SecurityClass::Wpa2);
        assert_eq!(class(0x1, 0x100, 0), SecurityClass::Wpa);
        assert_eq!(class(0x1, 0, 0), SecurityClass::Wep);
        assert_eq!(class(0, 0, 0), SecurityClass::Open);
        assert_eq!(capabilities_from_nm_flags(0x1, 0, 0x200), "[WPA2-EAP][ESS]");
    }
}
