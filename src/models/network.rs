// Camera Wi-Fi Setup - Network Snapshot Model
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Observed wireless networks.
//!
//! A [`NetworkSnapshot`] is an immutable description of one access point as
//! seen by a single scan. Snapshots are never merged across scans: each scan
//! cycle replaces the previous list wholesale, and the BSSID is the only
//! stable identity between two lists.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Security class of a wireless network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecurityClass {
    Open,
    Wep,
    Wpa,
    Wpa2,
    Wpa3,
    Eap,
    #[default]
    Unknown,
}

impl SecurityClass {
    /// Classify a platform capabilities string such as `[WPA2-PSK-CCMP][ESS]`.
    ///
    /// The strongest advertised scheme wins. Strings that name no known
    /// scheme classify as [`SecurityClass::Unknown`]; this never fails.
    pub fn from_capabilities(capabilities: &str) -> Self {
        if capabilities.contains("WPA3") {
            Self::Wpa3
        } else if capabilities.contains("WPA2") {
            Self::Wpa2
        } else if capabilities.contains("WPA") {
            Self::Wpa
        } else if capabilities.contains("WEP") {
            Self::Wep
        } else if capabilities.contains("EAP") {
            Self::Eap
        } else if capabilities.contains("[ESS]") || capabilities.contains("[IBSS]") {
            Self::Open
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Wep => "WEP",
            Self::Wpa => "WPA",
            Self::Wpa2 => "WPA2",
            Self::Wpa3 => "WPA3",
            Self::Eap => "EAP",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether joining this network needs a passphrase.
    pub fn requires_password(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl fmt::Display for SecurityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed wireless network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Network name.
    pub ssid: String,
    /// Physical address of the radio.
    pub bssid: String,
    /// Signal level in dBm; higher is stronger.
    pub signal_strength: i32,
    /// Security class.
    pub security: SecurityClass,
    /// Whether this is the network the host is connected to.
    pub is_current: bool,
}

impl NetworkSnapshot {
    #[cfg(test)]
    pub fn new(
        ssid: impl Into<String>,
        bssid: impl Into<String>,
        signal_strength: i32,
        security: SecurityClass,
    ) -> Self {
        Self {
            ssid: ssid.into(),
            bssid: bssid.into(),
            signal_strength,
            security,
            is_current: false,
        }
    }

    /// Copy of this snapshot flagged as the current connection.
    pub fn as_current(&self) -> Self {
        Self {
            is_current: true,
            ..self.clone()
        }
    }

    /// Whether both snapshots describe the same radio.
    pub fn same_radio(&self, other: &NetworkSnapshot) -> bool {
        self.bssid.eq_ignore_ascii_case(&other.bssid)
    }

    /// Coarse 0-4 signal bar count for list rendering.
    pub fn signal_bars(&self) -> u8 {
        match self.signal_strength {
            s if s >= -55 => 4,
            s if s >= -67 => 3,
            s if s >= -78 => 2,
            s if s >= -89 => 1,
            _ => 0,
        }
    }
}

/// Sort snapshots strongest first.
///
/// The sort is stable, so networks with equal strength keep the order the
/// platform reported them in.
pub fn sort_by_signal(networks: &mut [NetworkSnapshot]) {
    networks.sort_by(|a, b| b.signal_strength.cmp(&a.signal_strength));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_from_capabilities() {
        assert_eq!(SecurityClass::from_capabilities("[WPA3-SAE-CCMP][ESS]"), SecurityClass::Wpa3);
        assert_eq!(
            SecurityClass::from_capabilities("[WPA-PSK-TKIP][WPA2-PSK-CCMP][ESS]"),
            SecurityClass::Wpa2
        );
        assert_eq!(SecurityClass::from_capabilities("[WPA-PSK-TKIP][ESS]"), SecurityClass::Wpa);
        assert_eq!(SecurityClass::from_capabilities("[WEP][ESS]"), SecurityClass::Wep);
        assert_eq!(SecurityClass::from_capabilities("[EAP][ESS]"), SecurityClass::Eap);
        assert_eq!(SecurityClass::from_capabilities("[ESS]"), SecurityClass::Open);
        assert_eq!(SecurityClass::from_capabilities("[IBSS]"), SecurityClass::Open);
    }

    #[test]
    fn test_unparseable_capabilities_are_unknown() {
        assert_eq!(SecurityClass::from_capabilities(""), SecurityClass::Unknown);
        assert_eq!(SecurityClass::from_capabilities("garbage"), SecurityClass::Unknown);
    }

    #[test]
    fn test_sort_is_descending_and_stable() {
        let mut networks = vec![
            NetworkSnapshot::new("a", "00:00:00:00:00:01", -70, SecurityClass::Open),
            NetworkSnapshot::new("b", "00:00:00:00:00:02", -40, SecurityClass::Wpa2),
            NetworkSnapshot::new("c", "00:00:00:00:00:03", -70, SecurityClass::Wpa2),
            NetworkSnapshot::new("d", "00:00:00:00:00:04", -90, SecurityClass::Wep),
        ];
        sort_by_signal(&mut networks);
        let order: Vec<&str> = networks.iter().map(|n| n.ssid.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_same_radio_ignores_case() {
        let a = NetworkSnapshot::new("x", "AA:BB:CC:DD:EE:FF", -50, SecurityClass::Open);
        let b = NetworkSnapshot::new("y", "aa:bb:cc:dd:ee:ff", -60, SecurityClass::Wpa);
        assert!(a.same_radio(&b));
    }

    #[test]
    fn test_as_current_keeps_other_fields() {
        let a = NetworkSnapshot::new("home", "AA:BB:CC:DD:EE:FF", -50, SecurityClass::Wpa2);
        let current = a.as_current();
        assert!(current.is_current);
        assert_eq!(current.ssid, a.ssid);
        assert_eq!(current.signal_strength, a.signal_strength);
    }

    #[test]
    fn test_signal_bars() {
        let mut n = NetworkSnapshot::new("x", "b", -50, SecurityClass::Open);
        assert_eq!(n.signal_bars(), 4);
        n.signal_strength = -95;
        assert_eq!(n.signal_bars(), 0);
    }
}
