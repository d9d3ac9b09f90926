// Camera Wi-Fi Setup - Application Configuration
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Application configuration model.

use serde::{Deserialize, Serialize};

/// Theme mode, stored on disk as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "i32", into = "i32")]
pub enum ThemeMode {
    /// Follow system theme.
    #[default]
    FollowSystem,
    /// Force light theme.
    Light,
    /// Force dark theme.
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FollowSystem => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Mode selected by the theme toggle: dark goes light, anything else goes dark.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::FollowSystem | Self::Light => Self::Dark,
        }
    }
}

impl From<i32> for ThemeMode {
    fn from(value: i32) -> Self {
        match value {
            1 => Self::Light,
            2 => Self::Dark,
            _ => Self::FollowSystem,
        }
    }
}

impl From<ThemeMode> for i32 {
    fn from(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::FollowSystem => -1,
            ThemeMode::Light => 1,
            ThemeMode::Dark => 2,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Theme mode.
    #[serde(default)]
    pub theme_mode: ThemeMode,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Duration of a simulated provisioning attempt in milliseconds.
    #[serde(default = "default_connect_delay_ms")]
    pub connect_delay_ms: u64,

    /// NetworkManager sampling interval in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Code assumed for cameras added without one.
    #[serde(default = "default_camera_code")]
    pub default_camera_code: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_connect_delay_ms() -> u64 {
    2000
}

fn default_poll_interval_secs() -> u64 {
    3
}

fn default_camera_code() -> String {
    super::DEFAULT_CAMERA_CODE.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme_mode: ThemeMode::FollowSystem,
            log_level: default_log_level(),
            connect_delay_ms: default_connect_delay_ms(),
            poll_interval_secs: default_poll_interval_secs(),
            default_camera_code: default_camera_code(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, super::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file with restrictive permissions (0600).
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), super::Error> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
        }
        Ok(())
    }

    /// Parsed log level, falling back to INFO.
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }

    pub fn connect_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.connect_delay_ms)
    }

    /// Sampling interval, never below one second.
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_mode_integer_encoding() {
        assert_eq!(i32::from(ThemeMode::FollowSystem), -1);
        assert_eq!(i32::from(ThemeMode::Light), 1);
        assert_eq!(i32::from(ThemeMode::Dark), 2);
        assert_eq!(ThemeMode::from(2), ThemeMode::Dark);
        assert_eq!(ThemeMode::from(42), ThemeMode::FollowSystem);
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(ThemeMode::Dark.toggled(), ThemeMode::Light);
        assert_eq!(ThemeMode::Light.toggled(), ThemeMode::Dark);
        assert_eq!(ThemeMode::FollowSystem.toggled(), ThemeMode::Dark);
    }

    #[test]
    fn test_config_toml_stores_theme_as_integer() {
        let config = AppConfig {
            theme_mode: ThemeMode::Dark,
            ..AppConfig::default()
        };
        let text = toml::to_string_pretty(&config).expect("config should serialize");
        assert!(text.contains("theme_mode = 2"));
        let restored: AppConfig = toml::from_str(&text).expect("config should parse");
        assert_eq!(restored, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig = toml::from_str("theme_mode = 1").expect("config should parse");
        assert_eq!(config.theme_mode, ThemeMode::Light);
        assert_eq!(config.connect_delay_ms, 2000);
        assert_eq!(config.poll_interval_secs, 3);
        assert_eq!(config.default_camera_code, "NOCODE");
        assert_eq!(config.tracing_level(), tracing::Level::INFO);
    }
}
