// Camera Wi-Fi Setup - Preference Storage
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Persisted user preferences.
//!
//! Settings live in `settings.toml` under the configuration directory and
//! are written back on every change. The in-memory copy sits behind an
//! RwLock; lock poisoning is recovered from since the settings value stays
//! valid even if a writer panicked.

use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{error, info, warn};

use crate::models::{AppConfig, Error, Result, ThemeMode, CONFIG_DIR_NAME};

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Preference store backed by a TOML file.
#[derive(Debug)]
pub struct PreferenceStore {
    /// Settings file path.
    settings_file: PathBuf,
    /// Application settings.
    settings: RwLock<AppConfig>,
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStore {
    /// Create a store in the default config directory.
    pub fn new() -> Self {
        Self::with_config_dir(default_config_dir())
    }

    /// Create a store in a specific config directory.
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        if let Err(e) = fs::create_dir_all(&config_dir) {
            error!("Failed to create config directory: {}", e);
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&config_dir, fs::Permissions::from_mode(0o700));
        }

        let store = Self {
            settings_file: config_dir.join(SETTINGS_FILE_NAME),
            settings: RwLock::new(AppConfig::default()),
        };
        store.load_settings();
        store
    }

    /// Read the configuration without creating a store, for use before
    /// logging is set up.
    pub fn load_config() -> Option<AppConfig> {
        let settings_file = default_config_dir().join(SETTINGS_FILE_NAME);
        if settings_file.exists() {
            AppConfig::load_from_file(&settings_file).ok()
        } else {
            None
        }
    }

    // ========================================================================
    // RwLock Helper Methods (handle poisoning gracefully)
    // ========================================================================

    fn read_settings<R>(&self, reader: impl FnOnce(&AppConfig) -> R) -> R {
        match self.settings.read() {
            Ok(guard) => reader(&guard),
            Err(poisoned) => {
                warn!("RwLock poisoned reading settings, recovering");
                reader(&poisoned.into_inner())
            }
        }
    }

    fn write_settings(&self, writer: impl FnOnce(&mut AppConfig)) {
        match self.settings.write() {
            Ok(mut guard) => writer(&mut guard),
            Err(poisoned) => {
                warn!("RwLock poisoned writing settings, recovering");
                writer(&mut poisoned.into_inner())
            }
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    fn load_settings(&self) {
        if !self.settings_file.exists() {
            return;
        }
        match AppConfig::load_from_file(&self.settings_file) {
            Ok(config) => {
                self.write_settings(|s| *s = config);
                info!("Loaded settings from {:?}", self.settings_file);
            }
            Err(e) => error!("Failed to load settings: {}", e),
        }
    }

    fn save_settings(&self, settings: &AppConfig) -> Result<()> {
        settings.save_to_file(&self.settings_file).map_err(|e| {
            error!("Failed to save settings: {}", e);
            match e {
                Error::ConfigWriteFailed(_) => e,
                other => Error::ConfigWriteFailed(other.to_string()),
            }
        })
    }

    /// Get the current settings.
    pub fn settings(&self) -> AppConfig {
        self.read_settings(|s| s.clone())
    }

    /// Persist new settings, then make them current. A failed write leaves
    /// the current settings untouched.
    pub fn update_settings(&self, settings: AppConfig) -> Result<()> {
        self.save_settings(&settings)?;
        self.write_settings(|s| *s = settings);
        Ok(())
    }

    // ========================================================================
    // Theme
    // ========================================================================

    pub fn theme_mode(&self) -> ThemeMode {
        self.read_settings(|s| s.theme_mode)
    }

    pub fn set_theme_mode(&self, mode: ThemeMode) -> Result<()> {
        let settings = AppConfig {
            theme_mode: mode,
            ..self.settings()
        };
        self.update_settings(settings)?;
        info!("Theme set to {}", mode.as_str());
        Ok(())
    }

    /// Switch dark to light and anything else to dark. Returns the new mode.
    pub fn toggle_theme(&self) -> Result<ThemeMode> {
        let next = self.theme_mode().toggled();
        self.set_theme_mode(next)?;
        Ok(next)
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PreferenceStore::with_config_dir(dir.path().to_path_buf());
        assert_eq!(store.theme_mode(), ThemeMode::FollowSystem);
        assert_eq!(store.settings(), AppConfig::default());
    }

    #[test]
    fn test_theme_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PreferenceStore::with_config_dir(dir.path().to_path_buf());
        assert_eq!(store.toggle_theme().expect("theme saved"), ThemeMode::Dark);

        let reopened = PreferenceStore::with_config_dir(dir.path().to_path_buf());
        assert_eq!(reopened.theme_mode(), ThemeMode::Dark);
        assert_eq!(reopened.toggle_theme().expect("theme saved"), ThemeMode::Light);

        let text = fs::read_to_string(dir.path().join(SETTINGS_FILE_NAME)).expect("settings written");
        assert!(text.contains("theme_mode = 1"));
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(SETTINGS_FILE_NAME), "theme_mode = \"purple\"").expect("write");
        let store = PreferenceStore::with_config_dir(dir.path().to_path_buf());
        assert_eq!(store.settings(), AppConfig::default());
    }

    #[test]
    fn test_update_settings_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PreferenceStore::with_config_dir(dir.path().to_path_buf());
        let settings = AppConfig {
            connect_delay_ms: 500,
            ..AppConfig::default()
        };
        store.update_settings(settings.clone()).expect("settings saved");

        let reopened = PreferenceStore::with_config_dir(dir.path().to_path_buf());
        assert_eq!(reopened.settings(), settings);
    }

    #[test]
    fn test_failed_save_keeps_previous_theme() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PreferenceStore::with_config_dir(dir.path().to_path_buf());
        // A directory in place of the settings file makes every write fail.
        fs::create_dir(dir.path().join(SETTINGS_FILE_NAME)).expect("create dir");

        let err = store.set_theme_mode(ThemeMode::Dark).unwrap_err();
        assert!(matches!(err, Error::ConfigWriteFailed(_)));
        assert_eq!(store.theme_mode(), ThemeMode::FollowSystem);
        assert!(store.toggle_theme().is_err());
        assert_eq!(store.settings(), AppConfig::default());
    }

    #[cfg(unix)]
    #[test]
    fn test_settings_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PreferenceStore::with_config_dir(dir.path().to_path_buf());
        store.set_theme_mode(ThemeMode::Light).expect("theme saved");
        let mode = fs::metadata(dir.path().join(SETTINGS_FILE_NAME))
            .expect("settings written")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
