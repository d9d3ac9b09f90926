// Camera Wi-Fi Setup - Camera Registry
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! In-memory registry of cameras known to this session.
//!
//! Records are kept in insertion order and identified by the exact
//! (serial, code) pair. Every mutation publishes a whole new list.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::{CameraRecord, QrCodeInfo};

/// Registry of cameras.
pub struct CameraRegistry {
    cameras: watch::Sender<Vec<CameraRecord>>,
}

impl Default for CameraRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            cameras: watch::Sender::new(Vec::new()),
        }
    }

    /// Append a record. A record with the same (serial, code) pair already
    /// present is logged and ignored. Returns true if the record was added.
    pub fn add(&self, record: CameraRecord) -> bool {
        let serial = record.serial.clone();
        let added = self.cameras.send_if_modified(|cameras| {
            if cameras.iter().any(|c| c.matches(&record.serial, &record.code)) {
                return false;
            }
            cameras.push(record);
            true
        });
        if added {
            info!("Registered camera {}", serial);
        } else {
            warn!("Camera {} is already registered, ignoring", serial);
        }
        added
    }

    /// Register the camera described by a QR payload.
    pub fn add_from_qr(&self, info: &QrCodeInfo) -> bool {
        self.add(CameraRecord::from(info))
    }

    /// Rename the record with `id`. Returns false if no record matches.
    pub fn rename(&self, id: &str, name: &str) -> bool {
        self.update(id, |camera| camera.name = name.to_string())
    }

    /// Replace the provisioning code of the record with `id`.
    #[allow(dead_code)]
    pub fn update_code(&self, id: &str, code: &str) -> bool {
        self.update(id, |camera| camera.code = code.to_string())
    }

    pub fn exists(&self, serial: &str, code: &str) -> bool {
        self.cameras.borrow().iter().any(|c| c.matches(serial, code))
    }

    pub fn find_by_id(&self, id: &str) -> Option<CameraRecord> {
        self.cameras.borrow().iter().find(|c| c.id == id).cloned()
    }

    /// Current records in insertion order.
    pub fn cameras(&self) -> Vec<CameraRecord> {
        self.cameras.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.cameras.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[allow(dead_code)]
    pub fn subscribe(&self) -> watch::Receiver<Vec<CameraRecord>> {
        self.cameras.subscribe()
    }

    fn update(&self, id: &str, apply: impl FnOnce(&mut CameraRecord)) -> bool {
        let updated = self.cameras.send_if_modified(|cameras| {
            let Some(index) = cameras.iter().position(|c| c.id == id) else {
                return false;
            };
            let mut next = cameras.clone();
            apply(&mut next[index]);
            *cameras = next;
            true
        });
        if !updated {
            debug!("No camera with id {}", id);
        }
        updated
    }
}
