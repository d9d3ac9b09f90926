// Camera Wi-Fi Setup - Camera Provisioning
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Seam for pushing Wi-Fi credentials to a camera.
//!
//! The device-side handshake belongs to the camera vendor's SDK. Until one
//! is wired in, [`SimulatedProvisioner`] stands in with a fixed latency.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

use crate::models::{Error, Result};

/// Credentials for one provisioning attempt.
#[derive(Clone)]
pub struct ProvisionRequest {
    /// Camera being configured, when known.
    pub camera_serial: Option<String>,
    pub ssid: String,
    pub bssid: String,
    pub password: String,
}

impl fmt::Debug for ProvisionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionRequest")
            .field("camera_serial", &self.camera_serial)
            .field("ssid", &self.ssid)
            .field("bssid", &self.bssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Terminal result of an attempt that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Connected,
    /// The camera rejected the credentials.
    #[allow(dead_code)]
    Failed,
}

pub type ProvisionFuture = Pin<Box<dyn Future<Output = Result<ProvisionOutcome>> + Send + 'static>>;

/// Pushes network credentials to a camera.
pub trait Provisioner: Send + Sync + 'static {
    fn provision(&self, request: ProvisionRequest) -> ProvisionFuture;
}

/// Stand-in provisioner that resolves after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedProvisioner {
    delay: Duration,
    outcome: std::result::Result<ProvisionOutcome, String>,
}

impl SimulatedProvisioner {
    /// Always succeeds after `delay`.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            outcome: Ok(ProvisionOutcome::Connected),
        }
    }

    #[cfg(test)]
    /// Resolves to `outcome` after `delay`.
    pub fn with_outcome(delay: Duration, outcome: ProvisionOutcome) -> Self {
        Self {
            delay,
            outcome: Ok(outcome),
        }
    }

    #[cfg(test)]
    /// Errors with `reason` after `delay`.
    pub fn failing(delay: Duration, reason: impl Into<String>) -> Self {
        Self {
            delay,
            outcome: Err(reason.into()),
        }
    }
}

impl Provisioner for SimulatedProvisioner {
    fn provision(&self, request: ProvisionRequest) -> ProvisionFuture {
        let delay = self.delay;
        let outcome = self.outcome.clone();
        Box::pin(async move {
            debug!("Simulating provisioning of {:?}", request);
            tokio::time::sleep(delay).await;
            outcome.map_err(|reason| Error::provisioning_failed(request.ssid, reason))
        })
    }
}
