// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Instance model shared by the registry, handlers and HTTP layer.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle status of a demo instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// Created and waiting for the runner to provision it.
    Starting,
    /// Provisioned; `port` and `url` are set.
    Running,
    /// Stop requested; teardown in progress.
    Stopping,
    /// Torn down; removed after the cleanup delay.
    Stopped,
    /// Provisioning failed; `error` is set. Terminal.
    Error,
}

impl InstanceStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [InstanceStatus; 5] = [
        InstanceStatus::Starting,
        InstanceStatus::Running,
        InstanceStatus::Stopping,
        InstanceStatus::Stopped,
        InstanceStatus::Error,
    ];

    /// Get the status string
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Starting => "starting",
            InstanceStatus::Running => "running",
            InstanceStatus::Stopping => "stopping",
            InstanceStatus::Stopped => "stopped",
            InstanceStatus::Error => "error",
        }
    }

    /// Check if no further transition can originate from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstanceStatus::Error)
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Launch parameters for a demo environment (`config` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Image reference, e.g. `ghcr.io/acme/demo:latest`.
    pub image: String,
    /// Port the demo listens on inside its container.
    pub port: u16,
    /// Extra environment variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
    /// Command override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl LaunchConfig {
    /// Create a config with just an image and port.
    pub fn new(image: impl Into<String>, port: u16) -> Self {
        Self {
            image: image.into(),
            port,
            env: None,
            command: None,
        }
    }

    /// Add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the command override.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Validate the config before it reaches the registry.
    pub fn validate(&self) -> Result<()> {
        if self.image.trim().is_empty() {
            return Err(Error::InvalidRequest("config.image is required".to_string()));
        }
        if self.port == 0 {
            return Err(Error::InvalidRequest(
                "config.port must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Snapshot of one simulated demo environment.
///
/// Callers only ever see clones; the registry owns the live record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    /// Unique instance id.
    pub id: String,
    /// Owning project.
    pub project_id: String,
    /// Current lifecycle status.
    pub status: InstanceStatus,
    /// Assigned port, only while running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// URL derived from `port`, only while running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// When the instance was created.
    pub created_at: DateTime<Utc>,
    /// Failure cause, only when status is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Instance {
    pub(crate) fn starting(id: String, project_id: String) -> Self {
        Self {
            id,
            project_id,
            status: InstanceStatus::Starting,
            port: None,
            url: None,
            created_at: Utc::now(),
            error: None,
        }
    }

    pub(crate) fn mark_running(&mut self, port: u16, url: String) {
        self.status = InstanceStatus::Running;
        self.port = Some(port);
        self.url = Some(url);
        self.error = None;
    }

    pub(crate) fn mark_failed(&mut self, error: String) {
        self.status = InstanceStatus::Error;
        self.port = None;
        self.url = None;
        self.error = Some(error);
    }

    /// Set a teardown status; the endpoint goes away with it.
    pub(crate) fn mark_teardown(&mut self, status: InstanceStatus) {
        debug_assert!(matches!(
            status,
            InstanceStatus::Stopping | InstanceStatus::Stopped
        ));
        self.status = status;
        self.port = None;
        self.url = None;
        self.error = None;
    }
}
