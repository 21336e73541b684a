// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Types for the management SDK.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Instance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// Instance is being provisioned.
    Starting,
    /// Instance is reachable at its URL.
    Running,
    /// Instance is being torn down.
    Stopping,
    /// Instance is torn down and about to be removed.
    Stopped,
    /// Provisioning failed.
    Error,
}

impl InstanceStatus {
    /// Check if no further transition happens without a new command.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstanceStatus::Error)
    }

    /// Get the status string.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Starting => "starting",
            InstanceStatus::Running => "running",
            InstanceStatus::Stopping => "stopping",
            InstanceStatus::Stopped => "stopped",
            InstanceStatus::Error => "error",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "starting" => Ok(InstanceStatus::Starting),
            "running" => Ok(InstanceStatus::Running),
            "stopping" => Ok(InstanceStatus::Stopping),
            "stopped" => Ok(InstanceStatus::Stopped),
            "error" => Ok(InstanceStatus::Error),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// Health status of showcase-environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Whether the server accepts new work.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Uptime in milliseconds.
    pub uptime_ms: u64,
    /// Runner type backing the server.
    pub runner: String,
    /// Tracked instances per status.
    pub instances: BTreeMap<InstanceStatus, usize>,
}

impl HealthStatus {
    /// Total number of tracked instances.
    pub fn total_instances(&self) -> usize {
        self.instances.values().sum()
    }
}

/// Instance snapshot as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    /// Instance ID.
    pub id: String,
    /// Owning project.
    pub project_id: String,
    /// Current status.
    pub status: InstanceStatus,
    /// Assigned port, only while running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Public URL, only while running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// When the instance was created.
    pub created_at: DateTime<Utc>,
    /// Failure cause, only when status is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Options for starting an instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartInstanceOptions {
    /// Project the instance belongs to.
    pub project_id: String,
    /// Image to launch.
    pub image: String,
    /// Port the demo listens on inside its container.
    pub port: u16,
    /// Custom environment variables.
    pub env: HashMap<String, String>,
    /// Command override.
    pub command: Option<String>,
}

impl StartInstanceOptions {
    /// Create new options with required fields.
    pub fn new(project_id: impl Into<String>, image: impl Into<String>, port: u16) -> Self {
        Self {
            project_id: project_id.into(),
            image: image.into(),
            port,
            ..Default::default()
        }
    }

    /// Add a single environment variable.
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the command override.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Build the `start` command envelope.
    pub(crate) fn to_envelope(&self) -> Value {
        let mut config = json!({
            "image": self.image,
            "port": self.port,
        });
        if !self.env.is_empty() {
            config["env"] = json!(self.env);
        }
        if let Some(command) = &self.command {
            config["command"] = json!(command);
        }
        json!({
            "action": "start",
            "projectId": self.project_id,
            "config": config,
        })
    }
}

/// Result of a stop command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopInstanceResult {
    /// Whether the instance existed and is now stopping.
    pub success: bool,
}

/// Error body returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
