// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runner trait definitions.
//!
//! Defines the abstract interface for demo environment runners.

use async_trait::async_trait;
use thiserror::Error;

use crate::instance::LaunchConfig;

/// Errors from runner operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerError {
    /// Container/process failed to start.
    #[error("Container start failed: {0}")]
    StartFailed(String),
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Options for launching an instance.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Instance ID
    pub instance_id: String,
    /// Project the instance belongs to
    pub project_id: String,
    /// Launch parameters supplied by the caller
    pub config: LaunchConfig,
}

impl LaunchOptions {
    /// Container name used by the runner for this launch.
    pub fn container_name(&self) -> String {
        format!("showcase-{}", self.instance_id)
    }
}

/// Handle for a provisioned instance.
#[derive(Debug, Clone)]
pub struct RunnerHandle {
    /// Unique identifier for this launch (container name for docker-like runners)
    pub handle_id: String,
    /// Instance ID
    pub instance_id: String,
    /// Host port the instance is reachable on
    pub port: u16,
    /// When provisioning completed
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for demo environment runners.
///
/// Runners are PURE execution engines - they do NOT touch the registry.
/// Status transitions are applied by the caller.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Runner type identifier (e.g., "simulated", "docker")
    fn runner_type(&self) -> &'static str;

    /// Provision an instance and wait until it is reachable.
    ///
    /// On success the returned handle carries the assigned host port. The
    /// registry always drives this future to completion and releases the
    /// handle itself if the instance is no longer wanted.
    async fn provision(&self, options: &LaunchOptions) -> Result<RunnerHandle>;

    /// Check if a provisioned instance is still up.
    ///
    /// Consulted before teardown; an instance that is already gone is not
    /// stopped again.
    async fn is_running(&self, handle: &RunnerHandle) -> bool;

    /// Tear down a provisioned instance.
    async fn stop(&self, handle: &RunnerHandle) -> Result<()>;
}
