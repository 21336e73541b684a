// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! ManagementClient for interacting with showcase-environment.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::config::SdkConfig;
use crate::error::{Result, SdkError};
use crate::types::{
    ErrorBody, HealthStatus, InstanceInfo, InstanceStatus, StartInstanceOptions,
    StopInstanceResult,
};

/// High-level client for the showcase-environment HTTP gateway.
///
/// Wraps the `{action, ...}` command envelope and the read-only routes in
/// typed methods.
pub struct ManagementClient {
    http: reqwest::Client,
    config: SdkConfig,
}

impl ManagementClient {
    /// Create a new client with the given configuration.
    pub fn new(config: SdkConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SdkError::Config(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = SdkConfig::from_env()?;
        Self::new(config)
    }

    /// Create a client for a gateway on localhost.
    pub fn localhost() -> Result<Self> {
        Self::new(SdkConfig::default())
    }

    /// Get the client configuration.
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// Send a command envelope to `POST /api/docker`.
    async fn send_command<T: DeserializeOwned>(&self, envelope: &Value) -> Result<T> {
        let response = self
            .http
            .post(self.config.url("/api/docker"))
            .json(envelope)
            .send()
            .await?;
        decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .http
            .get(self.config.url(path))
            .query(query)
            .send()
            .await?;
        decode(response).await
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Check health of showcase-environment.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<HealthStatus> {
        debug!("Performing health check");
        self.get_json("/health", &[]).await
    }

    // =========================================================================
    // Instance Management
    // =========================================================================

    /// Start an instance. Returns the snapshot in `starting` status.
    #[instrument(skip(self, options), fields(project_id = %options.project_id))]
    pub async fn start_instance(&self, options: StartInstanceOptions) -> Result<InstanceInfo> {
        if options.project_id.trim().is_empty() {
            return Err(SdkError::InvalidInput("project_id is required".to_string()));
        }
        if options.image.trim().is_empty() {
            return Err(SdkError::InvalidInput("image is required".to_string()));
        }

        let instance: InstanceInfo = self.send_command(&options.to_envelope()).await?;
        info!(instance_id = %instance.id, "Instance starting");
        Ok(instance)
    }

    /// Stop an instance. Returns `false` if the server does not know the id.
    #[instrument(skip(self), fields(instance_id = %instance_id))]
    pub async fn stop_instance(&self, instance_id: &str) -> Result<bool> {
        let result: StopInstanceResult = self
            .send_command(&json!({"action": "stop", "containerId": instance_id}))
            .await?;
        debug!(success = result.success, "Stop acknowledged");
        Ok(result.success)
    }

    /// Get a snapshot of an instance, or `None` if it does not exist.
    #[instrument(skip(self), fields(instance_id = %instance_id))]
    pub async fn get_instance(&self, instance_id: &str) -> Result<Option<InstanceInfo>> {
        match self.get_json("/api/docker", &[("id", instance_id)]).await {
            Ok(instance) => Ok(Some(instance)),
            Err(SdkError::InstanceNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// List instances, optionally filtered by project.
    #[instrument(skip(self))]
    pub async fn list_instances(&self, project_id: Option<&str>) -> Result<Vec<InstanceInfo>> {
        match project_id {
            Some(project_id) => {
                self.get_json("/api/docker/instances", &[("projectId", project_id)])
                    .await
            }
            None => self.get_json("/api/docker/instances", &[]).await,
        }
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Poll an instance until `predicate` holds.
    ///
    /// Fails with [`SdkError::InstanceNotFound`] if the instance disappears and
    /// with [`SdkError::Timeout`] if `timeout` elapses first.
    pub async fn wait_until<F>(
        &self,
        instance_id: &str,
        poll_interval: Duration,
        timeout: Duration,
        predicate: F,
    ) -> Result<InstanceInfo>
    where
        F: Fn(&InstanceInfo) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            let info = self
                .get_instance(instance_id)
                .await?
                .ok_or_else(|| SdkError::InstanceNotFound(instance_id.to_string()))?;
            if predicate(&info) {
                return Ok(info);
            }
            if Instant::now() + poll_interval > deadline {
                return Err(SdkError::Timeout(timeout.as_millis() as u64));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Wait for an instance to reach `target`, or a terminal status.
    #[instrument(skip(self), fields(instance_id = %instance_id, target = %target))]
    pub async fn wait_for_status(
        &self,
        instance_id: &str,
        target: InstanceStatus,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<InstanceInfo> {
        self.wait_until(instance_id, poll_interval, timeout, |info| {
            info.status == target || info.status.is_terminal()
        })
        .await
    }

    /// Start an instance and wait until it is running.
    ///
    /// Fails with [`SdkError::StartFailed`] if provisioning ends in `error`.
    pub async fn run_instance(
        &self,
        options: StartInstanceOptions,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<InstanceInfo> {
        let started = self.start_instance(options).await?;
        let info = self
            .wait_for_status(&started.id, InstanceStatus::Running, poll_interval, timeout)
            .await?;

        if info.status == InstanceStatus::Error {
            return Err(SdkError::StartFailed {
                instance_id: info.id,
                message: info.error.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        Ok(info)
    }
}

/// Decode a gateway response, mapping `{"error": ...}` bodies to [`SdkError`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        return serde_json::from_slice(&bytes).map_err(SdkError::from);
    }

    let message = serde_json::from_slice::<ErrorBody>(&bytes)
        .map(|body| body.error)
        .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());

    if status == StatusCode::NOT_FOUND {
        return Err(SdkError::InstanceNotFound(message));
    }

    Err(SdkError::Server {
        code: status.as_u16(),
        message,
    })
}
