// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Simulated runner.
//!
//! Stands in for a real container backend: waits a fixed startup delay,
//! then hands out a random port from the configured range. Nothing is
//! actually executed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::docker;
use super::traits::*;
use crate::config::PortRange;

/// Configuration for the simulated runner.
#[derive(Debug, Clone)]
pub struct SimulatedRunnerConfig {
    /// How long provisioning takes.
    pub startup_delay: Duration,
    /// Ports handed out to running instances.
    pub port_range: PortRange,
    /// If set, every provisioning attempt fails with this message.
    pub fail_with: Option<String>,
}

impl Default for SimulatedRunnerConfig {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_millis(2000),
            port_range: PortRange::default(),
            fail_with: None,
        }
    }
}

/// Runner that simulates provisioning with a delay and a random port.
pub struct SimulatedRunner {
    config: SimulatedRunnerConfig,
    instances: Arc<Mutex<HashMap<String, RunnerHandle>>>,
}

impl Default for SimulatedRunner {
    fn default() -> Self {
        Self::new(SimulatedRunnerConfig::default())
    }
}

impl SimulatedRunner {
    /// Create a new simulated runner.
    pub fn new(config: SimulatedRunnerConfig) -> Self {
        Self {
            config,
            instances: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a simulated runner whose provisioning always fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(SimulatedRunnerConfig {
            fail_with: Some(message.into()),
            ..SimulatedRunnerConfig::default()
        })
    }

    /// Get the runner configuration.
    pub fn config(&self) -> &SimulatedRunnerConfig {
        &self.config
    }

    /// Number of instances currently provisioned.
    pub async fn active_count(&self) -> usize {
        self.instances.lock().await.len()
    }

    fn pick_port(&self) -> u16 {
        let range = self.config.port_range;
        rand::thread_rng().gen_range(range.start..=range.end)
    }
}

#[async_trait]
impl Runner for SimulatedRunner {
    fn runner_type(&self) -> &'static str {
        "simulated"
    }

    async fn provision(&self, options: &LaunchOptions) -> Result<RunnerHandle> {
        let name = options.container_name();
        debug!(
            instance_id = %options.instance_id,
            pull = %docker::pull_command(&options.config.image),
            run = %docker::run_command(&options.config, &name),
            "Simulating container launch"
        );

        if !self.config.startup_delay.is_zero() {
            tokio::time::sleep(self.config.startup_delay).await;
        }

        if let Some(message) = &self.config.fail_with {
            return Err(RunnerError::StartFailed(message.clone()));
        }

        let handle = RunnerHandle {
            handle_id: name,
            instance_id: options.instance_id.clone(),
            port: self.pick_port(),
            started_at: Utc::now(),
        };

        self.instances
            .lock()
            .await
            .insert(options.instance_id.clone(), handle.clone());

        info!(
            instance_id = %handle.instance_id,
            port = handle.port,
            logs = %docker::logs_command(&handle.handle_id),
            "Simulated container running"
        );

        Ok(handle)
    }

    async fn is_running(&self, handle: &RunnerHandle) -> bool {
        debug!(
            instance_id = %handle.instance_id,
            inspect = %docker::status_command(&handle.handle_id),
            "Checking simulated container"
        );
        self.instances
            .lock()
            .await
            .contains_key(&handle.instance_id)
    }

    async fn stop(&self, handle: &RunnerHandle) -> Result<()> {
        debug!(
            instance_id = %handle.instance_id,
            stop = %docker::stop_command(&handle.handle_id),
            remove = %docker::remove_command(&handle.handle_id),
            "Simulating container stop"
        );
        self.instances.lock().await.remove(&handle.instance_id);
        Ok(())
    }
}
