// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Embeddable runtime for showcase-environment.
//!
//! This module provides [`EnvironmentRuntime`] which allows embedding the
//! gateway and registry into an existing tokio application instead of running
//! it as a standalone server.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use showcase_environment::runtime::EnvironmentRuntime;
//! use showcase_environment::runner::SimulatedRunner;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = EnvironmentRuntime::builder()
//!         .runner(Arc::new(SimulatedRunner::default()))
//!         .bind_addr("127.0.0.1:8080".parse()?)
//!         .build()?
//!         .start()
//!         .await?;
//!
//!     // ... run your application ...
//!
//!     runtime.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::github::{GitHubClient, GitHubConfig};
use crate::handlers::HandlerState;
use crate::registry::{InstanceRegistry, RegistryConfig};
use crate::runner::{Runner, SimulatedRunner};
use crate::server::run_server_with_shutdown;

/// Builder for creating an [`EnvironmentRuntime`].
pub struct EnvironmentRuntimeBuilder {
    runner: Option<Arc<dyn Runner>>,
    bind_addr: SocketAddr,
    registry_config: RegistryConfig,
    github_config: GitHubConfig,
}

impl Default for EnvironmentRuntimeBuilder {
    fn default() -> Self {
        Self {
            runner: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            registry_config: RegistryConfig::default(),
            github_config: GitHubConfig::default(),
        }
    }
}

impl EnvironmentRuntimeBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the runner that provisions instances.
    ///
    /// Default: [`SimulatedRunner`] with default settings.
    pub fn runner(mut self, runner: Arc<dyn Runner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Set the bind address for the HTTP gateway.
    ///
    /// Use port `0` to let the OS pick one; see [`EnvironmentRuntime::local_addr`].
    ///
    /// Default: `0.0.0.0:8080`
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set stop/cleanup delays and the public host.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Set the GitHub read-through configuration.
    pub fn github_config(mut self, config: GitHubConfig) -> Self {
        self.github_config = config;
        self
    }

    /// Build the runtime configuration.
    pub fn build(self) -> Result<EnvironmentRuntimeConfig> {
        let runner = self
            .runner
            .unwrap_or_else(|| Arc::new(SimulatedRunner::default()));
        let github = GitHubClient::new(self.github_config)?;

        Ok(EnvironmentRuntimeConfig {
            runner,
            github,
            bind_addr: self.bind_addr,
            registry_config: self.registry_config,
        })
    }
}

/// Configuration for an [`EnvironmentRuntime`].
pub struct EnvironmentRuntimeConfig {
    runner: Arc<dyn Runner>,
    github: GitHubClient,
    bind_addr: SocketAddr,
    registry_config: RegistryConfig,
}

impl EnvironmentRuntimeConfig {
    /// Bind the listener and spawn the HTTP gateway.
    pub async fn start(self) -> Result<EnvironmentRuntime> {
        let registry = InstanceRegistry::new(self.runner, self.registry_config);
        let state = HandlerState::new(registry, self.github).shared();

        let listener = TcpListener::bind(self.bind_addr).await?;
        let local_addr = listener.local_addr()?;

        let (server_shutdown_tx, server_shutdown_rx) = watch::channel(false);
        let server_handle = tokio::spawn(run_server_with_shutdown(
            listener,
            state.clone(),
            server_shutdown_rx,
        ));

        info!(
            bind_addr = %local_addr,
            runner = state.registry.runner_type(),
            "EnvironmentRuntime started"
        );

        Ok(EnvironmentRuntime {
            server_handle,
            server_shutdown_tx,
            state,
            local_addr,
        })
    }
}

/// A running showcase environment that can be embedded in an application.
///
/// Owns the HTTP gateway task and the registry behind it. Call
/// [`shutdown`](Self::shutdown) for graceful termination.
pub struct EnvironmentRuntime {
    server_handle: JoinHandle<crate::error::Result<()>>,
    server_shutdown_tx: watch::Sender<bool>,
    state: Arc<HandlerState>,
    local_addr: SocketAddr,
}

impl EnvironmentRuntime {
    /// Create a new builder for configuring the runtime.
    pub fn builder() -> EnvironmentRuntimeBuilder {
        EnvironmentRuntimeBuilder::new()
    }

    /// Address the gateway is actually listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get a reference to the shared handler state.
    pub fn state(&self) -> &Arc<HandlerState> {
        &self.state
    }

    /// Get the instance registry.
    pub fn registry(&self) -> &InstanceRegistry {
        &self.state.registry
    }

    /// Gracefully shut down the runtime.
    ///
    /// Stops accepting requests, waits for in-flight ones, then drains the
    /// registry.
    pub async fn shutdown(self) -> Result<()> {
        info!("EnvironmentRuntime shutting down...");

        let _ = self.server_shutdown_tx.send(true);

        let server_result = match self.server_handle.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("EnvironmentRuntime server error during shutdown: {}", e);
                Err(e.into())
            }
            Err(e) => {
                error!("EnvironmentRuntime server task panicked: {}", e);
                Err(anyhow::anyhow!("server task panicked: {}", e))
            }
        };

        self.state.registry.shutdown().await;

        if server_result.is_ok() {
            info!("EnvironmentRuntime shutdown complete");
        }
        server_result
    }
}
