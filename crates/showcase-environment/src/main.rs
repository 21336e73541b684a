// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Showcase Environment - Demo Instance Lifecycle Server
//!
//! An HTTP server responsible for:
//! - Instance lifecycle (start, stop, status) with simulated delays
//! - Instance listings per project
//! - GitHub repository read-through for the projects page

use std::sync::Arc;
use tracing::{info, warn};

use showcase_environment::config::Config;
use showcase_environment::runner::{Runner, SimulatedRunner};
use showcase_environment::runtime::EnvironmentRuntime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "showcase_environment=info,tower_http=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    let config = Config::from_env()?;

    info!(
        http_addr = %config.http_addr,
        port_range = %config.runner.port_range,
        start_delay_ms = config.runner.startup_delay.as_millis() as u64,
        stop_delay_ms = config.registry.stop_delay.as_millis() as u64,
        cleanup_delay_ms = config.registry.cleanup_delay.as_millis() as u64,
        github_user = %config.github.username,
        "Starting Showcase Environment"
    );

    let runner = Arc::new(SimulatedRunner::new(config.runner.clone()));
    info!(runner_type = runner.runner_type(), "Runner initialized");

    let runtime = EnvironmentRuntime::builder()
        .runner(runner)
        .bind_addr(config.http_addr)
        .registry_config(config.registry.clone())
        .github_config(config.github.clone())
        .build()?
        .start()
        .await?;

    info!(addr = %runtime.local_addr(), "Environment server ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    runtime.shutdown().await?;

    info!("Showcase Environment shut down");

    Ok(())
}
