// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Showcase Management SDK
//!
//! Typed client for the showcase-environment HTTP gateway.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use showcase_management_sdk::{InstanceStatus, ManagementClient, StartInstanceOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ManagementClient::localhost()?;
//!
//! let health = client.health_check().await?;
//! println!("Server version: {}", health.version);
//!
//! let options = StartInstanceOptions::new("demo-1", "ghcr.io/acme/demo:latest", 8000)
//!     .with_env_var("MODE", "demo");
//! let instance = client.start_instance(options).await?;
//!
//! let running = client
//!     .wait_for_status(
//!         &instance.id,
//!         InstanceStatus::Running,
//!         Duration::from_millis(250),
//!         Duration::from_secs(10),
//!     )
//!     .await?;
//! println!("Demo available at {:?}", running.url);
//!
//! client.stop_instance(&instance.id).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::ManagementClient;
pub use config::SdkConfig;
pub use error::{Result, SdkError};
pub use types::{
    HealthStatus, InstanceInfo, InstanceStatus, StartInstanceOptions, StopInstanceResult,
};
