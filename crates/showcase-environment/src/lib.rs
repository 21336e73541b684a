// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Showcase Environment - Demo Instance Lifecycle Simulation
//!
//! This crate backs the live-demo feature of a portfolio site. Visitors ask
//! for a demo environment of a project; the environment "starts" after a
//! short delay, exposes a URL, and can be stopped again. Nothing is actually
//! executed: the [`runner::SimulatedRunner`] stands in for a container backend.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         External Clients                                │
//! │                 (portfolio UI, showcase-management-sdk)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//!                                    │ HTTP/JSON
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   showcase-environment (This Crate)                     │
//! │                            Port 8080                                    │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐       │
//! │  │ Request Gateway  │─▶│ Instance Registry│─▶│ Simulated Runner │       │
//! │  │ (server/handlers)│  │  (registry)      │  │  (runner)        │       │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────┘       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌──────────────────┐                                                   │
//! │  │  GitHub client   │────────────▶ api.github.com                       │
//! │  └──────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # HTTP Gateway (Port 8080)
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /api/docker` | Command envelope: `start`, `stop` or `status` |
//! | `GET /api/docker?id=<id>` | Instance status, 404 when unknown |
//! | `GET /api/docker/instances[?projectId=<p>]` | List instances |
//! | `GET /api/github/repos` | Repositories of the configured user |
//! | `GET /api/github/stats` | Aggregated repository stats |
//! | `GET /health` | Version, uptime and instance counts |
//!
//! Errors are returned as `{"error": "..."}` with status 400, 404 or 500.
//! Internal failure details are logged, never returned.
//!
//! # Instance Status State Machine
//!
//! ```text
//!                  start
//!   (none) ──────────────────▶ ┌──────────┐  runner fails   ┌───────┐
//!                              │ STARTING │────────────────▶│ ERROR │
//!                              └────┬─────┘                 └───┬───┘
//!                       start delay │   │ stop                  │ stop
//!                                   ▼   │                       ▼
//!                              ┌─────────┐│               (removed)
//!                              │ RUNNING ││
//!                              └────┬────┘│
//!                              stop │     │
//!                                   ▼     ▼
//!                              ┌──────────┐
//!                              │ STOPPING │◀─── stop (restarts sequence)
//!                              └────┬─────┘
//!                        stop delay │
//!                                   ▼
//!                              ┌─────────┐
//!                              │ STOPPED │
//!                              └────┬────┘
//!                     cleanup delay │
//!                                   ▼
//!                               (removed)
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SHOWCASE_HTTP_PORT` | `8080` | HTTP gateway port |
//! | `SHOWCASE_START_DELAY_MS` | `2000` | Simulated provisioning time |
//! | `SHOWCASE_STOP_DELAY_MS` | `1000` | Time from `stopping` to `stopped` |
//! | `SHOWCASE_CLEANUP_DELAY_MS` | `5000` | Time from `stopped` to removal |
//! | `SHOWCASE_PORT_RANGE` | `3000-3999` | Ports handed out to instances |
//! | `SHOWCASE_PUBLIC_HOST` | `localhost` | Host in instance URLs |
//! | `SHOWCASE_GITHUB_TIMEOUT_MS` | `10000` | GitHub request timeout |
//! | `GITHUB_USERNAME` | `amirjimdaniels` | Account for the repository list |
//! | `GITHUB_TOKEN` | - | Optional API token |
//! | `GITHUB_API_URL` | `https://api.github.com` | API base URL |
//!
//! # Modules
//!
//! - [`config`]: Server configuration from environment variables
//! - [`error`]: Error types
//! - [`instance`]: Instance snapshot and launch parameters
//! - [`registry`]: Lifecycle registry and delayed transitions
//! - [`runner`]: Provisioning backends
//! - [`handlers`]: Gateway validation and dispatch
//! - [`server`]: axum HTTP server
//! - [`github`]: GitHub repository read-through
//! - [`runtime`]: Embeddable runtime

#![deny(missing_docs)]

/// Server configuration loaded from environment variables.
pub mod config;

/// Error types for Environment operations.
pub mod error;

/// GitHub repository read-through.
pub mod github;

/// Gateway request handlers.
pub mod handlers;

/// Instance snapshot and launch parameters.
pub mod instance;

/// In-memory instance registry.
pub mod registry;

/// Provisioning backends (simulated) and docker command reference.
pub mod runner;

/// HTTP server for the gateway.
pub mod server;

/// Embeddable runtime for showcase-environment.
pub mod runtime;

pub use config::Config;
pub use error::Error;
pub use instance::{Instance, InstanceStatus, LaunchConfig};
pub use registry::InstanceRegistry;
