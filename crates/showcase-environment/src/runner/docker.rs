// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Docker CLI commands for a real backend.
//!
//! The simulated runner only logs these; they document what a docker-backed
//! runner would execute for each lifecycle step.

use crate::instance::LaunchConfig;

/// `docker pull <image>`
pub fn pull_command(image: &str) -> String {
    format!("docker pull {}", image)
}

/// `docker run -d --name <name> -p <port>:<port> [-e K=V ...] <image> [command]`
///
/// Environment flags are emitted in key order so the output is stable.
pub fn run_command(config: &LaunchConfig, name: &str) -> String {
    let mut parts = vec![
        "docker run -d".to_string(),
        format!("--name {}", name),
        format!("-p {}:{}", config.port, config.port),
    ];

    if let Some(env) = &config.env {
        let mut vars: Vec<_> = env.iter().collect();
        vars.sort();
        parts.extend(vars.into_iter().map(|(k, v)| format!("-e {}={}", k, v)));
    }

    parts.push(config.image.clone());

    if let Some(command) = config.command.as_deref().filter(|c| !c.is_empty()) {
        parts.push(command.to_string());
    }

    parts.join(" ")
}

/// `docker stop <name>`
pub fn stop_command(name: &str) -> String {
    format!("docker stop {}", name)
}

/// `docker rm <name>`
pub fn remove_command(name: &str) -> String {
    format!("docker rm {}", name)
}

/// `docker logs <name>`
pub fn logs_command(name: &str) -> String {
    format!("docker logs {}", name)
}

/// `docker inspect <name> --format='{{.State.Status}}'`
pub fn status_command(name: &str) -> String {
    format!("docker inspect {} --format='{{{{.State.Status}}}}'", name)
}
