// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for showcase-environment.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::github::GitHubConfig;
use crate::registry::RegistryConfig;
use crate::runner::SimulatedRunnerConfig;

/// Inclusive range of ports handed out to running instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    /// First port of the range.
    pub start: u16,
    /// Last port of the range (inclusive).
    pub end: u16,
}

impl PortRange {
    /// Create a new range. Returns `None` if `start > end` or `start == 0`.
    pub fn new(start: u16, end: u16) -> Option<Self> {
        if start == 0 || start > end {
            return None;
        }
        Some(Self { start, end })
    }

    /// Whether `port` falls inside the range.
    pub fn contains(&self, port: u16) -> bool {
        (self.start..=self.end).contains(&port)
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            start: 3000,
            end: 3999,
        }
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for PortRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| ConfigError::InvalidPortRange(s.to_string()))?;
        let start: u16 = start
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPortRange(s.to_string()))?;
        let end: u16 = end
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPortRange(s.to_string()))?;
        PortRange::new(start, end).ok_or_else(|| ConfigError::InvalidPortRange(s.to_string()))
    }
}

/// Environment configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server address for the gateway
    pub http_addr: SocketAddr,
    /// Stop/cleanup delays and the host used to build instance URLs
    pub registry: RegistryConfig,
    /// Startup delay and port range of the simulated runner
    pub runner: SimulatedRunnerConfig,
    /// GitHub read-through settings
    pub github: GitHubConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port: u16 = std::env::var("SHOWCASE_HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let http_addr = SocketAddr::from(([0, 0, 0, 0], port));

        let registry = RegistryConfig {
            stop_delay: duration_ms_var("SHOWCASE_STOP_DELAY_MS", 1000)?,
            cleanup_delay: duration_ms_var("SHOWCASE_CLEANUP_DELAY_MS", 5000)?,
            public_host: std::env::var("SHOWCASE_PUBLIC_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
        };

        let port_range = match std::env::var("SHOWCASE_PORT_RANGE") {
            Ok(value) => value.parse()?,
            Err(_) => PortRange::default(),
        };

        let runner = SimulatedRunnerConfig {
            startup_delay: duration_ms_var("SHOWCASE_START_DELAY_MS", 2000)?,
            port_range,
            fail_with: None,
        };

        let github = GitHubConfig {
            username: std::env::var("GITHUB_USERNAME")
                .unwrap_or_else(|_| "amirjimdaniels".to_string()),
            token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            api_url: std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            request_timeout: duration_ms_var("SHOWCASE_GITHUB_TIMEOUT_MS", 10_000)?,
        };

        Ok(Self {
            http_addr,
            registry,
            runner,
            github,
        })
    }
}

fn duration_ms_var(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidDuration(name)),
        Err(_) => Ok(Duration::from_millis(default_ms)),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The port number is invalid.
    #[error("Invalid port number")]
    InvalidPort,
    /// A delay variable is not a whole number of milliseconds.
    #[error("Invalid duration in {0}: expected milliseconds")]
    InvalidDuration(&'static str),
    /// The port range is malformed or empty.
    #[error("Invalid port range '{0}': expected <start>-<end>")]
    InvalidPortRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_range_parse() {
        let range: PortRange = "3000-3999".parse().unwrap();
        assert_eq!(range, PortRange::default());
        assert!(range.contains(3000));
        assert!(range.contains(3999));
        assert!(!range.contains(4000));

        let spaced: PortRange = " 8000 - 8010 ".parse().unwrap();
        assert_eq!(spaced.start, 8000);
        assert_eq!(spaced.end, 8010);
    }

    #[test]
    fn test_port_range_rejects_garbage() {
        assert!("3000".parse::<PortRange>().is_err());
        assert!("4000-3000".parse::<PortRange>().is_err());
        assert!("0-10".parse::<PortRange>().is_err());
        assert!("a-b".parse::<PortRange>().is_err());
    }

    #[test]
    fn test_port_range_display() {
        assert_eq!(PortRange::default().to_string(), "3000-3999");
    }
}
