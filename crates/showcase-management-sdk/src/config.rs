// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the management SDK.

use std::time::Duration;

use crate::error::{Result, SdkError};

/// Configuration for the ManagementClient.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// Base URL of the showcase-environment gateway.
    pub base_url: String,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(), // Environment server default port
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SdkConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SHOWCASE_ENVIRONMENT_URL`: Gateway base URL (default: "http://127.0.0.1:8080")
    /// - `SHOWCASE_REQUEST_TIMEOUT_MS`: Request timeout in milliseconds (default: 30000)
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("SHOWCASE_ENVIRONMENT_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

        let request_timeout_ms: u64 = std::env::var("SHOWCASE_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse()
            .map_err(|e| SdkError::Config(format!("invalid SHOWCASE_REQUEST_TIMEOUT_MS: {}", e)))?;

        let config = Self {
            base_url,
            request_timeout: Duration::from_millis(request_timeout_ms),
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the gateway base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Check that the base URL is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(SdkError::Config(format!(
                "base URL must start with http:// or https://: {}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Build a full URL for `path` (which starts with `/`).
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SdkConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = SdkConfig::new()
            .with_base_url("https://demo.example.com/")
            .with_request_timeout(Duration::from_secs(5));

        assert_eq!(config.url("/health"), "https://demo.example.com/health");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_relative_url() {
        let err = SdkConfig::new().with_base_url("localhost:8080").validate();
        assert!(matches!(err, Err(SdkError::Config(_))));
    }
}
