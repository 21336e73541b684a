// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Request gateway handlers.
//!
//! Validates untrusted commands, dispatches them to the [`InstanceRegistry`]
//! and classifies every outcome as success, bad request, not found or
//! internal failure. The HTTP layer in [`crate::server`] only translates
//! these outcomes into status codes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::Error;
use crate::github::{GitHubClient, GitHubRepo, GitHubStats};
use crate::instance::{Instance, InstanceStatus, LaunchConfig};
use crate::registry::InstanceRegistry;

/// Shared state for gateway handlers.
pub struct HandlerState {
    /// The lifecycle registry.
    pub registry: InstanceRegistry,
    /// GitHub read-through client.
    pub github: GitHubClient,
    /// When the server started (for uptime calculation).
    pub start_time: Instant,
    /// Server version string.
    pub version: String,
}

impl HandlerState {
    /// Create a new handler state.
    pub fn new(registry: InstanceRegistry, github: GitHubClient) -> Self {
        Self {
            registry,
            github,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Wrap in an `Arc` for sharing with the HTTP server.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Get the server uptime in milliseconds.
    pub fn uptime_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}

/// Boundary-level outcome of a failed request.
#[derive(Debug)]
pub enum GatewayError {
    /// Missing or invalid input; nothing was mutated.
    BadRequest(String),
    /// The referenced instance does not exist.
    NotFound(String),
    /// An upstream service failed. `message` is shown, `source` is logged.
    Upstream {
        /// Caller-facing summary.
        message: &'static str,
        /// Underlying failure.
        source: Error,
    },
    /// Anything else. The cause is logged, never shown to the caller.
    Internal(Error),
}

impl GatewayError {
    /// Message safe to return to the caller.
    pub fn public_message(&self) -> &str {
        match self {
            GatewayError::BadRequest(message) | GatewayError::NotFound(message) => message,
            GatewayError::Upstream { message, .. } => message,
            GatewayError::Internal(_) => "Internal server error",
        }
    }
}

impl From<Error> for GatewayError {
    fn from(err: Error) -> Self {
        match err {
            Error::InstanceNotFound(_) => GatewayError::NotFound("Container not found".to_string()),
            Error::InvalidRequest(message) => GatewayError::BadRequest(message),
            e if e.is_client_error() => GatewayError::BadRequest(e.to_string()),
            e => GatewayError::Internal(e),
        }
    }
}

/// Handler result type.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

// ============================================================================
// Command envelope
// ============================================================================

/// A validated command from the `{action, ...}` envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start a new instance.
    Start(StartInstanceRequest),
    /// Stop an instance.
    Stop(StopInstanceRequest),
    /// Look up an instance.
    Status {
        /// Instance id to query.
        id: String,
    },
}

impl Command {
    /// Parse and validate a raw envelope.
    ///
    /// The action is checked first, so an unknown action is always reported
    /// as such regardless of which other fields are present.
    pub fn from_envelope(envelope: &Value) -> GatewayResult<Self> {
        let Some(body) = envelope.as_object() else {
            return Err(GatewayError::BadRequest("Invalid JSON body".to_string()));
        };

        match body.get("action").and_then(Value::as_str) {
            Some("start") => {
                let project_id = required_str(body, "projectId", "Project ID is required")?;
                let config = body.get("config").filter(|c| !c.is_null()).ok_or_else(|| {
                    GatewayError::BadRequest(
                        "Docker config is required for start action".to_string(),
                    )
                })?;
                let config: LaunchConfig = serde_json::from_value(config.clone())
                    .map_err(|e| GatewayError::BadRequest(format!("Invalid docker config: {}", e)))?;
                Ok(Command::Start(StartInstanceRequest { project_id, config }))
            }
            Some("stop") => {
                let container_id = required_str(
                    body,
                    "containerId",
                    "Container ID is required for stop action",
                )?;
                Ok(Command::Stop(StopInstanceRequest { container_id }))
            }
            Some("status") => {
                let id = required_str(body, "id", "Container ID is required for status action")?;
                Ok(Command::Status { id })
            }
            _ => Err(GatewayError::BadRequest("Invalid action".to_string())),
        }
    }
}

fn required_str(
    body: &serde_json::Map<String, Value>,
    field: &str,
    message: &str,
) -> GatewayResult<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::BadRequest(message.to_string()))
}

/// Response to a dispatched command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandResponse {
    /// Snapshot returned by `start` and `status`.
    Instance(Instance),
    /// Acknowledgment returned by `stop`.
    Stop(StopInstanceResponse),
}

/// Dispatch a validated command.
pub async fn handle_command(state: &HandlerState, command: Command) -> GatewayResult<CommandResponse> {
    match command {
        Command::Start(request) => handle_start_instance(state, request)
            .await
            .map(CommandResponse::Instance),
        Command::Stop(request) => handle_stop_instance(state, request)
            .await
            .map(CommandResponse::Stop),
        Command::Status { id } => handle_get_instance(state, &id)
            .await
            .map(CommandResponse::Instance),
    }
}

// ============================================================================
// Health Check
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    /// Whether the registry accepts new work.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Server uptime in milliseconds.
    pub uptime_ms: u64,
    /// Runner backing the registry.
    pub runner: &'static str,
    /// Tracked instances per status.
    pub instances: BTreeMap<InstanceStatus, usize>,
}

/// Handle health check request.
pub async fn handle_health_check(state: &HandlerState) -> HealthCheckResponse {
    HealthCheckResponse {
        healthy: !state.registry.is_shut_down(),
        version: state.version.clone(),
        uptime_ms: state.uptime_ms(),
        runner: state.registry.runner_type(),
        instances: state.registry.count_by_status().await,
    }
}

// ============================================================================
// Start Instance
// ============================================================================

/// Request to start a new instance.
#[derive(Debug, Clone, PartialEq)]
pub struct StartInstanceRequest {
    /// Project the instance belongs to.
    pub project_id: String,
    /// Launch parameters.
    pub config: LaunchConfig,
}

/// Handle start instance request.
///
/// Returns the snapshot in `starting` status.
pub async fn handle_start_instance(
    state: &HandlerState,
    request: StartInstanceRequest,
) -> GatewayResult<Instance> {
    info!(
        project_id = %request.project_id,
        image = %request.config.image,
        "Start instance request received"
    );

    let instance = state
        .registry
        .start(&request.project_id, request.config)
        .await?;

    Ok(instance)
}

// ============================================================================
// Stop Instance
// ============================================================================

/// Request to stop an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct StopInstanceRequest {
    /// Instance id to stop.
    pub container_id: String,
}

/// Response from stopping an instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopInstanceResponse {
    /// Whether the instance existed and its stop sequence was started.
    pub success: bool,
}

/// Handle stop instance request.
///
/// An unknown id is a normal negative result, not an error.
pub async fn handle_stop_instance(
    state: &HandlerState,
    request: StopInstanceRequest,
) -> GatewayResult<StopInstanceResponse> {
    info!(container_id = %request.container_id, "Stop instance request received");

    let success = state.registry.stop(&request.container_id).await;
    Ok(StopInstanceResponse { success })
}

// ============================================================================
// Instance Queries
// ============================================================================

/// Handle instance status lookup.
pub async fn handle_get_instance(state: &HandlerState, instance_id: &str) -> GatewayResult<Instance> {
    debug!(instance_id = %instance_id, "Instance status request received");

    state
        .registry
        .get(instance_id)
        .await
        .ok_or_else(|| Error::InstanceNotFound(instance_id.to_string()).into())
}

/// Handle instance listing, optionally filtered by project.
pub async fn handle_list_instances(state: &HandlerState, project_id: Option<&str>) -> Vec<Instance> {
    match project_id {
        Some(project_id) => state.registry.list_by_project(project_id).await,
        None => state.registry.list_all().await,
    }
}

// ============================================================================
// Repository Read-through
// ============================================================================

/// Handle repository listing for the configured GitHub user.
pub async fn handle_list_repos(state: &HandlerState) -> GatewayResult<Vec<GitHubRepo>> {
    state
        .github
        .list_own_repos()
        .await
        .map_err(|source| GatewayError::Upstream {
            message: "Failed to fetch repositories",
            source,
        })
}

/// Handle aggregated repository stats for the configured GitHub user.
pub async fn handle_repo_stats(state: &HandlerState) -> GatewayResult<GitHubStats> {
    let username = state.github.config().username.clone();
    state
        .github
        .stats(&username)
        .await
        .map_err(|source| GatewayError::Upstream {
            message: "Failed to fetch repository stats",
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bad_request_message(envelope: Value) -> String {
        match Command::from_envelope(&envelope) {
            Err(GatewayError::BadRequest(message)) => message,
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_start() {
        let command = Command::from_envelope(&json!({
            "action": "start",
            "projectId": "demo-1",
            "config": {"image": "x", "port": 8000}
        }))
        .unwrap();

        assert_eq!(
            command,
            Command::Start(StartInstanceRequest {
                project_id: "demo-1".to_string(),
                config: LaunchConfig::new("x", 8000),
            })
        );
    }

    #[test]
    fn test_start_requires_project_and_config() {
        assert_eq!(
            bad_request_message(json!({"action": "start", "config": {"image": "x", "port": 1}})),
            "Project ID is required"
        );
        assert_eq!(
            bad_request_message(json!({"action": "start", "projectId": "demo-1"})),
            "Docker config is required for start action"
        );
        assert!(
            bad_request_message(json!({
                "action": "start",
                "projectId": "demo-1",
                "config": {"image": "x", "port": -5}
            }))
            .starts_with("Invalid docker config")
        );
    }

    #[test]
    fn test_stop_and_status_require_ids() {
        assert_eq!(
            bad_request_message(json!({"action": "stop"})),
            "Container ID is required for stop action"
        );
        assert_eq!(
            bad_request_message(json!({"action": "status", "id": ""})),
            "Container ID is required for status action"
        );
        assert_eq!(
            Command::from_envelope(&json!({"action": "stop", "containerId": "c-1"})).unwrap(),
            Command::Stop(StopInstanceRequest {
                container_id: "c-1".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_action_is_distinct() {
        let unknown = bad_request_message(json!({"action": "restart", "projectId": "demo-1"}));
        let missing = bad_request_message(json!({"projectId": "demo-1"}));

        assert_eq!(unknown, "Invalid action");
        assert_eq!(missing, "Invalid action");
        assert_ne!(unknown, "Container ID is required for stop action");
        assert_eq!(bad_request_message(json!([1, 2])), "Invalid JSON body");
    }

    #[test]
    fn test_error_classification_hides_internal_detail() {
        let internal: GatewayError = Error::Other("database password is hunter2".into()).into();
        assert!(matches!(internal, GatewayError::Internal(_)));
        assert_eq!(internal.public_message(), "Internal server error");

        let bad: GatewayError = Error::InvalidRequest("projectId is required".into()).into();
        assert!(matches!(bad, GatewayError::BadRequest(_)));

        let missing: GatewayError = Error::InstanceNotFound("x".into()).into();
        assert_eq!(missing.public_message(), "Container not found");
    }

    #[test]
    fn test_stop_response_shape() {
        let json = serde_json::to_value(CommandResponse::Stop(StopInstanceResponse {
            success: true,
        }))
        .unwrap();
        assert_eq!(json, json!({"success": true}));
    }
}
