// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for showcase-environment tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use showcase_environment::github::{GitHubClient, GitHubConfig};
use showcase_environment::handlers::HandlerState;
use showcase_environment::registry::{InstanceRegistry, RegistryConfig};
use showcase_environment::runner::{Runner, SimulatedRunner};

pub const START_DELAY: Duration = Duration::from_millis(2000);
pub const STOP_DELAY: Duration = Duration::from_millis(1000);
pub const CLEANUP_DELAY: Duration = Duration::from_millis(5000);

/// Slack added on top of a delay so the background task has run.
pub const SLACK: Duration = Duration::from_millis(100);

/// Registry with default delays backed by `runner`.
pub fn registry_with(runner: Arc<dyn Runner>) -> InstanceRegistry {
    InstanceRegistry::new(runner, RegistryConfig::default())
}

/// Registry with default delays and a default simulated runner.
pub fn default_registry() -> InstanceRegistry {
    registry_with(Arc::new(SimulatedRunner::default()))
}

/// GitHub config pointing at `api_url` (usually a wiremock server).
pub fn github_config(api_url: &str) -> GitHubConfig {
    GitHubConfig {
        username: "octocat".to_string(),
        token: None,
        api_url: api_url.to_string(),
        request_timeout: Duration::from_secs(5),
    }
}

/// Handler state around `registry`, with GitHub pointed at `api_url`.
pub fn state_with(registry: InstanceRegistry, api_url: &str) -> Arc<HandlerState> {
    let github = GitHubClient::new(github_config(api_url)).expect("github client");
    HandlerState::new(registry, github).shared()
}

/// Advance (paused) time by `duration`.
pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Send `request` through `app` and decode the JSON body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}

/// `POST /api/docker` with a raw body.
pub fn post_raw(body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/docker")
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .expect("request")
}

/// `POST /api/docker` with a JSON envelope.
pub fn post_command(envelope: Value) -> Request<Body> {
    post_raw(envelope.to_string())
}

/// Plain `GET`.
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

/// Minimal repository payload as GitHub returns it.
pub fn repo_json(id: u64, name: &str, language: Option<&str>, stars: u64, updated_at: &str) -> Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "full_name": format!("octocat/{}", name),
        "description": null,
        "html_url": format!("https://github.com/octocat/{}", name),
        "clone_url": format!("https://github.com/octocat/{}.git", name),
        "homepage": null,
        "language": language,
        "stargazers_count": stars,
        "forks_count": 1,
        "watchers_count": stars,
        "open_issues_count": 0,
        "created_at": "2023-01-01T00:00:00Z",
        "updated_at": updated_at,
        "pushed_at": updated_at,
        "topics": ["demo"],
        "default_branch": "main"
    })
}
