// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP server for the request gateway.
//!
//! Decodes requests, calls into [`crate::handlers`] and turns
//! [`GatewayError`] into `{"error": ...}` responses with the matching status.

use std::any::Any;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::github::{GitHubRepo, GitHubStats};
use crate::handlers::{self, Command, GatewayError, GatewayResult, HandlerState};
use crate::instance::Instance;

type SharedState = Arc<HandlerState>;

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Upstream { source, message } => {
                error!(error = %source, "{}", message);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::Internal(e) => {
                error!(error = %e, "Error handling request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Build the gateway router with all middleware applied.
pub fn router(state: SharedState) -> Router {
    let routes = Router::new()
        .route("/api/docker", get(instance_status).post(docker_command))
        .route("/api/docker/instances", get(list_instances))
        .route("/api/github/repos", get(github_repos))
        .route("/api/github/stats", get(github_stats))
        .route("/health", get(health))
        .with_state(state);

    with_boundary(routes)
}

/// Wrap a router with the error boundary, request tracing and CORS.
///
/// A panic inside any handler becomes a generic 500 response.
pub fn with_boundary(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    error!(panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

async fn docker_command(State(state): State<SharedState>, body: Bytes) -> Response {
    let envelope: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Rejected malformed request body");
            return GatewayError::BadRequest("Invalid JSON body".to_string()).into_response();
        }
    };

    let result = match Command::from_envelope(&envelope) {
        Ok(command) => handlers::handle_command(&state, command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    id: Option<String>,
}

async fn instance_status(
    State(state): State<SharedState>,
    Query(query): Query<StatusQuery>,
) -> GatewayResult<Json<Instance>> {
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| GatewayError::BadRequest("Container ID is required".to_string()))?;

    handlers::handle_get_instance(&state, &id).await.map(Json)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    project_id: Option<String>,
}

async fn list_instances(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Instance>> {
    let project_id = query.project_id.filter(|p| !p.is_empty());
    Json(handlers::handle_list_instances(&state, project_id.as_deref()).await)
}

async fn github_repos(
    State(state): State<SharedState>,
) -> GatewayResult<Json<Vec<GitHubRepo>>> {
    handlers::handle_list_repos(&state).await.map(Json)
}

async fn github_stats(
    State(state): State<SharedState>,
) -> GatewayResult<Json<GitHubStats>> {
    handlers::handle_repo_stats(&state).await.map(Json)
}

async fn health(State(state): State<SharedState>) -> Json<handlers::HealthCheckResponse> {
    Json(handlers::handle_health_check(&state).await)
}

/// Serve the gateway on `listener` until `shutdown_rx` flips to `true`.
pub async fn run_server_with_shutdown(
    listener: TcpListener,
    state: SharedState,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(addr = %addr, "Gateway server listening");

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(async move {
            while !*shutdown_rx.borrow() {
                if shutdown_rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;

    info!("Gateway server stopped");
    Ok(())
}

