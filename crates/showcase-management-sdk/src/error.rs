// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for showcase-management-sdk.

use thiserror::Error;

/// Result type using SdkError.
pub type Result<T> = std::result::Result<T, SdkError>;

/// Errors that can occur when using the management SDK.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Configuration error (missing or invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection to showcase-environment failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Request or wait timed out.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// Server returned an error response.
    #[error("server error [{code}]: {message}")]
    Server {
        /// HTTP status code.
        code: u16,
        /// Message from the `error` field of the response.
        message: String,
    },

    /// Unexpected response from server.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Instance not found.
    #[error("instance not found: {0}")]
    InstanceNotFound(String),

    /// Provisioning ended in the `error` status.
    #[error("instance {instance_id} failed to start: {message}")]
    StartFailed {
        /// Instance that failed.
        instance_id: String,
        /// Failure cause reported by the server.
        message: String,
    },

    /// Invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SdkError {
    /// Whether the server rejected the request as malformed (HTTP 400).
    pub fn is_bad_request(&self) -> bool {
        matches!(self, SdkError::Server { code: 400, .. })
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SdkError::Serialization(err.to_string())
        } else {
            SdkError::Connection(err.to_string())
        }
    }
}
