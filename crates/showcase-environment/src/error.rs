// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for showcase-environment.

use thiserror::Error;

/// Environment errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Upstream HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Instance was not found.
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    /// An instance with the requested id is already tracked.
    #[error("Instance already exists: {0}")]
    InstanceAlreadyExists(String),

    /// Request validation failed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The registry has been shut down and accepts no new work.
    #[error("Registry is shutting down")]
    ShuttingDown,

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error was caused by the caller's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidRequest(_) | Error::InstanceAlreadyExists(_)
        )
    }
}

/// Result type using Environment Error.
pub type Result<T> = std::result::Result<T, Error>;
