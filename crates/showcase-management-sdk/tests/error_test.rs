// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error type tests for showcase-management-sdk.

use showcase_management_sdk::SdkError;

#[test]
fn test_config_error_display() {
    let err = SdkError::Config("missing address".to_string());
    assert!(err.to_string().contains("configuration error"));
    assert!(err.to_string().contains("missing address"));
}

#[test]
fn test_timeout_error_display() {
    let err = SdkError::Timeout(5000);
    assert!(err.to_string().contains("timed out"));
    assert!(err.to_string().contains("5000"));
}

#[test]
fn test_server_error_display() {
    let err = SdkError::Server {
        code: 400,
        message: "Invalid action".to_string(),
    };
    let display = err.to_string();
    assert!(display.contains("server error"));
    assert!(display.contains("400"));
    assert!(display.contains("Invalid action"));
    assert!(err.is_bad_request());
}

#[test]
fn test_start_failed_display() {
    let err = SdkError::StartFailed {
        instance_id: "demo-1-abc".to_string(),
        message: "image not found".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "instance demo-1-abc failed to start: image not found"
    );
    assert!(!err.is_bad_request());
}

#[test]
fn test_instance_not_found_error_display() {
    let err = SdkError::InstanceNotFound("inst-123".to_string());
    assert!(err.to_string().contains("instance not found"));
    assert!(err.to_string().contains("inst-123"));
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SdkError>();
}

#[test]
fn test_from_serde_json_error() {
    let json_err: Result<(), serde_json::Error> = serde_json::from_str::<()>("invalid");

    let sdk_err: SdkError = json_err.unwrap_err().into();
    assert!(matches!(sdk_err, SdkError::Serialization(_)));
}
