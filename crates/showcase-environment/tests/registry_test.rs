// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Lifecycle tests for the instance registry (paused tokio time).

mod common;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use common::*;
use showcase_environment::config::PortRange;
use showcase_environment::error::Error;
use showcase_environment::instance::{InstanceStatus, LaunchConfig};
use showcase_environment::registry::{InstanceRegistry, RegistryConfig};
use showcase_environment::runner::{
    LaunchOptions, Runner, RunnerError, RunnerHandle, SimulatedRunner, SimulatedRunnerConfig,
};

fn demo_config() -> LaunchConfig {
    LaunchConfig::new("x", 8000)
}

/// Runner that records a launch as soon as provisioning begins and only
/// becomes ready once `open` is called.
#[derive(Default)]
struct GatedRunner {
    gate: Notify,
    launched: Mutex<HashSet<String>>,
    stops: AtomicUsize,
}

impl GatedRunner {
    fn open(&self) {
        self.gate.notify_one();
    }

    fn launched(&self) -> usize {
        self.launched.lock().unwrap().len()
    }

    fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Drop an instance behind the registry's back.
    fn forget(&self, instance_id: &str) {
        self.launched.lock().unwrap().remove(instance_id);
    }
}

#[async_trait]
impl Runner for GatedRunner {
    fn runner_type(&self) -> &'static str {
        "gated"
    }

    async fn provision(&self, options: &LaunchOptions) -> Result<RunnerHandle, RunnerError> {
        self.launched
            .lock()
            .unwrap()
            .insert(options.instance_id.clone());
        self.gate.notified().await;
        Ok(RunnerHandle {
            handle_id: options.container_name(),
            instance_id: options.instance_id.clone(),
            port: 3000,
            started_at: chrono::Utc::now(),
        })
    }

    async fn is_running(&self, handle: &RunnerHandle) -> bool {
        self.launched.lock().unwrap().contains(&handle.instance_id)
    }

    async fn stop(&self, handle: &RunnerHandle) -> Result<(), RunnerError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.forget(&handle.instance_id);
        Ok(())
    }
}

/// Yield until the spawned provisioning task has reached the runner.
async fn wait_for_launch(runner: &GatedRunner, expected: usize) {
    for _ in 0..100 {
        if runner.launched() == expected {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("provisioning never started");
}

// ============================================================================
// Start
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_becomes_running_after_delay() {
    let registry = default_registry();

    let instance = registry.start("demo-1", demo_config()).await.unwrap();
    assert_eq!(instance.status, InstanceStatus::Starting);
    assert_eq!(instance.project_id, "demo-1");
    assert!(instance.port.is_none());

    advance(START_DELAY - SLACK).await;
    assert_eq!(
        registry.get(&instance.id).await.unwrap().status,
        InstanceStatus::Starting
    );

    advance(SLACK * 2).await;
    let running = registry.get(&instance.id).await.unwrap();
    assert_eq!(running.status, InstanceStatus::Running);
    let port = running.port.expect("running instance has a port");
    assert!(PortRange::default().contains(port));
    assert_eq!(running.url, Some(format!("http://localhost:{}", port)));
    assert_eq!(running.created_at, instance.created_at);

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_url_uses_configured_public_host() {
    let registry = InstanceRegistry::new(
        Arc::new(SimulatedRunner::new(SimulatedRunnerConfig {
            startup_delay: Duration::from_millis(10),
            port_range: PortRange::new(3500, 3500).unwrap(),
            fail_with: None,
        })),
        RegistryConfig {
            public_host: "demo.example.com".to_string(),
            ..RegistryConfig::default()
        },
    );

    let instance = registry.start("demo-1", demo_config()).await.unwrap();
    advance(Duration::from_millis(50)).await;

    let running = registry.get(&instance.id).await.unwrap();
    assert_eq!(running.url.as_deref(), Some("http://demo.example.com:3500"));

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_provisioning_records_error() {
    let registry = registry_with(Arc::new(SimulatedRunner::failing("image not found")));

    let instance = registry.start("demo-1", demo_config()).await.unwrap();
    advance(START_DELAY + SLACK).await;

    let failed = registry.get(&instance.id).await.unwrap();
    assert_eq!(failed.status, InstanceStatus::Error);
    assert!(failed.error.as_deref().unwrap().contains("image not found"));
    assert!(failed.port.is_none());
    assert!(failed.url.is_none());

    // error is terminal: it stays until stopped
    advance(Duration::from_secs(60)).await;
    assert_eq!(
        registry.get(&instance.id).await.unwrap().status,
        InstanceStatus::Error
    );

    assert!(registry.stop(&instance.id).await);
    assert!(registry.get(&instance.id).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_starts_get_distinct_ids() {
    let registry = default_registry();

    let mut tasks = Vec::new();
    for _ in 0..32 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            registry.start("demo-1", demo_config()).await.unwrap().id
        }));
    }

    let mut ids = HashSet::new();
    for task in tasks {
        assert!(ids.insert(task.await.unwrap()));
    }
    assert_eq!(registry.list_by_project("demo-1").await.len(), 32);

    registry.shutdown().await;
}

// ============================================================================
// Stop
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stop_sequence_removes_instance() {
    let registry = default_registry();
    let instance = registry.start("demo-1", demo_config()).await.unwrap();
    advance(START_DELAY + SLACK).await;

    assert!(registry.stop(&instance.id).await);
    let stopping = registry.get(&instance.id).await.unwrap();
    assert_eq!(stopping.status, InstanceStatus::Stopping);
    assert!(stopping.port.is_none());
    assert!(stopping.url.is_none());

    advance(STOP_DELAY + SLACK).await;
    assert_eq!(
        registry.get(&instance.id).await.unwrap().status,
        InstanceStatus::Stopped
    );

    advance(CLEANUP_DELAY).await;
    assert!(registry.get(&instance.id).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stop_unknown_returns_false() {
    let registry = default_registry();
    registry.start("demo-1", demo_config()).await.unwrap();

    assert!(!registry.stop("nonexistent").await);
    assert_eq!(registry.list_all().await.len(), 1);

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_starting_supersedes_start() {
    let runner = Arc::new(SimulatedRunner::default());
    let registry = registry_with(runner.clone());

    let instance = registry.start("demo-1", demo_config()).await.unwrap();
    advance(Duration::from_millis(500)).await;
    assert!(registry.stop(&instance.id).await);

    // the stop delay elapses before provisioning finishes
    advance(Duration::from_millis(1000) + SLACK).await;
    assert_eq!(
        registry.get(&instance.id).await.unwrap().status,
        InstanceStatus::Stopped
    );

    // provisioning completes, but must not resurrect the instance
    advance(Duration::from_millis(1000)).await;
    let after = registry.get(&instance.id).await.unwrap();
    assert_eq!(after.status, InstanceStatus::Stopped);
    assert!(after.port.is_none());
    assert_eq!(runner.active_count().await, 0);

    advance(CLEANUP_DELAY).await;
    assert!(registry.get(&instance.id).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stop_tears_down_runner_instance() {
    let runner = Arc::new(GatedRunner::default());
    let registry = registry_with(runner.clone());

    let instance = registry.start("demo-1", demo_config()).await.unwrap();
    wait_for_launch(&runner, 1).await;
    runner.open();
    advance(SLACK).await;
    assert_eq!(
        registry.get(&instance.id).await.unwrap().status,
        InstanceStatus::Running
    );

    assert!(registry.stop(&instance.id).await);
    advance(STOP_DELAY + SLACK).await;

    assert_eq!(runner.stops(), 1);
    assert_eq!(runner.launched(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_skips_teardown_of_vanished_runner_instance() {
    let runner = Arc::new(GatedRunner::default());
    let registry = registry_with(runner.clone());

    let instance = registry.start("demo-1", demo_config()).await.unwrap();
    wait_for_launch(&runner, 1).await;
    runner.open();
    advance(SLACK).await;

    runner.forget(&instance.id);
    assert!(registry.stop(&instance.id).await);
    advance(STOP_DELAY + SLACK).await;

    assert_eq!(
        registry.get(&instance.id).await.unwrap().status,
        InstanceStatus::Stopped
    );
    assert_eq!(runner.stops(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_stop_restarts_sequence() {
    let registry = default_registry();
    let instance = registry.start("demo-1", demo_config()).await.unwrap();
    advance(START_DELAY + SLACK).await;

    assert!(registry.stop(&instance.id).await);
    advance(Duration::from_millis(800)).await;
    assert!(registry.stop(&instance.id).await);

    // the first sequence's timer has fired, but it is stale
    advance(Duration::from_millis(400)).await;
    assert_eq!(
        registry.get(&instance.id).await.unwrap().status,
        InstanceStatus::Stopping
    );

    advance(Duration::from_millis(600) + SLACK).await;
    assert_eq!(
        registry.get(&instance.id).await.unwrap().status,
        InstanceStatus::Stopped
    );
}

#[tokio::test(start_paused = true)]
async fn test_stale_cleanup_does_not_remove_restopped_instance() {
    let registry = default_registry();
    let instance = registry.start("demo-1", demo_config()).await.unwrap();
    advance(START_DELAY + SLACK).await;

    // t=0: stop, stopped at t=1000, first cleanup due at t=6000
    assert!(registry.stop(&instance.id).await);
    advance(STOP_DELAY + SLACK).await;
    assert_eq!(
        registry.get(&instance.id).await.unwrap().status,
        InstanceStatus::Stopped
    );

    // t=2000: stop again, stopped at t=3000, removal due at t=8000
    advance(Duration::from_millis(900)).await;
    assert!(registry.stop(&instance.id).await);

    advance(Duration::from_millis(4500)).await;
    assert_eq!(
        registry.get(&instance.id).await.unwrap().status,
        InstanceStatus::Stopped
    );

    advance(Duration::from_millis(1500) + SLACK).await;
    assert!(registry.get(&instance.id).await.is_none());
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_list_by_project_filters_and_orders() {
    let registry = default_registry();

    let first = registry.start("demo-1", demo_config()).await.unwrap();
    advance(Duration::from_millis(10)).await;
    let other = registry.start("demo-2", demo_config()).await.unwrap();
    advance(Duration::from_millis(10)).await;
    let second = registry.start("demo-1", demo_config()).await.unwrap();

    let listed: Vec<String> = registry
        .list_by_project("demo-1")
        .await
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(listed, vec![first.id.clone(), second.id.clone()]);
    assert!(registry.list_by_project("demo-3").await.is_empty());

    let all = registry.list_all().await;
    assert_eq!(all.len(), 3);
    assert!(all.iter().any(|i| i.id == other.id));

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_listing_is_independent_of_insertion_order() {
    let orders: [&[&str]; 4] = [
        &["demo-1", "demo-2", "demo-1", "demo-2", "demo-1"],
        &["demo-2", "demo-2", "demo-1", "demo-1", "demo-1"],
        &["demo-1", "demo-1", "demo-1", "demo-2", "demo-2"],
        &["demo-2", "demo-1", "demo-2", "demo-1", "demo-1"],
    ];

    for order in orders {
        let registry = default_registry();
        let mut started = Vec::new();
        for project in order {
            let instance = registry.start(project, demo_config()).await.unwrap();
            started.push(instance);
        }

        for project in ["demo-1", "demo-2"] {
            let listed = registry.list_by_project(project).await;
            assert!(listed.iter().all(|i| i.project_id == project));

            let listed_ids: HashSet<&str> = listed.iter().map(|i| i.id.as_str()).collect();
            let expected: HashSet<&str> = started
                .iter()
                .filter(|i| i.project_id == project)
                .map(|i| i.id.as_str())
                .collect();
            assert_eq!(listed_ids, expected, "order {:?}", order);

            assert!(
                listed
                    .windows(2)
                    .all(|w| (w[0].created_at, &w[0].id) <= (w[1].created_at, &w[1].id)),
                "order {:?}",
                order
            );
        }
        assert_eq!(registry.list_all().await.len(), order.len());

        registry.shutdown().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_count_by_status_tracks_transitions() {
    let registry = default_registry();
    let a = registry.start("demo-1", demo_config()).await.unwrap();
    registry.start("demo-1", demo_config()).await.unwrap();
    advance(START_DELAY + SLACK).await;

    registry.stop(&a.id).await;

    let counts = registry.count_by_status().await;
    assert_eq!(counts[&InstanceStatus::Running], 1);
    assert_eq!(counts[&InstanceStatus::Stopping], 1);
    assert_eq!(counts[&InstanceStatus::Starting], 0);

    registry.shutdown().await;
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_drains_and_rejects_new_work() {
    let runner = Arc::new(SimulatedRunner::default());
    let registry = registry_with(runner.clone());

    let running = registry.start("demo-1", demo_config()).await.unwrap();
    advance(START_DELAY + SLACK).await;
    registry.start("demo-1", demo_config()).await.unwrap();
    registry.stop(&running.id).await;

    registry.shutdown().await;

    assert!(registry.is_shut_down());
    assert!(registry.list_all().await.is_empty());
    assert_eq!(runner.active_count().await, 0);

    let err = registry.start("demo-1", demo_config()).await.unwrap_err();
    assert!(matches!(err, Error::ShuttingDown));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_releases_instance_provisioned_during_drain() {
    let runner = Arc::new(GatedRunner::default());
    let registry = registry_with(runner.clone());

    registry.start("demo-1", demo_config()).await.unwrap();
    wait_for_launch(&runner, 1).await;

    // provisioning becomes ready in the same instant shutdown begins
    runner.open();
    registry.shutdown().await;

    assert!(registry.list_all().await.is_empty());
    assert_eq!(runner.launched(), 0);
    assert_eq!(runner.stops(), 1);
}
