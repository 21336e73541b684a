// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Instance Registry
//!
//! In-memory registry of demo instances and the single owner of their
//! lifecycle. Every status change goes through this type; callers only ever
//! receive cloned [`Instance`] snapshots.
//!
//! Delayed transitions run as tracked background tasks. Each entry carries an
//! epoch that is bumped whenever a new sequence (start or stop) takes over the
//! instance, and a delayed transition is applied only if the entry still has
//! the epoch and status it was scheduled against. A late timer therefore never
//! overwrites or deletes state produced by a newer command.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::instance::{Instance, InstanceStatus, LaunchConfig};
use crate::runner::{LaunchOptions, Runner, RunnerHandle};

/// Registry timing and addressing configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Time between `stopping` and `stopped`.
    pub stop_delay: Duration,
    /// Time an instance stays `stopped` before it is removed.
    pub cleanup_delay: Duration,
    /// Host used when deriving an instance URL from its port.
    pub public_host: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            stop_delay: Duration::from_millis(1000),
            cleanup_delay: Duration::from_millis(5000),
            public_host: "localhost".to_string(),
        }
    }
}

/// Registry entry: the live record plus bookkeeping for pending transitions.
#[derive(Debug)]
struct Entry {
    instance: Instance,
    epoch: u64,
    handle: Option<RunnerHandle>,
}

impl Entry {
    fn is_current(&self, epoch: u64, status: InstanceStatus) -> bool {
        self.epoch == epoch && self.instance.status == status
    }
}

struct RegistryInner {
    instances: RwLock<HashMap<String, Entry>>,
    runner: Arc<dyn Runner>,
    config: RegistryConfig,
    epochs: AtomicU64,
    tasks: TaskTracker,
    cancel: CancellationToken,
}

/// Authoritative store of demo instances.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct InstanceRegistry {
    inner: Arc<RegistryInner>,
}

impl InstanceRegistry {
    /// Create a registry backed by `runner`.
    pub fn new(runner: Arc<dyn Runner>, config: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                instances: RwLock::new(HashMap::new()),
                runner,
                config,
                epochs: AtomicU64::new(1),
                tasks: TaskTracker::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Get the registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Runner type backing this registry.
    pub fn runner_type(&self) -> &'static str {
        self.inner.runner.runner_type()
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Start a new instance for `project_id`.
    ///
    /// Returns the snapshot in `starting` status; the transition to `running`
    /// (or `error`) happens in the background after the runner finishes.
    pub async fn start(&self, project_id: &str, config: LaunchConfig) -> Result<Instance> {
        let instance_id = format!("{}-{}", project_id, uuid::Uuid::new_v4().simple());
        self.start_with_id(instance_id, project_id, config).await
    }

    /// Start a new instance under a caller-chosen id.
    ///
    /// Fails with [`Error::InstanceAlreadyExists`] if the id is tracked.
    pub async fn start_with_id(
        &self,
        instance_id: impl Into<String>,
        project_id: &str,
        config: LaunchConfig,
    ) -> Result<Instance> {
        let instance_id = instance_id.into();

        if self.is_shut_down() {
            return Err(Error::ShuttingDown);
        }
        if project_id.trim().is_empty() {
            return Err(Error::InvalidRequest("projectId is required".to_string()));
        }
        if instance_id.trim().is_empty() {
            return Err(Error::InvalidRequest("instance id must not be empty".to_string()));
        }
        config.validate()?;

        let epoch = self.inner.next_epoch();
        let snapshot = {
            let mut instances = self.inner.instances.write().await;
            if instances.contains_key(&instance_id) {
                return Err(Error::InstanceAlreadyExists(instance_id));
            }
            let instance = Instance::starting(instance_id.clone(), project_id.to_string());
            instances.insert(
                instance_id.clone(),
                Entry {
                    instance: instance.clone(),
                    epoch,
                    handle: None,
                },
            );
            instance
        };

        info!(
            instance_id = %instance_id,
            project_id = %project_id,
            image = %config.image,
            "Instance starting"
        );

        let options = LaunchOptions {
            instance_id,
            project_id: project_id.to_string(),
            config,
        };
        let inner = self.inner.clone();
        self.inner.tasks.spawn(async move {
            inner.complete_start(options, epoch).await;
        });

        Ok(snapshot)
    }

    /// Stop an instance.
    ///
    /// Returns `false` if no instance has that id. Otherwise the instance is
    /// `stopping` by the time this returns, becomes `stopped` after the stop
    /// delay and is removed after the cleanup delay. Calling this again on a
    /// stopping or stopped instance restarts the sequence. An instance in
    /// `error` is discarded immediately.
    pub async fn stop(&self, instance_id: &str) -> bool {
        let epoch = self.inner.next_epoch();
        {
            let mut instances = self.inner.instances.write().await;
            let Some(entry) = instances.get_mut(instance_id) else {
                debug!(instance_id = %instance_id, "Stop requested for unknown instance");
                return false;
            };

            if entry.instance.status.is_terminal() {
                instances.remove(instance_id);
                info!(instance_id = %instance_id, "Discarded failed instance");
                return true;
            }

            let previous = entry.instance.status;
            entry.epoch = epoch;
            entry.instance.mark_teardown(InstanceStatus::Stopping);

            info!(
                instance_id = %instance_id,
                previous_status = %previous,
                "Instance stopping"
            );
        }

        let inner = self.inner.clone();
        let instance_id = instance_id.to_string();
        self.inner.tasks.spawn(async move {
            inner.run_stop_sequence(instance_id, epoch).await;
        });

        true
    }

    /// Get a snapshot of one instance.
    pub async fn get(&self, instance_id: &str) -> Option<Instance> {
        self.inner
            .instances
            .read()
            .await
            .get(instance_id)
            .map(|entry| entry.instance.clone())
    }

    /// All instances belonging to `project_id`, oldest first.
    pub async fn list_by_project(&self, project_id: &str) -> Vec<Instance> {
        let instances = self.inner.instances.read().await;
        let mut matching: Vec<Instance> = instances
            .values()
            .filter(|entry| entry.instance.project_id == project_id)
            .map(|entry| entry.instance.clone())
            .collect();
        sort_snapshots(&mut matching);
        matching
    }

    /// Every tracked instance, oldest first.
    pub async fn list_all(&self) -> Vec<Instance> {
        let instances = self.inner.instances.read().await;
        let mut all: Vec<Instance> = instances
            .values()
            .map(|entry| entry.instance.clone())
            .collect();
        sort_snapshots(&mut all);
        all
    }

    /// Number of tracked instances per status. Every status is present.
    pub async fn count_by_status(&self) -> BTreeMap<InstanceStatus, usize> {
        let mut counts: BTreeMap<InstanceStatus, usize> =
            InstanceStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for entry in self.inner.instances.read().await.values() {
            *counts.entry(entry.instance.status).or_default() += 1;
        }
        counts
    }

    /// Cancel all pending transitions, wait for them and drop every instance.
    ///
    /// Provisioning already in flight is allowed to finish so the runner
    /// never keeps an instance the registry no longer tracks.
    ///
    /// After shutdown, [`start`](Self::start) fails with [`Error::ShuttingDown`].
    pub async fn shutdown(&self) {
        info!("Instance registry shutting down...");

        self.inner.cancel.cancel();
        self.inner.tasks.close();
        self.inner.tasks.wait().await;

        let drained: Vec<Entry> = {
            let mut instances = self.inner.instances.write().await;
            instances.drain().map(|(_, entry)| entry).collect()
        };

        let count = drained.len();
        for handle in drained.into_iter().filter_map(|entry| entry.handle) {
            self.inner.release(&handle).await;
        }

        info!(drained = count, "Instance registry shut down");
    }
}

impl RegistryInner {
    fn next_epoch(&self) -> u64 {
        self.epochs.fetch_add(1, Ordering::Relaxed)
    }

    /// Sleep for `delay`; returns `false` if the registry shut down first.
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    async fn complete_start(&self, options: LaunchOptions, epoch: u64) {
        let result = self.runner.provision(&options).await;
        let instance_id = &options.instance_id;

        // Shutdown drains the map once this task returns; anything the runner
        // created in the meantime is released here.
        if self.cancel.is_cancelled() {
            debug!(instance_id = %instance_id, "Start cancelled by shutdown");
            if let Ok(handle) = result {
                self.release(&handle).await;
            }
            return;
        }

        let superseded = {
            let mut instances = self.instances.write().await;
            match instances.get_mut(instance_id) {
                Some(entry) if entry.is_current(epoch, InstanceStatus::Starting) => {
                    match result {
                        Ok(handle) => {
                            let url = format!("http://{}:{}", self.config.public_host, handle.port);
                            info!(
                                instance_id = %instance_id,
                                port = handle.port,
                                url = %url,
                                "Instance running"
                            );
                            entry.instance.mark_running(handle.port, url);
                            entry.handle = Some(handle);
                        }
                        Err(e) => {
                            warn!(instance_id = %instance_id, error = %e, "Instance failed to start");
                            entry.instance.mark_failed(e.to_string());
                        }
                    }
                    None
                }
                _ => result.ok(),
            }
        };

        // A stop arrived while provisioning; release what the runner created.
        if let Some(handle) = superseded {
            debug!(instance_id = %instance_id, "Start superseded, releasing provisioned instance");
            self.release(&handle).await;
        }
    }

    /// Tear down a provisioned instance unless the runner already lost it.
    async fn release(&self, handle: &RunnerHandle) {
        if !self.runner.is_running(handle).await {
            debug!(instance_id = %handle.instance_id, "Runner instance already gone");
            return;
        }
        if let Err(e) = self.runner.stop(handle).await {
            warn!(instance_id = %handle.instance_id, error = %e, "Runner failed to stop instance");
        }
    }

    async fn run_stop_sequence(&self, instance_id: String, epoch: u64) {
        if !self.pause(self.config.stop_delay).await {
            return;
        }

        let handle = {
            let mut instances = self.instances.write().await;
            match instances.get_mut(&instance_id) {
                Some(entry) if entry.is_current(epoch, InstanceStatus::Stopping) => {
                    entry.instance.mark_teardown(InstanceStatus::Stopped);
                    entry.handle.take()
                }
                _ => {
                    debug!(instance_id = %instance_id, "Stop sequence superseded");
                    return;
                }
            }
        };

        if let Some(handle) = handle {
            self.release(&handle).await;
        }

        info!(instance_id = %instance_id, "Instance stopped");

        if !self.pause(self.config.cleanup_delay).await {
            return;
        }

        let removed = {
            let mut instances = self.instances.write().await;
            match instances.get(&instance_id) {
                Some(entry) if entry.is_current(epoch, InstanceStatus::Stopped) => {
                    instances.remove(&instance_id);
                    true
                }
                _ => false,
            }
        };

        if removed {
            info!(instance_id = %instance_id, "Instance removed from registry");
        } else {
            debug!(instance_id = %instance_id, "Cleanup superseded");
        }
    }
}

fn sort_snapshots(instances: &mut [Instance]) {
    instances.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}
