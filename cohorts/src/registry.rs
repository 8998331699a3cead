use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::{AcquireError, Semaphore, mpsc, oneshot};
use tokio::time::Duration;

use crate::backup::{BackupError, BackupProvider};
use crate::control_plane::{ControlPlane, ControlPlaneError};
use crate::metrics_defs::{SYNC_DURATION, SYNC_FALLBACK, SYNC_TENANTS};
use crate::types::CohortSnapshot;
use selector::{CohortDirectory, DirectoryError, WILDCARD_GROUP};
use shared::{counter, histogram};

/// Forced-interface list entry meaning "every interface".
const FORCED_ALL: &str = "all";

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("backup provider error: {0}")]
    Backup(#[from] BackupError),
    #[error("another sync is in progress")]
    ConcurrentSync(#[from] AcquireError),
    #[error("control plane error: {0}")]
    ControlPlane(#[from] ControlPlaneError),
}

#[derive(Debug)]
pub enum Command {
    // Trigger a sync outside of the normal interval. The worker sends the
    // attempt's outcome when it finishes.
    Refresh(oneshot::Sender<Result<(), SyncError>>),
    // Trigger the worker to shut down gracefully
    Shutdown,
}

struct RegistryInner {
    control_plane: ControlPlane,
    data: RwLock<CohortSnapshot>,
    update_lock: Semaphore,
    // Used by the readiness probe and the lookup gate. Initially false and
    // set to true once any snapshot has been loaded.
    ready: AtomicBool,
    backup: Arc<dyn BackupProvider>,
    local_ip: String,
}

/// Synchronizes cohort assignment tables from the control plane and answers
/// the selector's membership lookups against them.
#[derive(Clone)]
pub struct CohortRegistry {
    inner: Arc<RegistryInner>,
}

impl CohortRegistry {
    /// `local_ip` overrides address discovery; pass `None` outside tests.
    pub fn new(
        control_plane_url: String,
        backup: Arc<dyn BackupProvider>,
        local_ip: Option<String>,
    ) -> Self {
        let local_ip = local_ip
            .or_else(shared::net::local_ip)
            .unwrap_or_else(|| {
                tracing::warn!("could not discover a local IP, machine cohort checks will not match");
                String::new()
            });

        CohortRegistry {
            inner: Arc::new(RegistryInner {
                control_plane: ControlPlane::new(control_plane_url),
                data: RwLock::new(CohortSnapshot::default()),
                update_lock: Semaphore::new(1),
                ready: AtomicBool::new(false),
                backup,
                local_ip,
            }),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Relaxed)
    }

    /// Performs an initial full load, then reloads at the configured
    /// interval or on demand when the Refresh command is received. Runs
    /// until the Shutdown command is received or the channel closes.
    pub async fn run_sync_worker(
        &self,
        mut rx: mpsc::Receiver<Command>,
        interval: Duration,
    ) -> Result<(), SyncError> {
        self.load_snapshot().await?;
        self.inner.ready.store(true, Ordering::Relaxed);

        let mut ticker = tokio::time::interval(interval);
        // the first tick fires immediately; the initial load above covers it
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.load_snapshot().await {
                        tracing::warn!(error = %err, "periodic cohort sync failed, keeping previous tables");
                    }
                }
                cmd = rx.recv() => match cmd {
                    Some(Command::Refresh(ack)) => {
                        let outcome = self.load_snapshot().await;
                        if let Err(err) = &outcome {
                            tracing::warn!(error = %err, "requested cohort refresh failed");
                        }
                        let _ = ack.send(outcome);
                    }
                    Some(Command::Shutdown) | None => {
                        tracing::info!("cohort sync worker shutting down");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Loads the full snapshot from the control plane, falling back to the
    /// backup provider when it is unreachable. A successful control-plane
    /// load refreshes the backup copy.
    async fn load_snapshot(&self) -> Result<(), SyncError> {
        // Hold permit for the duration of this function
        let _permit = self.inner.update_lock.acquire().await?;

        let started = Instant::now();
        let snapshot = match self.inner.control_plane.load_assignments().await {
            Ok(snapshot) => {
                if let Err(err) = self.inner.backup.store(&snapshot) {
                    tracing::warn!(error = %err, "could not refresh cohort backup copy");
                }
                snapshot
            }
            Err(err) => {
                counter!(SYNC_FALLBACK).increment(1);
                tracing::warn!(
                    error = %err,
                    "control plane unavailable, loading cohort tables from backup"
                );
                self.inner.backup.load()?
            }
        };

        histogram!(SYNC_DURATION).record(started.elapsed().as_secs_f64());
        histogram!(SYNC_TENANTS).record(snapshot.tenants.len() as f64);

        *self.inner.data.write() = snapshot;
        Ok(())
    }

    /// Read guard over the tables, gated on readiness so callers never act
    /// on the empty pre-load snapshot.
    fn read_ready(&self) -> Result<RwLockReadGuard<'_, CohortSnapshot>, DirectoryError> {
        if !self.is_ready() {
            return Err(DirectoryError::NotReady);
        }
        Ok(self.inner.data.read())
    }
}

impl CohortDirectory for CohortRegistry {
    fn is_interface_forced_gray(&self, interface: &str) -> Result<bool, DirectoryError> {
        let data = self.read_ready()?;
        if data.forced_interfaces.is_empty() {
            tracing::debug!("forced-gray interface list is empty");
            return Ok(false);
        }
        Ok(data
            .forced_interfaces
            .iter()
            .any(|entry| entry == FORCED_ALL || entry == interface))
    }

    fn is_tenant_in_cohort(
        &self,
        tenant: &str,
        provider_application: &str,
    ) -> Result<bool, DirectoryError> {
        let data = self.read_ready()?;
        Ok(data.tenants.get(tenant).is_some_and(|assignment| {
            assignment.applications.is_empty()
                || assignment
                    .applications
                    .iter()
                    .any(|app| app == provider_application)
        }))
    }

    fn is_machine_in_cohort(&self, consumer_application: &str) -> Result<bool, DirectoryError> {
        let data = self.read_ready()?;
        Ok(data.machines.iter().any(|machine| {
            machine.ip == self.inner.local_ip && machine.application == consumer_application
        }))
    }

    fn resolve_group(
        &self,
        tenant: Option<&str>,
        consumer_application: &str,
    ) -> Result<String, DirectoryError> {
        let data = self.read_ready()?;
        let group = match tenant {
            Some(tenant) if !tenant.is_empty() => data
                .tenants
                .get(tenant)
                .map(|assignment| assignment.group.clone())
                .unwrap_or_default(),
            _ => data
                .machines
                .iter()
                .find(|machine| {
                    machine.ip == self.inner.local_ip
                        && machine.application == consumer_application
                })
                .map(|machine| machine.group.clone())
                .unwrap_or_default(),
        };

        // A wildcard assignment means "no particular group": unresolved.
        if group == WILDCARD_GROUP {
            return Ok(String::new());
        }
        Ok(group)
    }
}
