//! Cohort assignment lookup service.
//!
//! Keeps the canary cohort tables (forced interfaces, tenant assignments,
//! canary machines) in memory, synced periodically from a control plane
//! with a local backup copy for cold starts, and answers the selector's
//! membership lookups against them. Also exposes the lookups over HTTP for
//! non-RPC components.

pub mod api;
pub mod backup;
pub mod config;
pub mod control_plane;
pub mod metrics_defs;
pub mod registry;
pub mod testutils;
pub mod types;

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Duration;

use backup::{BackupProvider, FilesystemProvider, NoopProvider};
use config::BackupStoreType;
use registry::{CohortRegistry, Command};

#[derive(thiserror::Error, Debug)]
pub enum CohortsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the registry from config and starts its sync worker.
///
/// Returns the registry plus the command channel for on-demand refreshes
/// and graceful shutdown. Exits the process when the worker cannot complete
/// its initial load from either source.
pub fn start_registry(config: &config::Config) -> (CohortRegistry, mpsc::Sender<Command>) {
    let backup: Arc<dyn BackupProvider> = match &config.backup_store.r#type {
        BackupStoreType::Filesystem { base_dir, filename } => {
            Arc::new(FilesystemProvider::new(base_dir, filename))
        }
        BackupStoreType::Noop => Arc::new(NoopProvider),
    };

    let registry = CohortRegistry::new(config.control_plane.url.clone(), backup, None);
    let interval = Duration::from_secs(config.sync_interval_secs);

    let (tx, rx) = mpsc::channel::<Command>(64);

    // Spawn the sync worker. All table loading happens on this task.
    let worker = registry.clone();
    tokio::spawn(async move {
        if let Err(err) = worker.run_sync_worker(rx, interval).await {
            tracing::error!(error = %err, "cohort sync worker failed to start, exiting");
            std::process::exit(1);
        }
    });

    (registry, tx)
}

/// Runs the lookup API service until the listener fails.
pub async fn run(config: config::Config) -> Result<(), CohortsError> {
    let (registry, _cmd_tx) = start_registry(&config);
    api::serve(&config.listener, registry).await?;
    Ok(())
}
