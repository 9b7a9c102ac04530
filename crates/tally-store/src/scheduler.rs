//! Debounced persistence of the task collection.
//!
//! Every change hands the scheduler an owned snapshot. A background worker
//! waits for a quiet period ([`SchedulerConfig::quiescence`]) after the most
//! recent snapshot and writes only that one, so a burst of edits costs a
//! single write. Each new snapshot restarts the wait.
//!
//! # Status
//!
//! ```text
//! Idle ──write starts──▶ Saving ──ok──▶ Saved
//!                           │
//!                           └──storage error──▶ Error (until the next change)
//! ```
//!
//! `Saving` stays visible for at least [`SchedulerConfig::min_saving_visible`].
//! Failed writes are not retried; the next change triggers a fresh attempt.
//!
//! When every scheduler handle is dropped, a pending snapshot is written
//! immediately and the worker exits.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tally_core::Task;
use tally_settings::PersistenceSettings;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::errors::StorageError;
use crate::storage::StorageBackend;

/// Save indicator state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    /// Nothing written yet.
    #[default]
    Idle,
    /// A write is in progress.
    Saving,
    /// The latest write succeeded.
    Saved,
    /// The latest write failed.
    Error,
}

/// Debounce timings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Quiet period after the last change before writing.
    pub quiescence: Duration,
    /// Minimum time `Saving` is shown before `Saved`.
    pub min_saving_visible: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&PersistenceSettings::default())
    }
}

impl From<&PersistenceSettings> for SchedulerConfig {
    fn from(settings: &PersistenceSettings) -> Self {
        Self {
            quiescence: Duration::from_millis(settings.quiescence_ms),
            min_saving_visible: Duration::from_millis(settings.min_saving_visible_ms),
        }
    }
}

/// Handle to the background persistence worker.
#[derive(Clone, Debug)]
pub struct PersistenceScheduler {
    snapshots: mpsc::UnboundedSender<Vec<Task>>,
    status: watch::Receiver<SaveStatus>,
    transitions: broadcast::Sender<SaveStatus>,
}

impl PersistenceScheduler {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// The returned [`JoinHandle`] completes once every handle is dropped
    /// and any pending snapshot has been written.
    pub fn spawn(
        storage: Arc<dyn StorageBackend>,
        key: impl Into<String>,
        config: SchedulerConfig,
    ) -> (Self, JoinHandle<()>) {
        let (snapshots, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SaveStatus::Idle);
        let (transitions, _) = broadcast::channel(32);

        let worker = Worker {
            storage,
            key: key.into(),
            config,
            status: status_tx,
            transitions: transitions.clone(),
        };
        let handle = tokio::spawn(worker.run(rx));

        (
            Self {
                snapshots,
                status,
                transitions,
            },
            handle,
        )
    }

    /// Queue `tasks` for a debounced write.
    pub fn schedule(&self, tasks: &[Task]) {
        if self.snapshots.send(tasks.to_vec()).is_err() {
            warn!(count = tasks.len(), "persistence worker has stopped, change not saved");
        }
    }

    /// Current save status.
    pub fn status(&self) -> SaveStatus {
        *self.status.borrow()
    }

    /// Receiver that always holds the latest status.
    pub fn watch(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Every status transition from now on, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<SaveStatus> {
        self.transitions.subscribe()
    }
}

struct Worker {
    storage: Arc<dyn StorageBackend>,
    key: String,
    config: SchedulerConfig,
    status: watch::Sender<SaveStatus>,
    transitions: broadcast::Sender<SaveStatus>,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Vec<Task>>) {
        while let Some(mut pending) = rx.recv().await {
            loop {
                tokio::select! {
                    next = rx.recv() => match next {
                        Some(snapshot) => pending = snapshot,
                        None => break,
                    },
                    () = sleep(self.config.quiescence) => break,
                }
            }
            self.write(&pending).await;
        }
        debug!(key = %self.key, "persistence worker stopped");
    }

    async fn write(&self, tasks: &[Task]) {
        self.publish(SaveStatus::Saving);
        let started = Instant::now();

        let result = match serde_json::to_string(tasks) {
            Ok(json) => {
                let storage = Arc::clone(&self.storage);
                let key = self.key.clone();
                tokio::task::spawn_blocking(move || storage.write(&key, &json))
                    .await
                    .unwrap_or_else(|e| Err(StorageError::Unavailable(e.to_string())))
            }
            Err(e) => Err(StorageError::from(e)),
        };

        match result {
            Ok(()) => {
                let shown = started.elapsed();
                if shown < self.config.min_saving_visible {
                    sleep(self.config.min_saving_visible - shown).await;
                }
                debug!(key = %self.key, count = tasks.len(), "saved tasks");
                self.publish(SaveStatus::Saved);
            }
            Err(error) => {
                warn!(key = %self.key, %error, "failed to save tasks");
                self.publish(SaveStatus::Error);
            }
        }
    }

    fn publish(&self, status: SaveStatus) {
        let _ = self.status.send_replace(status);
        let _ = self.transitions.send(status);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
