//! The task store.
//!
//! [`TaskStore`] exclusively owns the task collection. Callers hold the store
//! and mutate it through a closed set of operations; every operation that
//! changes the collection hands a snapshot to the [`PersistenceScheduler`]
//! (when one is attached). Readers get slices or filtered references.
//!
//! Key rules:
//!
//! - **Newest first**: locally created tasks are prepended; a parsed batch is
//!   prepended as a block, keeping its own order.
//! - **Only completion mutates**: after creation, [`toggle`](TaskStore::toggle)
//!   is the only edit.
//! - **All or nothing import**: a sync code either replaces the whole
//!   collection or leaves it untouched.
//! - **Unique IDs**: duplicate IDs arriving through a replace are re-issued.

use std::collections::HashSet;

use serde_json::Value;
use tally_core::{
    AssigneeFilter, Clock, IdGenerator, ParsedTask, ParticipantSet, Priority, Task, normalize,
};
use tracing::{debug, info, warn};

use crate::codec;
use crate::errors::StoreError;
use crate::scheduler::PersistenceScheduler;
use crate::storage::StorageBackend;

/// Completion totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskCounts {
    /// Open tasks.
    pub pending: usize,
    /// Completed tasks.
    pub completed: usize,
}

/// The in-memory task collection and its operations.
#[derive(Debug)]
pub struct TaskStore {
    tasks: Vec<Task>,
    participants: ParticipantSet,
    ids: IdGenerator,
    persistence: Option<PersistenceScheduler>,
}

impl TaskStore {
    /// Empty store without persistence.
    pub fn new(participants: ParticipantSet, ids: IdGenerator) -> Self {
        Self {
            tasks: Vec::new(),
            participants,
            ids,
            persistence: None,
        }
    }

    /// Attach a scheduler; subsequent changes are persisted through it.
    #[must_use]
    pub fn with_persistence(mut self, scheduler: PersistenceScheduler) -> Self {
        self.persistence = Some(scheduler);
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────

    /// Replace the collection with whatever is persisted under `key`.
    ///
    /// Missing data yields an empty collection. Unreadable or corrupt data is
    /// logged and also yields an empty collection; startup never fails here.
    ///
    /// The normalized collection is scheduled for a write, so IDs issued to
    /// legacy or duplicate records stay stable across restarts. Attach the
    /// scheduler with [`with_persistence`](Self::with_persistence) first.
    pub fn load(&mut self, storage: &dyn StorageBackend, key: &str) {
        self.tasks = self.read_persisted(storage, key);
        self.dedupe_ids();
        info!(key, count = self.tasks.len(), "loaded tasks");
        self.changed();
    }

    fn read_persisted(&self, storage: &dyn StorageBackend, key: &str) -> Vec<Task> {
        let raw = match storage.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "no persisted tasks");
                return Vec::new();
            }
            Err(error) => {
                warn!(key, %error, "failed to read persisted tasks, starting empty");
                return Vec::new();
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(error) => {
                warn!(key, %error, "persisted tasks are corrupt, starting empty");
                return Vec::new();
            }
        };

        normalize(&value, &self.ids, self.clock()).unwrap_or_else(|error| {
            warn!(key, %error, "persisted tasks have the wrong shape, starting empty");
            Vec::new()
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    /// All tasks, newest first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Look up a task by ID.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id.as_str() == id)
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether there are no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Configured participants.
    pub fn participants(&self) -> &ParticipantSet {
        &self.participants
    }

    /// Attached scheduler, if any.
    pub fn persistence(&self) -> Option<&PersistenceScheduler> {
        self.persistence.as_ref()
    }

    /// Tasks matching `filter`, in collection order.
    pub fn filter_by_assignee(&self, filter: &AssigneeFilter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Pending and completed totals.
    pub fn counts(&self) -> TaskCounts {
        let completed = self.tasks.iter().filter(|t| t.is_completed).count();
        TaskCounts {
            pending: self.tasks.len() - completed,
            completed,
        }
    }

    /// Sync code for the current collection.
    pub fn export_code(&self) -> String {
        codec::encode(&self.tasks)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Add a task typed in by a participant.
    ///
    /// A blank title is silently ignored (`Ok(None)`). The assignee must be a
    /// configured participant. A blank description is stored as absent.
    pub fn add_manual(
        &mut self,
        title: &str,
        assignee: &str,
        priority: Priority,
        description: Option<&str>,
    ) -> Result<Option<&Task>, StoreError> {
        let title = title.trim();
        if title.is_empty() {
            debug!("ignoring task with blank title");
            return Ok(None);
        }
        if !self.participants.contains(assignee) {
            return Err(StoreError::UnknownAssignee {
                name: assignee.to_string(),
            });
        }

        let task = Task {
            id: self.ids.generate(),
            title: title.to_string(),
            description: description
                .filter(|d| !d.trim().is_empty())
                .map(String::from),
            assignee: assignee.to_string(),
            priority,
            is_completed: false,
            created_at: self.clock().now_ms(),
        };
        debug!(id = %task.id, assignee, "added task");
        self.tasks.insert(0, task);
        self.changed();
        Ok(self.tasks.first())
    }

    /// Prepend tasks produced by the parser, keeping their order.
    ///
    /// Entries with a blank title are dropped. Returns how many were added.
    pub fn add_from_parsed_batch(&mut self, batch: Vec<ParsedTask>) -> usize {
        let now = self.clock().now_ms();
        let fresh: Vec<Task> = batch
            .into_iter()
            .filter(|p| !p.title.trim().is_empty())
            .map(|p| Task::from_parsed(self.ids.generate(), p, now))
            .collect();
        if fresh.is_empty() {
            return 0;
        }

        let added = fresh.len();
        let _ = self.tasks.splice(0..0, fresh);
        debug!(count = added, "added parsed tasks");
        self.changed();
        added
    }

    /// Flip completion of the task with `id`. Returns whether it existed.
    pub fn toggle(&mut self, id: &str) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id.as_str() == id) else {
            return false;
        };
        task.is_completed = !task.is_completed;
        debug!(id, completed = task.is_completed, "toggled task");
        self.changed();
        true
    }

    /// Remove the task with `id`. Returns whether it existed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id.as_str() != id);
        if self.tasks.len() == before {
            return false;
        }
        debug!(id, "deleted task");
        self.changed();
        true
    }

    /// Replace the whole collection with already-normalized tasks.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.dedupe_ids();
        info!(count = self.tasks.len(), "replaced task collection");
        self.changed();
    }

    /// Replace the collection with the contents of a sync code.
    ///
    /// On any decode failure the store is left exactly as it was.
    pub fn import_code(&mut self, code: &str) -> Result<usize, StoreError> {
        let tasks = codec::decode(code, &self.ids, self.clock()).map_err(|error| {
            warn!(%error, "rejected sync code");
            error
        })?;
        let count = tasks.len();
        self.replace_all(tasks);
        Ok(count)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn clock(&self) -> &dyn Clock {
        self.ids.clock().as_ref()
    }

    fn changed(&self) {
        if let Some(ref scheduler) = self.persistence {
            scheduler.schedule(&self.tasks);
        }
    }

    /// Re-issue IDs that appear more than once; the first occurrence keeps it.
    fn dedupe_ids(&mut self) {
        let mut seen = HashSet::with_capacity(self.tasks.len());
        for task in &mut self.tasks {
            if !seen.insert(task.id.clone()) {
                let fresh = self.ids.generate();
                warn!(old = %task.id, new = %fresh, "duplicate task id re-issued");
                task.id = fresh;
                let _ = seen.insert(task.id.clone());
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
