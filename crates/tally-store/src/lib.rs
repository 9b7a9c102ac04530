//! # tally-store
//!
//! The local task store and everything that keeps it durable and portable:
//!
//! - [`TaskStore`]: the owned task collection and its mutation operations
//! - [`PersistenceScheduler`]: debounced background writes with save status
//! - [`codec`]: sync-code export/import (`base64(percent-escape(json))`)
//! - [`StorageBackend`]: the single named storage slot, file or in-memory
//! - [`assist`]: seams for the natural-language parser and motivational
//!   message collaborators, with their failure fallbacks

#![deny(unsafe_code)]

pub mod assist;
pub mod codec;
pub mod errors;
pub mod scheduler;
pub mod storage;
pub mod store;

pub use errors::{AssistError, StorageError, StoreError, SyncError};
pub use scheduler::{PersistenceScheduler, SaveStatus, SchedulerConfig};
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use store::{TaskCounts, TaskStore};
