//! # tally-core
//!
//! Foundation types for Tally, the shared household task tracker.
//!
//! This crate provides the vocabulary every other Tally crate depends on:
//!
//! - **Tasks**: [`Task`], [`Priority`], [`ParsedTask`], [`ParticipantSet`]
//! - **IDs**: [`TaskId`] newtype and the collision-resistant [`IdGenerator`]
//! - **Clocks**: [`Clock`] trait with [`SystemClock`] and a frozen [`FixedClock`]
//! - **Normalization**: [`normalize`] turns untrusted JSON into well-formed tasks
//! - **Errors**: [`NormalizeError`], [`ParsePriorityError`] via `thiserror`
//! - **Logging**: `tracing` subscriber setup and a capture layer for tests

#![deny(unsafe_code)]

pub mod clock;
pub mod constants;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod normalize;
pub mod tasks;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{NormalizeError, ParsePriorityError};
pub use ids::{IdGenerator, TaskId};
pub use normalize::normalize;
pub use tasks::{AssigneeFilter, ParsedTask, ParticipantSet, Priority, Task};
