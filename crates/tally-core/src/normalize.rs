//! Normalization of untrusted task payloads.
//!
//! Both import payloads and records persisted by older builds arrive as raw
//! [`serde_json::Value`]. [`normalize`] is the only way such data becomes a
//! [`Task`]:
//!
//! - **Shape**: the payload must be an array, otherwise
//!   [`NormalizeError::NotACollection`].
//! - **Backfill**: a missing or falsy `id` gets a fresh one; a missing or
//!   non-numeric `createdAt` gets the current time.
//! - **Coercion**: `isCompleted` follows JavaScript truthiness.
//! - **Pass-through**: `assignee` is kept even when it is not a configured
//!   participant; an unrecognised `priority` becomes `Medium`.
//! - **Skips**: elements that are not objects, or that lack a non-empty
//!   string `title` or a string `assignee`, cannot form a task and are
//!   dropped with a warning.
//!
//! Normalizing already-normalized output changes nothing.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::errors::NormalizeError;
use crate::ids::{IdGenerator, TaskId};
use crate::tasks::{Priority, Task};

/// Turn a decoded payload into well-formed tasks.
pub fn normalize(
    raw: &Value,
    ids: &IdGenerator,
    clock: &dyn Clock,
) -> Result<Vec<Task>, NormalizeError> {
    let Value::Array(items) = raw else {
        return Err(NormalizeError::NotACollection {
            found: json_kind(raw),
        });
    };

    let tasks: Vec<Task> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| normalize_record(index, item, ids, clock))
        .collect();

    if tasks.len() < items.len() {
        warn!(
            received = items.len(),
            kept = tasks.len(),
            "dropped task records that could not be repaired"
        );
    }
    Ok(tasks)
}

fn normalize_record(
    index: usize,
    item: &Value,
    ids: &IdGenerator,
    clock: &dyn Clock,
) -> Option<Task> {
    let Value::Object(record) = item else {
        debug!(index, kind = json_kind(item), "task record is not an object");
        return None;
    };

    let title = record
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())?;
    let Some(assignee) = record.get("assignee").and_then(Value::as_str) else {
        debug!(index, "task record has no assignee");
        return None;
    };

    Some(Task {
        id: record_id(record).unwrap_or_else(|| ids.generate()),
        title: title.to_string(),
        description: record
            .get("description")
            .and_then(Value::as_str)
            .map(String::from),
        assignee: assignee.to_string(),
        priority: record_priority(index, record),
        is_completed: record.get("isCompleted").is_some_and(is_truthy),
        created_at: record_created_at(record).unwrap_or_else(|| clock.now_ms()),
    })
}

fn record_id(record: &Map<String, Value>) -> Option<TaskId> {
    match record.get("id")? {
        Value::String(s) if !s.is_empty() => Some(TaskId::from(s.as_str())),
        v @ Value::Number(_) if is_truthy(v) => Some(TaskId::from(v.to_string())),
        _ => None,
    }
}

fn record_priority(index: usize, record: &Map<String, Value>) -> Priority {
    match record.get("priority").and_then(Value::as_str) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(index, priority = raw, "unknown priority, using Medium");
            Priority::Medium
        }),
        None => Priority::Medium,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn record_created_at(record: &Map<String, Value>) -> Option<i64> {
    let n = record.get("createdAt")?.as_number()?;
    n.as_i64()
        .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

/// JavaScript truthiness for a JSON value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
