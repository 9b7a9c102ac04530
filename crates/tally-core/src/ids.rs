//! Task identifiers.
//!
//! [`TaskId`] is a newtype around `String` so a task ID cannot be confused
//! with a title or an assignee name. New IDs come from [`IdGenerator`]:
//!
//! 1. **Preferred**: a random UUID (v4) built from OS randomness.
//! 2. **Fallback**: `<time base36>-<random base36>-<counter>` when OS
//!    randomness is unavailable. The counter is per generator and wraps at
//!    [`ID_COUNTER_WRAP`], so IDs stay unique under a frozen clock.
//!
//! Generation never fails.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng, TryRngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::constants::ID_COUNTER_WRAP;

/// Unique identifier for a task.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create from an existing string value.
    #[must_use]
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Return the inner string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume self and return the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::ops::Deref for TaskId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

/// How an [`IdGenerator`] builds IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Strategy {
    /// Random UUID, falling back to composite if the OS RNG fails.
    Uuid,
    /// Always composite.
    Composite,
}

/// Collision-resistant task ID source.
#[derive(Debug)]
pub struct IdGenerator {
    clock: Arc<dyn Clock>,
    counter: AtomicU32,
    strategy: Strategy,
}

impl IdGenerator {
    /// Generator that prefers random UUIDs, timed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Generator that prefers random UUIDs, timed by `clock` for fallbacks.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            counter: AtomicU32::new(0),
            strategy: Strategy::Uuid,
        }
    }

    /// Generator that always produces composite IDs.
    ///
    /// Used where the OS random source is known to be missing, and in tests
    /// that need to exercise the fallback under a frozen clock.
    pub fn composite_only(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            counter: AtomicU32::new(0),
            strategy: Strategy::Composite,
        }
    }

    /// The clock this generator reads.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Produce a new ID.
    pub fn generate(&self) -> TaskId {
        if self.strategy == Strategy::Uuid {
            if let Some(id) = random_uuid() {
                return TaskId(id);
            }
            debug!("OS randomness unavailable, using composite task id");
        }
        TaskId(self.composite())
    }

    fn composite(&self) -> String {
        let count = self.next_count();
        let now = u64::try_from(self.clock.now_ms()).unwrap_or_default();
        // Seeded locally: the thread RNG would itself need the OS source.
        let seed = wall_nanos() ^ (u64::from(count) << 32) ^ now;
        let noise: u32 = StdRng::seed_from_u64(seed).random();
        format!("{}-{}-{count:04}", to_base36(now), to_base36(u64::from(noise)))
    }

    fn next_count(&self) -> u32 {
        match self
            .counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| {
                Some((c + 1) % ID_COUNTER_WRAP)
            }) {
            Ok(prev) | Err(prev) => prev,
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn random_uuid() -> Option<String> {
    let mut bytes = [0u8; 16];
    OsRng.try_fill_bytes(&mut bytes).ok()?;
    Some(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
}

fn wall_nanos() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()) ^ d.as_secs())
        .unwrap_or_default()
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        #[allow(clippy::cast_possible_truncation)]
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
