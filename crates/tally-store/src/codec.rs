//! Sync codes: portable text snapshots of a task collection.
//!
//! A sync code is `base64(percent_escape(json(tasks)))`. Percent-escaping
//! turns any Unicode in titles into ASCII before base64, so the code
//! survives being pasted through chat apps and email. There is no checksum,
//! version tag, or compression; anything not produced by this pipeline is
//! expected to fail [`decode`].
//!
//! Decoding stages, each with its own [`SyncError`] variant:
//!
//! 1. strip whitespace (codes get line-wrapped in transit)
//! 2. base64 → bytes → UTF-8
//! 3. validate and reverse percent escapes
//! 4. parse JSON
//! 5. [`normalize`] into tasks

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use tally_core::{Clock, IdGenerator, Task, normalize};
use tracing::warn;

use crate::errors::SyncError;

/// Returned by [`encode`] when the collection cannot be serialized.
pub const EXPORT_ERROR_SENTINEL: &str = "Error generating sync code";

/// Export `tasks` as a sync code, or [`EXPORT_ERROR_SENTINEL`] on failure.
pub fn encode(tasks: &[Task]) -> String {
    match try_encode(tasks) {
        Ok(code) => code,
        Err(error) => {
            warn!(%error, count = tasks.len(), "failed to encode sync code");
            EXPORT_ERROR_SENTINEL.to_string()
        }
    }
}

/// Export `tasks` as a sync code.
pub fn try_encode(tasks: &[Task]) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(tasks)?;
    let escaped = urlencoding::encode(&json);
    Ok(STANDARD.encode(escaped.as_bytes()))
}

/// Parse a sync code back into normalized tasks. No partial results.
pub fn decode(code: &str, ids: &IdGenerator, clock: &dyn Clock) -> Result<Vec<Task>, SyncError> {
    let compact: String = code.split_ascii_whitespace().collect();
    let bytes = STANDARD.decode(compact.as_bytes())?;
    let escaped = String::from_utf8(bytes)?;
    check_escapes(&escaped)?;
    let json = urlencoding::decode(&escaped)?;
    let raw: Value = serde_json::from_str(&json)?;
    Ok(normalize(&raw, ids, clock)?)
}

/// Every `%` must introduce two hex digits.
fn check_escapes(text: &str) -> Result<(), SyncError> {
    let bytes = text.as_bytes();
    for (position, _) in text.match_indices('%') {
        let valid = bytes
            .get(position + 1..position + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(SyncError::Escape { position });
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use tally_core::{FixedClock, NormalizeError, Priority, TaskId};

    use super::*;

    fn fixtures() -> (IdGenerator, FixedClock) {
        (IdGenerator::new(), FixedClock::new(1_700_000_000_000))
    }

    fn task(id: &str, title: &str, description: Option<&str>) -> Task {
        Task {
            id: TaskId::from(id),
            title: title.to_string(),
            description: description.map(String::from),
            assignee: "Bella".to_string(),
            priority: Priority::High,
            is_completed: true,
            created_at: 1_699_999_999_123,
        }
    }

    fn raw_code(payload: &str) -> String {
        STANDARD.encode(payload.as_bytes())
    }

    #[test]
    fn round_trip_preserves_everything() {
        let (ids, clock) = fixtures();
        let tasks = vec![
            task("a", "Crème brûlée 🍮", Some("für alle")),
            task("b", "plain", None),
            task("c", "100% done & dusted", Some("")),
        ];
        let code = encode(&tasks);
        assert_eq!(decode(&code, &ids, &clock).unwrap(), tasks);
    }

    #[test]
    fn code_is_plain_ascii() {
        let code = encode(&[task("a", "日本語 \"quotes\"\n", None)]);
        assert!(code.is_ascii());
        assert!(!code.contains(char::is_whitespace));
    }

    #[test]
    fn empty_collection_round_trips() {
        let (ids, clock) = fixtures();
        assert!(decode(&encode(&[]), &ids, &clock).unwrap().is_empty());
    }

    #[test]
    fn tolerates_wrapped_code() {
        let (ids, clock) = fixtures();
        let tasks = vec![task("a", "wrapped", None)];
        let code = encode(&tasks);
        let (head, tail) = code.split_at(code.len() / 2);
        let wrapped = format!("  {head}\n{tail}\r\n");
        assert_eq!(decode(&wrapped, &ids, &clock).unwrap(), tasks);
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let (ids, clock) = fixtures();
        assert_matches!(
            decode("not-valid-base64!!", &ids, &clock),
            Err(SyncError::Base64(_))
        );
    }

    #[test]
    fn non_utf8_payload_is_rejected() {
        let (ids, clock) = fixtures();
        let code = STANDARD.encode([0xff, 0xfe, 0x00]);
        assert_matches!(decode(&code, &ids, &clock), Err(SyncError::Utf8(_)));
    }

    #[test]
    fn corrupt_escape_is_rejected() {
        let (ids, clock) = fixtures();
        assert_matches!(
            decode(&raw_code("%5B%zz"), &ids, &clock),
            Err(SyncError::Escape { position: 3 })
        );
        assert_matches!(
            decode(&raw_code("%5B%5"), &ids, &clock),
            Err(SyncError::Escape { position: 3 })
        );
    }

    #[test]
    fn invalid_json_is_rejected() {
        let (ids, clock) = fixtures();
        assert_matches!(
            decode(&raw_code("%5B%7B"), &ids, &clock),
            Err(SyncError::Json(_))
        );
    }

    #[test]
    fn non_collection_is_rejected() {
        let (ids, clock) = fixtures();
        assert_matches!(
            decode(&raw_code("%7B%7D"), &ids, &clock),
            Err(SyncError::NotACollection(NormalizeError::NotACollection { found: "object" }))
        );
    }

    #[test]
    fn accepts_unescaped_safe_characters() {
        // Browsers leave !'()* unescaped; those codes must still import.
        let (ids, clock) = fixtures();
        let payload = "%5B%7B%22title%22%3A%22Wow!(really)%22%2C%22assignee%22%3A%22Anna%22\
                       %2C%22priority%22%3A%22Low%22%7D%5D";
        let tasks = decode(&raw_code(payload), &ids, &clock).unwrap();
        assert_eq!(tasks[0].title, "Wow!(really)");
        assert_eq!(tasks[0].created_at, 1_700_000_000_000);
    }

    #[test]
    fn backfills_imported_records() {
        let (ids, clock) = fixtures();
        let payload = urlencoding::encode(r#"[{"title":"X","assignee":"Chloe","priority":"High"}]"#)
            .into_owned();
        let tasks = decode(&raw_code(&payload), &ids, &clock).unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(!tasks[0].id.is_empty());
        assert!(!tasks[0].is_completed);
    }

    proptest! {
        #[test]
        fn round_trip_arbitrary_text(
            title in "\\PC{1,40}",
            description in proptest::option::of("\\PC{0,40}"),
            created_at in 0_i64..4_000_000_000_000,
            done in any::<bool>(),
        ) {
            prop_assume!(!title.trim().is_empty() && title.trim() == title);
            let (ids, clock) = fixtures();
            let mut original = task("p", &title, description.as_deref());
            original.created_at = created_at;
            original.is_completed = done;
            let decoded = decode(&encode(std::slice::from_ref(&original)), &ids, &clock).unwrap();
            prop_assert_eq!(decoded, vec![original]);
        }
    }
}
