//! Seams for the external assist collaborators.
//!
//! Two best-effort services sit outside the store:
//!
//! - a [`TaskParser`] that turns free text ("Anna buys milk, Bella walks the
//!   dog tomorrow, urgent") into [`ParsedTask`]s;
//! - a [`MotivationSource`] that writes a short cheer-up line from the
//!   pending/completed totals.
//!
//! The store never depends on a concrete provider. Implementations are
//! responsible for emitting only configured assignees and valid priorities.
//! Any failure degrades to "could not understand" or
//! [`MOTIVATION_FALLBACK`] and never touches task state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tally_core::{ParsedTask, ParticipantSet};
use tracing::{debug, warn};

use crate::errors::AssistError;
use crate::store::{TaskCounts, TaskStore};

/// Shown when the motivational collaborator fails.
pub const MOTIVATION_FALLBACK: &str = "Every finished task counts. Keep going, team!";

/// Parser response envelope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedBatch {
    /// Tasks found in the input, in reading order.
    pub tasks: Vec<ParsedTask>,
}

/// Natural-language task parser.
#[async_trait]
pub trait TaskParser: Send + Sync {
    /// Extract tasks from `input`; `Ok(None)` when nothing was understood.
    async fn parse(
        &self,
        input: &str,
        participants: &ParticipantSet,
    ) -> Result<Option<ParsedBatch>, AssistError>;
}

/// Motivational message generator.
#[async_trait]
pub trait MotivationSource: Send + Sync {
    /// A short message for the given totals.
    async fn generate(&self, pending: usize, completed: usize) -> Result<String, AssistError>;
}

/// Result of feeding free text to the parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseOutcome {
    /// This many tasks were added to the store.
    Added(usize),
    /// The parser failed or found nothing; the store is unchanged.
    NotUnderstood,
}

/// Run `input` through `parser` and add whatever it found to `store`.
pub async fn apply_parsed_input(
    parser: &dyn TaskParser,
    store: &mut TaskStore,
    input: &str,
) -> ParseOutcome {
    let input = input.trim();
    if input.is_empty() {
        return ParseOutcome::NotUnderstood;
    }

    let batch = match parser.parse(input, store.participants()).await {
        Ok(Some(batch)) => batch,
        Ok(None) => {
            debug!("parser did not understand input");
            return ParseOutcome::NotUnderstood;
        }
        Err(error) => {
            warn!(%error, "task parser failed");
            return ParseOutcome::NotUnderstood;
        }
    };

    match store.add_from_parsed_batch(batch.tasks) {
        0 => ParseOutcome::NotUnderstood,
        added => ParseOutcome::Added(added),
    }
}

/// A motivational line for `counts`, or [`MOTIVATION_FALLBACK`].
pub async fn motivational_message(source: &dyn MotivationSource, counts: TaskCounts) -> String {
    match source.generate(counts.pending, counts.completed).await {
        Ok(message) if !message.trim().is_empty() => message.trim().to_string(),
        Ok(_) => {
            debug!("motivation source returned an empty message");
            MOTIVATION_FALLBACK.to_string()
        }
        Err(error) => {
            warn!(%error, "motivation source failed");
            MOTIVATION_FALLBACK.to_string()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tally_core::{IdGenerator, Priority};

    use super::*;

    enum StubParser {
        Finds(Vec<ParsedTask>),
        Nothing,
        Down,
    }

    #[async_trait]
    impl TaskParser for StubParser {
        async fn parse(
            &self,
            _input: &str,
            _participants: &ParticipantSet,
        ) -> Result<Option<ParsedBatch>, AssistError> {
            match self {
                Self::Finds(tasks) => Ok(Some(ParsedBatch {
                    tasks: tasks.clone(),
                })),
                Self::Nothing => Ok(None),
                Self::Down => Err(AssistError::Unavailable("503".into())),
            }
        }
    }

    #[derive(Default)]
    struct CountingParser {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TaskParser for CountingParser {
        async fn parse(
            &self,
            _input: &str,
            _participants: &ParticipantSet,
        ) -> Result<Option<ParsedBatch>, AssistError> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    struct StubMotivation(Result<String, ()>);

    #[async_trait]
    impl MotivationSource for StubMotivation {
        async fn generate(&self, pending: usize, completed: usize) -> Result<String, AssistError> {
            self.0
                .clone()
                .map(|m| m.replace("{p}", &pending.to_string()).replace("{c}", &completed.to_string()))
                .map_err(|()| AssistError::InvalidResponse("garbled".into()))
        }
    }

    fn store() -> TaskStore {
        TaskStore::new(ParticipantSet::default(), IdGenerator::new())
    }

    fn parsed(title: &str) -> ParsedTask {
        ParsedTask {
            title: title.into(),
            assignee: "Bella".into(),
            priority: Priority::High,
            description: Some("from text".into()),
        }
    }

    #[tokio::test]
    async fn parsed_tasks_are_added() {
        let mut store = store();
        let parser = StubParser::Finds(vec![parsed("water plants"), parsed("call grandma")]);
        let outcome = apply_parsed_input(&parser, &mut store, "Bella: water plants, call grandma").await;
        assert_eq!(outcome, ParseOutcome::Added(2));
        assert_eq!(store.tasks()[0].title, "water plants");
        assert_eq!(store.tasks()[1].description.as_deref(), Some("from text"));
    }

    #[tokio::test]
    async fn parser_failure_leaves_store_untouched() {
        let mut store = store();
        for parser in [StubParser::Nothing, StubParser::Down, StubParser::Finds(Vec::new())] {
            assert_eq!(
                apply_parsed_input(&parser, &mut store, "gibberish").await,
                ParseOutcome::NotUnderstood
            );
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn blank_input_skips_parser() {
        let mut store = store();
        let parser = CountingParser::default();
        assert_eq!(
            apply_parsed_input(&parser, &mut store, "   ").await,
            ParseOutcome::NotUnderstood
        );
        assert_eq!(parser.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn motivation_uses_counts() {
        let source = StubMotivation(Ok(" {p} to go, {c} done! ".into()));
        let counts = TaskCounts {
            pending: 3,
            completed: 4,
        };
        assert_eq!(motivational_message(&source, counts).await, "3 to go, 4 done!");
    }

    #[tokio::test]
    async fn motivation_falls_back() {
        let counts = TaskCounts::default();
        let failing = StubMotivation(Err(()));
        assert_eq!(motivational_message(&failing, counts).await, MOTIVATION_FALLBACK);
        let blank = StubMotivation(Ok("   ".into()));
        assert_eq!(motivational_message(&blank, counts).await, MOTIVATION_FALLBACK);
    }
}
