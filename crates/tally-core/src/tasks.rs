//! Task domain types.
//!
//! All types use `#[serde(rename_all = "camelCase")]` so the persisted JSON
//! and the sync-code payload share one wire shape:
//!
//! ```json
//! {"id":"…","title":"Buy milk","assignee":"Anna","priority":"Medium",
//!  "isCompleted":false,"createdAt":1700000000000}
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PARTICIPANTS;
use crate::errors::ParsePriorityError;
use crate::ids::TaskId;

/// Task priority.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Low.
    Low,
    /// Medium (default).
    #[default]
    Medium,
    /// High.
    High,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParsePriorityError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParsePriorityError(s.to_string()))
    }
}

/// A persisted task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique within a store; never changes.
    pub id: TaskId,
    /// Trimmed, non-empty.
    pub title: String,
    /// Optional free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Participant name.
    pub assignee: String,
    /// Priority.
    pub priority: Priority,
    /// Completion flag, the only field that changes after creation.
    #[serde(default)]
    pub is_completed: bool,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
}

impl Task {
    /// Build an open task from a parsed entry.
    pub fn from_parsed(id: TaskId, parsed: ParsedTask, created_at: i64) -> Self {
        Self {
            id,
            title: parsed.title.trim().to_string(),
            description: parsed.description,
            assignee: parsed.assignee,
            priority: parsed.priority,
            is_completed: false,
            created_at,
        }
    }
}

/// A task as produced by the natural-language parser, before it has an ID.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTask {
    /// Task title.
    pub title: String,
    /// Participant name.
    pub assignee: String,
    /// Priority.
    pub priority: Priority,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The closed set of people tasks can be assigned to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantSet(Vec<String>);

impl ParticipantSet {
    /// Build from names; blanks and duplicates are dropped, order is kept.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into().trim().to_string();
            if !name.is_empty() && !out.contains(&name) {
                out.push(name);
            }
        }
        Self(out)
    }

    /// Whether `name` is a participant (exact match).
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Participant names in configured order.
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl Default for ParticipantSet {
    fn default() -> Self {
        Self::new(DEFAULT_PARTICIPANTS)
    }
}

/// Read-side projection over assignees.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AssigneeFilter {
    /// Every task.
    #[default]
    All,
    /// Tasks assigned to exactly this name.
    Assignee(String),
}

impl AssigneeFilter {
    /// Whether `task` passes the filter.
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Assignee(name) => task.assignee == *name,
        }
    }
}

impl FromStr for AssigneeFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == "All" {
            Self::All
        } else {
            Self::Assignee(s.to_string())
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Task {
        Task {
            id: TaskId::from("t1"),
            title: "Buy milk".into(),
            description: None,
            assignee: "Anna".into(),
            priority: Priority::Medium,
            is_completed: false,
            created_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn task_wire_format_is_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "t1",
                "title": "Buy milk",
                "assignee": "Anna",
                "priority": "Medium",
                "isCompleted": false,
                "createdAt": 1_700_000_000_000_i64
            })
        );
    }

    #[test]
    fn description_serialized_when_present() {
        let mut task = sample();
        task.description = Some("2 litres".into());
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["description"], "2 litres");
    }

    #[test]
    fn priority_parse_case_insensitive() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" LOW ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn participant_set_dedups_and_trims() {
        let set = ParticipantSet::new(["Anna", " Anna ", "", "Bella"]);
        assert_eq!(set.names(), ["Anna".to_string(), "Bella".to_string()]);
        assert!(set.contains("Bella"));
        assert!(!set.contains("bella"));
    }

    #[test]
    fn default_participants() {
        let set = ParticipantSet::default();
        assert!(set.contains("Anna"));
        assert!(set.contains("Bella"));
        assert!(set.contains("Chloe"));
    }

    #[test]
    fn assignee_filter_parse() {
        assert_eq!("All".parse::<AssigneeFilter>().unwrap(), AssigneeFilter::All);
        assert_eq!(
            "Bella".parse::<AssigneeFilter>().unwrap(),
            AssigneeFilter::Assignee("Bella".into())
        );
    }

    #[test]
    fn assignee_filter_matches() {
        let task = sample();
        assert!(AssigneeFilter::All.matches(&task));
        assert!(AssigneeFilter::Assignee("Anna".into()).matches(&task));
        assert!(!AssigneeFilter::Assignee("Chloe".into()).matches(&task));
    }

    #[test]
    fn from_parsed_trims_and_opens() {
        let parsed = ParsedTask {
            title: "  Walk dog ".into(),
            assignee: "Chloe".into(),
            priority: Priority::High,
            description: None,
        };
        let task = Task::from_parsed(TaskId::from("x"), parsed, 5);
        assert_eq!(task.title, "Walk dog");
        assert!(!task.is_completed);
        assert_eq!(task.created_at, 5);
    }
}
