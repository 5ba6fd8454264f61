/// Data models for tasks
///
/// `Task` is the canonical record. `TaskDraft` is what arrives from outside
/// (imports, hand-edited snapshots) before it is repaired into a `Task`.
/// `TaskRow` maps the SQLite table.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;

/// Task priority, ordered low < medium < high
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parse a stored or typed priority. Unknown values fall back to medium.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" | "l" => Priority::Low,
            "high" | "h" => Priority::High,
            _ => Priority::Medium,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    /// Milliseconds since epoch. Never changes after creation.
    pub created_at: i64,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_suggestion: Option<String>,
}

impl Task {
    /// Create a fresh active task
    pub fn new(text: impl Into<String>, priority: Priority, now_ms: i64) -> Self {
        Self {
            id: new_task_id(),
            text: text.into(),
            completed: false,
            created_at: now_ms,
            priority,
            ai_suggestion: None,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.completed
    }
}

/// Generate a task id that has never been used
pub fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A task as received from outside, with any required field possibly missing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub ai_suggestion: Option<String>,
}

impl TaskDraft {
    /// Fill every missing field with its default
    pub fn normalize(self, now_ms: i64) -> Task {
        Task {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(new_task_id),
            text: self.text,
            completed: self.completed.unwrap_or(false),
            created_at: self.created_at.filter(|ts| *ts > 0).unwrap_or(now_ms),
            priority: self.priority.unwrap_or_default(),
            ai_suggestion: self.ai_suggestion,
        }
    }
}

/// Repair a whole snapshot before adopting it.
///
/// Fills defaults and re-issues any id already taken by an earlier task.
pub fn normalize_snapshot(drafts: Vec<TaskDraft>, now_ms: i64) -> Vec<Task> {
    let mut seen = HashSet::new();
    let mut repaired = 0usize;

    let tasks: Vec<Task> = drafts
        .into_iter()
        .map(|draft| {
            let needs_repair = draft.id.is_none()
                || draft.completed.is_none()
                || draft.created_at.is_none()
                || draft.priority.is_none();
            if needs_repair {
                repaired += 1;
            }

            let mut task = draft.normalize(now_ms);
            if !seen.insert(task.id.clone()) {
                repaired += 1;
                task.id = new_task_id();
                seen.insert(task.id.clone());
            }
            task
        })
        .collect();

    if repaired > 0 {
        tracing::warn!(repaired, total = tasks.len(), "repaired malformed tasks in snapshot");
    }

    tasks
}

/// Row in the `tasks` table
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: String,
    pub position: i64,
    pub text: String,
    pub completed: bool,
    pub created_at: i64,
    pub priority: String,
    pub ai_suggestion: Option<String>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            text: row.text,
            completed: row.completed,
            created_at: row.created_at,
            priority: Priority::parse_lenient(&row.priority),
            ai_suggestion: row.ai_suggestion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_parse_lenient() {
        assert_eq!(Priority::parse_lenient("HIGH"), Priority::High);
        assert_eq!(Priority::parse_lenient("low"), Priority::Low);
        assert_eq!(Priority::parse_lenient("whatever"), Priority::Medium);
    }

    #[test]
    fn test_task_json_shape() {
        let task = Task {
            id: "1700000000000".to_string(),
            text: "写周报".to_string(),
            completed: false,
            created_at: 1_700_000_000_000,
            priority: Priority::High,
            ai_suggestion: None,
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
        assert_eq!(json["priority"], "high");
        assert!(json.get("aiSuggestion").is_none());
    }

    #[test]
    fn test_draft_normalize_fills_defaults() {
        let draft: TaskDraft = serde_json::from_str(r#"{"text": "买菜"}"#).unwrap();
        let task = draft.normalize(42);

        assert!(!task.id.is_empty());
        assert_eq!(task.created_at, 42);
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.text, "买菜");
    }

    #[test]
    fn test_draft_normalize_keeps_present_fields() {
        let draft: TaskDraft = serde_json::from_str(
            r#"{"id": "a", "text": "x", "completed": true, "createdAt": 7, "priority": "low"}"#,
        )
        .unwrap();
        let task = draft.normalize(42);

        assert_eq!(task.id, "a");
        assert!(task.completed);
        assert_eq!(task.created_at, 7);
        assert_eq!(task.priority, Priority::Low);
    }

    #[test]
    fn test_normalize_snapshot_reissues_duplicate_ids() {
        let drafts = vec![
            TaskDraft {
                id: Some("dup".to_string()),
                text: "one".to_string(),
                ..Default::default()
            },
            TaskDraft {
                id: Some("dup".to_string()),
                text: "two".to_string(),
                ..Default::default()
            },
        ];

        let tasks = normalize_snapshot(drafts, 1);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "dup");
        assert_ne!(tasks[1].id, "dup");
    }

    #[test]
    fn test_row_into_task() {
        let row = TaskRow {
            id: "r1".to_string(),
            position: 0,
            text: "跑步".to_string(),
            completed: true,
            created_at: 5,
            priority: "high".to_string(),
            ai_suggestion: None,
        };

        let task: Task = row.into();
        assert_eq!(task.priority, Priority::High);
        assert!(task.completed);
    }
}
