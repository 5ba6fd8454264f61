// Adds tasks to the store
//
// Cleans up whitespace and rejects junk before anything hits the database.
// Imports go through here too so every snapshot gets repaired the same way.

use crate::db::{normalize_snapshot, Database, Priority, Task, TaskDraft};
use crate::error::{Result, TaskmindError};
use std::sync::Arc;

// A task is a line on a list, not an essay.
const MAX_TASK_LENGTH: usize = 1_000;

pub struct Recorder {
    db: Arc<Database>,
}

impl Recorder {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // Validate, clean up, stamp with an id and the current time, append.
    pub async fn add(&self, text: &str, priority: Priority) -> Result<Task> {
        self.add_at(text, priority, chrono::Utc::now().timestamp_millis())
            .await
    }

    pub async fn add_at(&self, text: &str, priority: Priority, now_ms: i64) -> Result<Task> {
        self.validate_text(text)?;

        let task = Task::new(self.sanitize_text(text), priority, now_ms);
        self.db.insert_task(&task).await?;
        tracing::info!(id = %task.id, priority = %task.priority, "added task");

        Ok(task)
    }

    // Not empty, not huge
    fn validate_text(&self, text: &str) -> Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TaskmindError::InvalidTask("empty text".to_string()));
        }

        if trimmed.chars().count() > MAX_TASK_LENGTH {
            return Err(TaskmindError::TaskTooLong(MAX_TASK_LENGTH));
        }

        Ok(())
    }

    /// Sanitize task text
    ///
    /// - Removes null bytes
    /// - Trims whitespace
    /// - Normalizes whitespace (runs of spaces, tabs, newlines to one space)
    fn sanitize_text(&self, text: &str) -> String {
        text.replace('\0', "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Replace the whole list with an outside snapshot
    ///
    /// Missing fields get defaults, colliding ids get fresh ones.
    /// Returns how many tasks were adopted.
    pub async fn import(&self, drafts: Vec<TaskDraft>) -> Result<usize> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let tasks = normalize_snapshot(drafts, now_ms);

        for task in &tasks {
            self.validate_text(&task.text)?;
        }

        self.db.replace_tasks(&tasks).await?;
        Ok(tasks.len())
    }
}
