/// SQL query functions for task storage
///
/// The list order lives in `position`. Whole-list replacement runs in one
/// transaction so readers never see half of a proposal.

use crate::db::models::*;
use crate::db::Database;
use crate::error::{Result, TaskmindError};

impl Database {
    /// Append a task at the end of the list
    pub async fn insert_task(&self, task: &Task) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, position, text, completed, created_at, priority, ai_suggestion)
            VALUES (?, (SELECT COALESCE(MAX(position), -1) + 1 FROM tasks), ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.text)
        .bind(task.completed)
        .bind(task.created_at)
        .bind(task.priority.as_str())
        .bind(&task.ai_suggestion)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Get the full list in order
    pub async fn get_tasks(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks ORDER BY position ASC")
            .fetch_all(self.pool())
            .await?;

        Ok(rows.into_iter().map(Task::from).collect())
    }

    /// Get one task by id
    pub async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(Task::from))
    }

    /// Overwrite the mutable fields of an existing task
    ///
    /// `id` and `created_at` never change.
    pub async fn update_task(&self, task: &Task) -> Result<()> {
        let result = sqlx::query(
            "UPDATE tasks SET text = ?, completed = ?, priority = ?, ai_suggestion = ? WHERE id = ?",
        )
        .bind(&task.text)
        .bind(task.completed)
        .bind(task.priority.as_str())
        .bind(&task.ai_suggestion)
        .bind(&task.id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(TaskmindError::TaskNotFound(task.id.clone()));
        }

        Ok(())
    }

    /// Delete a task by id
    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(TaskmindError::TaskNotFound(id.to_string()));
        }

        Ok(())
    }

    /// Replace the whole list atomically
    pub async fn replace_tasks(&self, tasks: &[Task]) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM tasks").execute(&mut *tx).await?;

        for (position, task) in tasks.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO tasks (id, position, text, completed, created_at, priority, ai_suggestion)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&task.id)
            .bind(position as i64)
            .bind(&task.text)
            .bind(task.completed)
            .bind(task.created_at)
            .bind(task.priority.as_str())
            .bind(&task.ai_suggestion)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(count = tasks.len(), "replaced task list");

        Ok(())
    }
}
