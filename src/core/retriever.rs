/// Task retriever
///
/// Reads and edits individual tasks: partitions, toggling, deletion, reordering.

use crate::db::{Database, Task};
use crate::error::{Result, TaskmindError};
use std::sync::Arc;

/// Handles per-task operations
pub struct Retriever {
    db: Arc<Database>,
}

impl Retriever {
    /// Create a new retriever instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// The whole list in order
    pub async fn all(&self) -> Result<Vec<Task>> {
        self.db.get_tasks().await
    }

    /// Tasks still to do, in list order
    pub async fn active(&self) -> Result<Vec<Task>> {
        Ok(self.all().await?.into_iter().filter(|t| !t.completed).collect())
    }

    /// Finished tasks, in list order
    pub async fn completed(&self) -> Result<Vec<Task>> {
        Ok(self.all().await?.into_iter().filter(|t| t.completed).collect())
    }

    /// Get task by ID
    pub async fn get(&self, id: &str) -> Result<Task> {
        self.db
            .get_task(id)
            .await?
            .ok_or_else(|| TaskmindError::TaskNotFound(id.to_string()))
    }

    /// Flip completion. Returns the new state.
    pub async fn toggle(&self, id: &str) -> Result<bool> {
        let mut task = self.get(id).await?;
        task.completed = !task.completed;
        self.db.update_task(&task).await?;

        Ok(task.completed)
    }

    /// Remove a task
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.db.delete_task(id).await
    }

    /// Move the named tasks to the front in the given order
    ///
    /// Tasks not named keep their relative order after them.
    pub async fn reorder(&self, ids: &[String]) -> Result<Vec<Task>> {
        let mut remaining = self.all().await?;
        let mut ordered = Vec::with_capacity(remaining.len());

        for id in ids {
            let idx = remaining
                .iter()
                .position(|t| &t.id == id)
                .ok_or_else(|| TaskmindError::TaskNotFound(id.clone()))?;
            ordered.push(remaining.remove(idx));
        }
        ordered.extend(remaining);

        self.db.replace_tasks(&ordered).await?;
        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Recorder;
    use crate::db::Priority;

    async fn setup() -> (Retriever, Recorder) {
        let db = Arc::new(Database::new_test().await.unwrap());
        let retriever = Retriever::new(Arc::clone(&db));
        (retriever, Recorder::new(db))
    }

    #[tokio::test]
    async fn test_toggle_moves_between_partitions() {
        let (retriever, recorder) = setup().await;
        let task = recorder.add("浇花", Priority::Low).await.unwrap();

        assert_eq!(retriever.active().await.unwrap().len(), 1);

        let done = retriever.toggle(&task.id).await.unwrap();
        assert!(done);
        assert!(retriever.active().await.unwrap().is_empty());
        assert_eq!(retriever.completed().await.unwrap().len(), 1);

        assert!(!retriever.toggle(&task.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let (retriever, _) = setup().await;

        match retriever.toggle("nope").await {
            Err(TaskmindError::TaskNotFound(id)) => assert_eq!(id, "nope"),
            _ => panic!("Expected TaskNotFound error"),
        }
        assert!(retriever.delete("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_delete() {
        let (retriever, recorder) = setup().await;
        let task = recorder.add("x", Priority::Low).await.unwrap();

        retriever.delete(&task.id).await.unwrap();
        assert!(retriever.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reorder() {
        let (retriever, recorder) = setup().await;
        let a = recorder.add("a", Priority::Low).await.unwrap();
        let b = recorder.add("b", Priority::Low).await.unwrap();
        let c = recorder.add("c", Priority::Low).await.unwrap();

        let ordered = retriever.reorder(&[c.id.clone()]).await.unwrap();
        let ids: Vec<&str> = ordered.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![c.id.as_str(), a.id.as_str(), b.id.as_str()]);

        let stored: Vec<String> = retriever.all().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(stored, vec![c.id, a.id, b.id]);
    }

    #[tokio::test]
    async fn test_reorder_unknown_id_changes_nothing() {
        let (retriever, recorder) = setup().await;
        recorder.add("a", Priority::Low).await.unwrap();

        assert!(retriever.reorder(&["ghost".to_string()]).await.is_err());
        assert_eq!(retriever.all().await.unwrap().len(), 1);
    }
}
