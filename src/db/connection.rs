/// SQLite pool for the task list
///
/// One file per user under the data dir. WAL mode so `list` can read while
/// a pending change is being committed.

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 5;

/// How long a writer waits on a locked file before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = include_str!("../../database/schema.sql");

/// Handle to the task database. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl Database {
    /// Open (or create) the database file at `db_path`
    ///
    /// Parent directories are created as needed and the schema is applied.
    ///
    /// ```no_run
    /// use taskmind_lib::db::Database;
    ///
    /// # async fn example() -> taskmind_lib::Result<()> {
    /// let db = Database::new("/tmp/taskmind/tasks.db").await?;
    /// println!("{} tasks", db.get_tasks().await?.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT)
            .disable_statement_logging();

        let db = Self::open(options, MAX_CONNECTIONS, db_path).await?;
        tracing::debug!(path = %db.db_path.display(), "opened task database");

        Ok(db)
    }

    /// Fresh in-memory database
    ///
    /// One connection only: every in-memory connection is its own database.
    #[cfg(test)]
    pub async fn new_test() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Self::open(options, 1, PathBuf::from(":memory:")).await
    }

    async fn open(options: SqliteConnectOptions, max_connections: u32, db_path: PathBuf) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self {
            pool: Arc::new(pool),
            db_path,
        };
        db.apply_schema().await?;

        Ok(db)
    }

    // sqlx runs one statement per query, so the file is fed in pieces
    async fn apply_schema(&self) -> Result<()> {
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(self.pool()).await?;
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Counts for `taskmind status`
    pub async fn stats(&self) -> Result<DatabaseStats> {
        let (total, completed): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN completed THEN 1 ELSE 0 END), 0) FROM tasks",
        )
        .fetch_one(self.pool())
        .await?;

        let (high_priority,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks WHERE priority = 'high' AND NOT completed",
        )
        .fetch_one(self.pool())
        .await?;

        Ok(DatabaseStats {
            total_tasks: total,
            completed_tasks: completed,
            active_high_priority: high_priority,
            pool_size: self.pool.size(),
            idle_connections: self.pool.num_idle(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    /// Open tasks marked high
    pub active_high_priority: i64,
    pub pool_size: u32,
    pub idle_connections: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Priority, Task};

    #[tokio::test]
    async fn test_empty_database() {
        let db = Database::new_test().await.unwrap();
        let stats = db.stats().await.unwrap();

        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.completed_tasks, 0);
        assert_eq!(stats.active_high_priority, 0);
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let db = Database::new_test().await.unwrap();

        let mut done = Task::new("done", Priority::High, 1);
        done.completed = true;
        db.insert_task(&done).await.unwrap();
        db.insert_task(&Task::new("open", Priority::High, 2)).await.unwrap();
        db.insert_task(&Task::new("later", Priority::Low, 3)).await.unwrap();

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.active_high_priority, 1);
    }

    #[tokio::test]
    async fn test_database_on_disk_survives_reopen() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join("tasks.db");

        let db = Database::new(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.as_path());
        db.insert_task(&Task::new("persist me", Priority::Medium, 1)).await.unwrap();
        db.close().await;

        // schema statements are idempotent
        let reopened = Database::new(&path).await.unwrap();
        let tasks = reopened.get_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "persist me");
    }

    #[test]
    fn test_schema_has_no_stray_semicolons() {
        let statements: Vec<&str> = SCHEMA
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        assert!(statements.iter().all(|s| s.contains("CREATE")));
    }
}
