/// Task store interface
///
/// The engine only ever needs two things from storage: the current list,
/// and a way to swap in a whole new one.

use crate::db::{Database, Task};
use crate::error::Result;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

/// Owner of the canonical task list
pub trait TaskStore: Send + Sync {
    /// Current list, in order
    fn snapshot(&self) -> impl Future<Output = Result<Vec<Task>>> + Send;

    /// Replace the whole list in one step
    fn replace_all(&self, tasks: Vec<Task>) -> impl Future<Output = Result<()>> + Send;
}

impl TaskStore for Database {
    fn snapshot(&self) -> impl Future<Output = Result<Vec<Task>>> + Send {
        self.get_tasks()
    }

    fn replace_all(&self, tasks: Vec<Task>) -> impl Future<Output = Result<()>> + Send {
        async move { self.replace_tasks(&tasks).await }
    }
}

impl<T: TaskStore> TaskStore for Arc<T> {
    fn snapshot(&self) -> impl Future<Output = Result<Vec<Task>>> + Send {
        T::snapshot(self)
    }

    fn replace_all(&self, tasks: Vec<Task>) -> impl Future<Output = Result<()>> + Send {
        T::replace_all(self, tasks)
    }
}

/// In-process store, handy for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    tasks: Mutex<Vec<Task>>,
}

impl MemoryStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Task>> {
        // writes swap the whole Vec, so a poisoned lock still holds a whole list
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current list without going through a future
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().clone()
    }
}

impl TaskStore for MemoryStore {
    fn snapshot(&self) -> impl Future<Output = Result<Vec<Task>>> + Send {
        let tasks = self.tasks();
        async move { Ok(tasks) }
    }

    fn replace_all(&self, tasks: Vec<Task>) -> impl Future<Output = Result<()>> + Send {
        *self.lock() = tasks;
        async { Ok(()) }
    }
}
