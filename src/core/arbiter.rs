/// Pending-change arbiter
///
/// Holds at most one proposed replacement of the task list. The proposal is
/// committed on `confirm`, dropped on `cancel`, and committed automatically
/// when the countdown runs out. Each Pending episode has its own timer task,
/// aborted as soon as the episode ends some other way.

use crate::config::Thresholds;
use crate::core::{ChangeSet, TaskStore};
use crate::db::Task;
use crate::error::{Result, TaskmindError};
use crate::intelligence::Suggestion;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Run a suggestion's edit over `tasks`. `None` for informational suggestions.
pub fn apply_suggestion(suggestion: &Suggestion, tasks: &[Task]) -> Option<Vec<Task>> {
    suggestion.mutate(tasks)
}

/// A proposed list waiting for a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    pub original: Vec<Task>,
    pub proposed: Vec<Task>,
    pub deadline: DateTime<Utc>,
}

impl PendingChange {
    pub fn changes(&self) -> ChangeSet {
        ChangeSet::between(&self.original, &self.proposed)
    }
}

/// How a Pending episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Confirmed,
    Cancelled,
    TimedOut,
    /// The store refused the commit. The proposal is gone.
    Failed,
}

enum ArbiterState {
    Idle,
    Pending {
        change: PendingChange,
        episode: u64,
        expires: Instant,
        timer: JoinHandle<()>,
    },
}

struct Inner<S> {
    store: S,
    state: Mutex<ArbiterState>,
    episodes: AtomicU64,
    outcome: watch::Sender<Option<(u64, Resolution)>>,
    timeout: Duration,
}

impl<S: TaskStore> Inner<S> {
    fn lock(&self) -> MutexGuard<'_, ArbiterState> {
        // every transition is a single assignment, so the state is never half-written
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Move to Idle, handing back what was pending.
    /// `episode` restricts the take to one specific episode.
    fn take_pending(&self, episode: Option<u64>, abort_timer: bool) -> Option<(PendingChange, u64)> {
        let mut state = self.lock();

        if let ArbiterState::Pending { episode: current, .. } = &*state {
            if episode.is_some_and(|e| e != *current) {
                return None;
            }
        }

        match std::mem::replace(&mut *state, ArbiterState::Idle) {
            ArbiterState::Idle => None,
            ArbiterState::Pending {
                change,
                episode,
                timer,
                ..
            } => {
                if abort_timer {
                    timer.abort();
                }
                Some((change, episode))
            }
        }
    }

    async fn commit(&self, change: PendingChange, episode: u64, resolution: Resolution) -> Result<()> {
        let count = change.proposed.len();

        match self.store.replace_all(change.proposed).await {
            Ok(()) => {
                tracing::info!(episode, ?resolution, tasks = count, "pending change committed");
                self.settle(episode, resolution);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(episode, error = %e, "pending change could not be committed");
                self.settle(episode, Resolution::Failed);
                Err(e)
            }
        }
    }

    fn settle(&self, episode: u64, resolution: Resolution) {
        self.outcome.send_replace(Some((episode, resolution)));
    }

    async fn expire(&self, episode: u64) {
        if let Some((change, episode)) = self.take_pending(Some(episode), false) {
            // already logged inside commit
            let _ = self.commit(change, episode, Resolution::TimedOut).await;
        }
    }
}

/// Single-slot arbiter over a task store
pub struct Arbiter<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for Arbiter<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: TaskStore + 'static> Arbiter<S> {
    pub fn new(store: S, timeout: Duration) -> Self {
        let (outcome, _) = watch::channel(None);

        Self {
            inner: Arc::new(Inner {
                store,
                state: Mutex::new(ArbiterState::Idle),
                episodes: AtomicU64::new(0),
                outcome,
                timeout,
            }),
        }
    }

    /// Arbiter using the configured countdown
    pub fn with_thresholds(store: S, thresholds: &Thresholds) -> Self {
        Self::new(store, Duration::from_secs(thresholds.pending_timeout_secs))
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Idle → Pending. Starts the countdown and returns its deadline.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn begin_pending(&self, original: Vec<Task>, proposed: Vec<Task>) -> Result<DateTime<Utc>> {
        let mut state = self.inner.lock();
        if matches!(*state, ArbiterState::Pending { .. }) {
            return Err(TaskmindError::ChangeAlreadyPending);
        }

        let timeout = self.inner.timeout;
        let deadline = Utc::now()
            + chrono::Duration::from_std(timeout)
                .map_err(|e| TaskmindError::Config(format!("pending timeout: {}", e)))?;
        let episode = self.inner.episodes.fetch_add(1, Ordering::Relaxed) + 1;
        let expires = Instant::now() + timeout;

        // spawned under the lock so the timer can never observe the slot before it is filled
        let inner = Arc::clone(&self.inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(expires).await;
            inner.expire(episode).await;
        });

        *state = ArbiterState::Pending {
            change: PendingChange {
                original,
                proposed,
                deadline,
            },
            episode,
            expires,
            timer,
        };

        tracing::info!(episode, %deadline, "pending change started");
        Ok(deadline)
    }

    /// Pending → Idle, committing the proposal.
    /// Returns false when nothing was pending.
    pub async fn confirm(&self) -> Result<bool> {
        let Some((change, episode)) = self.inner.take_pending(None, true) else {
            return Ok(false);
        };

        self.inner
            .commit(change, episode, Resolution::Confirmed)
            .await?;
        Ok(true)
    }

    /// Pending → Idle, discarding the proposal.
    /// Returns false when nothing was pending.
    pub fn cancel(&self) -> bool {
        match self.inner.take_pending(None, true) {
            Some((_, episode)) => {
                tracing::info!(episode, "pending change cancelled");
                self.inner.settle(episode, Resolution::Cancelled);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.inner.lock(), ArbiterState::Pending { .. })
    }

    pub fn pending(&self) -> Option<PendingChange> {
        match &*self.inner.lock() {
            ArbiterState::Pending { change, .. } => Some(change.clone()),
            ArbiterState::Idle => None,
        }
    }

    /// Time left on the countdown
    pub fn remaining(&self) -> Option<Duration> {
        match &*self.inner.lock() {
            ArbiterState::Pending { expires, .. } => {
                Some(expires.saturating_duration_since(Instant::now()))
            }
            ArbiterState::Idle => None,
        }
    }

    /// Wait for the current episode to end and report how.
    /// When Idle, reports the last episode, or `None` if there never was one.
    pub async fn settled(&self) -> Option<Resolution> {
        let mut rx = self.inner.outcome.subscribe();

        let episode = match &*self.inner.lock() {
            ArbiterState::Pending { episode, .. } => *episode,
            ArbiterState::Idle => {
                let last = *rx.borrow();
                return last.map(|(_, resolution)| resolution);
            }
        };

        let outcome = rx
            .wait_for(|o| matches!(o, Some((e, _)) if *e == episode))
            .await
            .ok()
            .map(|o| *o);

        outcome.flatten().map(|(_, resolution)| resolution)
    }
}
