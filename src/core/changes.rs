/// Change summary between two task lists
///
/// Used to show what a pending change would do before it is committed.
/// Tasks are matched by id.

use crate::db::{Priority, Task};
use std::collections::HashMap;
use std::fmt;

/// One field that differs between the original and proposed task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Text { from: String, to: String },
    Priority { from: Priority, to: Priority },
    Completed(bool),
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldChange::Text { from, to } => write!(f, "text: \"{}\" -> \"{}\"", from, to),
            FieldChange::Priority { from, to } => write!(f, "priority: {} -> {}", from, to),
            FieldChange::Completed(true) => write!(f, "marked done"),
            FieldChange::Completed(false) => write!(f, "reopened"),
        }
    }
}

/// A task present on both sides with at least one differing field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChange {
    /// The proposed version
    pub task: Task,
    pub changes: Vec<FieldChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub modified: Vec<TaskChange>,
    pub added: Vec<Task>,
    pub removed: Vec<Task>,
}

impl ChangeSet {
    /// Diff two snapshots. Output follows the order of the list each task came from.
    pub fn between(original: &[Task], proposed: &[Task]) -> Self {
        let before: HashMap<&str, &Task> = original.iter().map(|t| (t.id.as_str(), t)).collect();
        let after: HashMap<&str, &Task> = proposed.iter().map(|t| (t.id.as_str(), t)).collect();

        let mut set = ChangeSet::default();

        for task in proposed {
            match before.get(task.id.as_str()) {
                None => set.added.push(task.clone()),
                Some(old) => {
                    let changes = field_changes(old, task);
                    if !changes.is_empty() {
                        set.modified.push(TaskChange {
                            task: task.clone(),
                            changes,
                        });
                    }
                }
            }
        }

        set.removed = original
            .iter()
            .filter(|t| !after.contains_key(t.id.as_str()))
            .cloned()
            .collect();

        set
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }

    /// Number of tasks touched in any way
    pub fn len(&self) -> usize {
        self.modified.len() + self.added.len() + self.removed.len()
    }
}

fn field_changes(old: &Task, new: &Task) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if old.text != new.text {
        changes.push(FieldChange::Text {
            from: old.text.clone(),
            to: new.text.clone(),
        });
    }
    if old.priority != new.priority {
        changes.push(FieldChange::Priority {
            from: old.priority,
            to: new.priority,
        });
    }
    if old.completed != new.completed {
        changes.push(FieldChange::Completed(new.completed));
    }

    changes
}
