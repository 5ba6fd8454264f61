/// Proposed edits to a task list
///
/// Each variant is a pure transform: it reads the list it is given and
/// returns a new one. Task ids are captured when the suggestion is made, so
/// replaying a mutation against a list that has since changed only touches
/// the tasks that still exist.

use crate::db::{new_task_id, Priority, Task};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Prefix for tasks celebrated once the whole list is done
pub const CELEBRATE_MARK: &str = "🎉";
/// Prefix for recently finished tasks
pub const ACHIEVEMENT_MARK: &str = "✨";
/// Prefix for tasks picked for a focus session
pub const FOCUS_MARK: &str = "🍅";
/// Prefix for long tasks that could not be split automatically
pub const DECOMPOSE_MARK: &str = "📋";
pub const DECOMPOSE_HINT: &str = "(建议分解)";
/// Joins the texts of two merged tasks
pub const MERGE_SEPARATOR: &str = " + ";

/// Characters a long task gets split on: commas, full stops, enumeration
/// commas and the conjunctions 和/与/及.
const DECOMPOSE_SEPARATORS: &str = r"[，,。、和与及]";

fn separator_regex() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(DECOMPOSE_SEPARATORS).expect("separator pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskMutation {
    /// Prefix every unmarked completed task with 🎉
    Celebrate,
    /// Fold `absorb` into `keep` (texts joined, priority high), drop `absorb`
    Merge { keep: String, absorb: String },
    /// Set the priority of the listed tasks
    SetPriority { ids: Vec<String>, priority: Priority },
    /// Raise listed tasks from low to medium, leave the rest alone
    UpgradeLow { ids: Vec<String> },
    /// Prefix listed tasks with 🍅, optionally raising them to high
    FocusMark { ids: Vec<String>, promote: bool },
    /// Split listed tasks into subtasks on separator characters
    Decompose { ids: Vec<String> },
    /// Prefix unmarked tasks completed after `since_ms` with ✨
    Achieve { since_ms: i64 },
}

impl TaskMutation {
    /// Produce the proposed list. `tasks` is left untouched.
    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        match self {
            TaskMutation::Celebrate => tasks
                .iter()
                .map(|t| {
                    if t.completed && !has_reward_mark(&t.text) {
                        with_text(t, format!("{} {}", CELEBRATE_MARK, t.text))
                    } else {
                        t.clone()
                    }
                })
                .collect(),

            TaskMutation::Merge { keep, absorb } => merge(tasks, keep, absorb),

            TaskMutation::SetPriority { ids, priority } => tasks
                .iter()
                .map(|t| {
                    if contains(ids, &t.id) {
                        Task {
                            priority: *priority,
                            ..t.clone()
                        }
                    } else {
                        t.clone()
                    }
                })
                .collect(),

            TaskMutation::UpgradeLow { ids } => tasks
                .iter()
                .map(|t| {
                    if contains(ids, &t.id) && t.priority == Priority::Low {
                        Task {
                            priority: Priority::Medium,
                            ..t.clone()
                        }
                    } else {
                        t.clone()
                    }
                })
                .collect(),

            TaskMutation::FocusMark { ids, promote } => tasks
                .iter()
                .map(|t| {
                    if !contains(ids, &t.id) {
                        return t.clone();
                    }
                    let mut marked = t.clone();
                    if !marked.text.starts_with(FOCUS_MARK) {
                        marked.text = format!("{} {}", FOCUS_MARK, marked.text);
                    }
                    if *promote {
                        marked.priority = Priority::High;
                    }
                    marked
                })
                .collect(),

            TaskMutation::Decompose { ids } => {
                let mut taken: HashSet<String> = tasks.iter().map(|t| t.id.clone()).collect();
                tasks
                    .iter()
                    .flat_map(|t| {
                        if contains(ids, &t.id) {
                            decompose(t, &mut taken)
                        } else {
                            vec![t.clone()]
                        }
                    })
                    .collect()
            }

            TaskMutation::Achieve { since_ms } => tasks
                .iter()
                .map(|t| {
                    if t.completed && !has_reward_mark(&t.text) && t.created_at > *since_ms {
                        with_text(t, format!("{} {}", ACHIEVEMENT_MARK, t.text))
                    } else {
                        t.clone()
                    }
                })
                .collect(),
        }
    }
}

fn contains(ids: &[String], id: &str) -> bool {
    ids.iter().any(|candidate| candidate == id)
}

fn has_reward_mark(text: &str) -> bool {
    text.contains(CELEBRATE_MARK) || text.contains(ACHIEVEMENT_MARK)
}

fn with_text(task: &Task, text: String) -> Task {
    Task {
        text,
        ..task.clone()
    }
}

fn merge(tasks: &[Task], keep: &str, absorb: &str) -> Vec<Task> {
    let keep_idx = tasks.iter().position(|t| t.id == keep);
    let absorb_idx = tasks.iter().position(|t| t.id == absorb);

    let (Some(keep_idx), Some(absorb_idx)) = (keep_idx, absorb_idx) else {
        tracing::debug!(keep, absorb, "merge target missing, list unchanged");
        return tasks.to_vec();
    };
    if keep_idx == absorb_idx {
        return tasks.to_vec();
    }

    let mut merged = tasks.to_vec();
    let absorbed_text = merged[absorb_idx].text.clone();
    let target = &mut merged[keep_idx];
    target.text = format!("{}{}{}", target.text, MERGE_SEPARATOR, absorbed_text);
    target.priority = Priority::High;
    merged.remove(absorb_idx);

    merged
}

/// Split one task into parts, or mark it when it has nothing to split on
///
/// Part ids are `{id}-{index}` unless that id is in `taken`, in which case
/// the part gets a fresh id. Every id handed out is added to `taken`.
fn decompose(task: &Task, taken: &mut HashSet<String>) -> Vec<Task> {
    let parts: Vec<&str> = separator_regex()
        .split(&task.text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() <= 1 {
        return vec![with_text(
            task,
            format!("{} {} {}", DECOMPOSE_MARK, task.text, DECOMPOSE_HINT),
        )];
    }

    parts
        .into_iter()
        .enumerate()
        .map(|(idx, part)| {
            let mut id = format!("{}-{}", task.id, idx);
            if taken.contains(&id) {
                tracing::debug!(%id, "derived id already in use, issuing a fresh one");
                id = new_task_id();
            }
            taken.insert(id.clone());

            Task {
                id,
                text: part.to_string(),
                completed: false,
                priority: if idx == 0 { task.priority } else { Priority::Medium },
                ..task.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, text: &str, priority: Priority) -> Task {
        Task {
            id: id.to_string(),
            text: text.to_string(),
            completed: false,
            created_at: 1_000,
            priority,
            ai_suggestion: None,
        }
    }

    fn done(id: &str, text: &str, created_at: i64) -> Task {
        Task {
            completed: true,
            created_at,
            ..task(id, text, Priority::Medium)
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_separator_pattern_compiles() {
        assert!(Regex::new(DECOMPOSE_SEPARATORS).is_ok());
    }

    #[test]
    fn test_celebrate_skips_marked_and_active() {
        let tasks = vec![
            done("1", "写周报", 1),
            done("2", "✨ 跑步", 1),
            task("3", "买菜", Priority::Low),
        ];

        let out = TaskMutation::Celebrate.apply(&tasks);
        assert_eq!(out[0].text, "🎉 写周报");
        assert_eq!(out[1].text, "✨ 跑步");
        assert_eq!(out[2].text, "买菜");
    }

    #[test]
    fn test_merge() {
        let tasks = vec![
            task("a", "写 会议 纪要", Priority::Low),
            task("b", "other", Priority::Medium),
            task("c", "整理 会议 纪要", Priority::Medium),
        ];

        let mutation = TaskMutation::Merge {
            keep: "a".to_string(),
            absorb: "c".to_string(),
        };
        let out = mutation.apply(&tasks);

        assert_eq!(ids(&out), vec!["a", "b"]);
        assert_eq!(out[0].text, "写 会议 纪要 + 整理 会议 纪要");
        assert_eq!(out[0].priority, Priority::High);
        // input untouched
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].priority, Priority::Low);
    }

    #[test]
    fn test_merge_missing_target_is_identity() {
        let tasks = vec![task("a", "x", Priority::Low)];
        let mutation = TaskMutation::Merge {
            keep: "a".to_string(),
            absorb: "gone".to_string(),
        };
        assert_eq!(mutation.apply(&tasks), tasks);
    }

    #[test]
    fn test_set_priority_only_listed() {
        let tasks = vec![
            task("a", "x", Priority::Low),
            task("b", "y", Priority::Low),
        ];
        let mutation = TaskMutation::SetPriority {
            ids: vec!["b".to_string()],
            priority: Priority::High,
        };

        let out = mutation.apply(&tasks);
        assert_eq!(out[0].priority, Priority::Low);
        assert_eq!(out[1].priority, Priority::High);
    }

    #[test]
    fn test_upgrade_low_leaves_higher_alone() {
        let tasks = vec![
            task("a", "x", Priority::Low),
            task("b", "y", Priority::High),
            task("c", "z", Priority::Low),
        ];
        let mutation = TaskMutation::UpgradeLow {
            ids: vec!["a".to_string(), "b".to_string()],
        };

        let out = mutation.apply(&tasks);
        assert_eq!(out[0].priority, Priority::Medium);
        assert_eq!(out[1].priority, Priority::High);
        assert_eq!(out[2].priority, Priority::Low);
    }

    #[test]
    fn test_focus_mark_is_idempotent() {
        let tasks = vec![task("a", "deep work", Priority::Low)];
        let mutation = TaskMutation::FocusMark {
            ids: vec!["a".to_string()],
            promote: true,
        };

        let once = mutation.apply(&tasks);
        let twice = mutation.apply(&once);
        assert_eq!(once[0].text, "🍅 deep work");
        assert_eq!(once[0].priority, Priority::High);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_focus_mark_without_promote() {
        let tasks = vec![task("a", "deep work", Priority::Medium)];
        let mutation = TaskMutation::FocusMark {
            ids: vec!["a".to_string()],
            promote: false,
        };

        let out = mutation.apply(&tasks);
        assert_eq!(out[0].text, "🍅 deep work");
        assert_eq!(out[0].priority, Priority::Medium);
    }

    #[test]
    fn test_decompose_splits_on_separators() {
        let tasks = vec![
            task("keep", "short", Priority::Low),
            task("t", "整理房间，洗衣服和去超市购物。", Priority::High),
        ];
        let mutation = TaskMutation::Decompose {
            ids: vec!["t".to_string()],
        };

        let out = mutation.apply(&tasks);
        assert_eq!(ids(&out), vec!["keep", "t-0", "t-1", "t-2"]);
        assert_eq!(out[1].text, "整理房间");
        assert_eq!(out[2].text, "洗衣服");
        assert_eq!(out[3].text, "去超市购物");
        assert_eq!(out[1].priority, Priority::High);
        assert_eq!(out[2].priority, Priority::Medium);
        assert_eq!(out[3].priority, Priority::Medium);
        assert!(out[1..].iter().all(|t| !t.completed && t.created_at == 1_000));
    }

    #[test]
    fn test_decompose_avoids_ids_already_in_list() {
        let tasks = vec![
            task("7", "整理房间，洗衣服和去超市购物然后再去一趟银行办事", Priority::Medium),
            task("7-1", "short", Priority::Low),
        ];
        let mutation = TaskMutation::Decompose {
            ids: vec!["7".to_string()],
        };

        let out = mutation.apply(&tasks);
        assert_eq!(out.len(), 4);

        let unique: HashSet<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(unique.len(), out.len());
        assert_eq!(out[0].id, "7-0");
        assert_ne!(out[1].id, "7-1");
        assert_eq!(out[1].text, "洗衣服");
        assert_eq!(out[3].id, "7-1");
        assert_eq!(out[3].text, "short");
    }

    #[test]
    fn test_decompose_without_separator_marks_task() {
        let text = "a".repeat(40);
        let tasks = vec![task("t", &text, Priority::Low)];
        let mutation = TaskMutation::Decompose {
            ids: vec!["t".to_string()],
        };

        let out = mutation.apply(&tasks);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "t");
        assert_eq!(out[0].text, format!("📋 {} (建议分解)", text));
    }

    #[test]
    fn test_achieve_respects_window_and_marks() {
        let tasks = vec![
            done("old", "old win", 100),
            done("new", "new win", 500),
            done("marked", "🎉 party", 500),
        ];
        let mutation = TaskMutation::Achieve { since_ms: 200 };

        let out = mutation.apply(&tasks);
        assert_eq!(out[0].text, "old win");
        assert_eq!(out[1].text, "✨ new win");
        assert_eq!(out[2].text, "🎉 party");
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let json = serde_json::to_value(TaskMutation::Decompose {
            ids: vec!["x".to_string()],
        })
        .unwrap();
        assert_eq!(json["type"], "decompose");
    }
}
