/// Suggestion engine
///
/// Runs the analyzer once over a snapshot, then checks each rule in turn.
/// Every rule contributes at most one suggestion. The result is ranked
/// high → medium → low, keeping rule order within a rank.

use crate::config::{EngineConfig, Thresholds};
use crate::db::{Priority, Task};
use crate::intelligence::{Analyzer, Scorer, TaskAnalysis, TaskMutation};
use serde::Serialize;

/// What a suggestion is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Priority,
    Merge,
    Categorize,
    Decompose,
    Schedule,
    Pattern,
    Encourage,
}

impl std::fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SuggestionKind::Priority => "priority",
            SuggestionKind::Merge => "merge",
            SuggestionKind::Categorize => "categorize",
            SuggestionKind::Decompose => "decompose",
            SuggestionKind::Schedule => "schedule",
            SuggestionKind::Pattern => "pattern",
            SuggestionKind::Encourage => "encourage",
        };
        write!(f, "{}", s)
    }
}

/// A proposed change, with the edit that carries it out (if any)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub text: String,
    pub kind: SuggestionKind,
    /// Ranking weight, unrelated to any task's priority
    pub priority: Priority,
    pub mutation: Option<TaskMutation>,
}

impl Suggestion {
    fn new(text: String, kind: SuggestionKind, priority: Priority, mutation: TaskMutation) -> Self {
        Self {
            text,
            kind,
            priority,
            mutation: Some(mutation),
        }
    }

    /// The proposed list, or `None` for informational suggestions
    pub fn mutate(&self, tasks: &[Task]) -> Option<Vec<Task>> {
        self.mutation.as_ref().map(|m| m.apply(tasks))
    }

    pub fn is_actionable(&self) -> bool {
        self.mutation.is_some()
    }
}

/// Suggestion engine
pub struct SuggestionEngine {
    analyzer: Analyzer,
}

impl SuggestionEngine {
    /// Create a new suggestion engine
    pub fn new(config: EngineConfig) -> Self {
        Self {
            analyzer: Analyzer::new(config),
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    fn thresholds(&self) -> &Thresholds {
        self.analyzer.thresholds()
    }

    /// Generate suggestions against the current wall clock
    pub fn generate(&self, tasks: &[Task]) -> Vec<Suggestion> {
        self.generate_at(tasks, chrono::Utc::now().timestamp_millis())
    }

    /// Generate suggestions as if the time were `now_ms`
    ///
    /// Never fails. With no active tasks the only suggestion is the
    /// all-done celebration; otherwise any subset of the rules may fire.
    pub fn generate_at(&self, tasks: &[Task], now_ms: i64) -> Vec<Suggestion> {
        let analysis = self.analyzer.analyze_at(tasks, now_ms);
        let active: Vec<&Task> = tasks.iter().filter(|t| t.is_active()).collect();

        if active.is_empty() {
            return vec![self.suggest_all_done(&analysis)];
        }

        let mut suggestions: Vec<Suggestion> = [
            self.suggest_merge(&analysis),
            self.suggest_urgent(&active),
            self.suggest_category(&analysis, &active),
            self.suggest_first_high(&analysis, &active),
            self.suggest_pattern(&analysis, &active),
            self.suggest_workload(&active),
            self.suggest_decompose(&active),
            self.suggest_encourage(&analysis, now_ms),
        ]
        .into_iter()
        .flatten()
        .collect();

        // stable: rule order survives within a rank
        suggestions.sort_by_key(|s| std::cmp::Reverse(s.priority));

        tracing::debug!(
            count = suggestions.len(),
            kinds = ?suggestions.iter().map(|s| s.kind).collect::<Vec<_>>(),
            "generated suggestions"
        );

        suggestions
    }

    /// Everything is done: celebrate and stop
    fn suggest_all_done(&self, analysis: &TaskAnalysis) -> Suggestion {
        let recent = match analysis.recent_completions.len() {
            0 => "一些任务".to_string(),
            n => format!("{} 个任务", n),
        };

        Suggestion::new(
            format!("🎉 恭喜！所有任务已完成。根据历史记录，您最近完成了 {}，继续保持！", recent),
            SuggestionKind::Encourage,
            Priority::Low,
            TaskMutation::Celebrate,
        )
    }

    /// Two open tasks say nearly the same thing
    fn suggest_merge(&self, analysis: &TaskAnalysis) -> Option<Suggestion> {
        let pair = analysis.most_similar()?;
        if pair.score <= self.thresholds().merge {
            return None;
        }

        Some(Suggestion::new(
            format!(
                "发现相似任务：\"{}\" 和 \"{}\"，相似度 {}%，建议合并处理以提高效率",
                pair.first.text,
                pair.second.text,
                Scorer::as_percent(pair.score)
            ),
            SuggestionKind::Merge,
            Priority::High,
            TaskMutation::Merge {
                keep: pair.first.id.clone(),
                absorb: pair.second.id.clone(),
            },
        ))
    }

    /// Urgent wording on tasks that aren't marked high yet
    fn suggest_urgent(&self, active: &[&Task]) -> Option<Suggestion> {
        let categorizer = self.analyzer.categorizer();
        let ids: Vec<String> = active
            .iter()
            .filter(|t| t.priority != Priority::High && categorizer.is_urgent(&t.text))
            .map(|t| t.id.clone())
            .collect();

        if ids.is_empty() {
            return None;
        }

        Some(Suggestion::new(
            format!("检测到 {} 个包含紧急关键词的任务，建议将它们设置为高优先级", ids.len()),
            SuggestionKind::Priority,
            Priority::High,
            TaskMutation::SetPriority {
                ids,
                priority: Priority::High,
            },
        ))
    }

    /// One category dominates: nudge its low tasks up to medium
    fn suggest_category(&self, analysis: &TaskAnalysis, active: &[&Task]) -> Option<Suggestion> {
        let (tag, count) = analysis.dominant_category()?;
        if count < self.thresholds().dominant_category_min {
            return None;
        }

        let categorizer = self.analyzer.categorizer();
        let ids: Vec<String> = active
            .iter()
            .filter(|t| categorizer.categorize(&t.text).iter().any(|c| c == tag))
            .map(|t| t.id.clone())
            .collect();

        Some(Suggestion::new(
            format!(
                "您有 {} 个{}相关任务，建议将它们分组处理",
                count,
                categorizer.taxonomy().display_name(tag)
            ),
            SuggestionKind::Categorize,
            Priority::Medium,
            TaskMutation::UpgradeLow { ids },
        ))
    }

    /// Plenty to do and nothing marked high
    fn suggest_first_high(&self, analysis: &TaskAnalysis, active: &[&Task]) -> Option<Suggestion> {
        let thresholds = self.thresholds();
        if analysis.priority_counts.high > 0 || active.len() <= thresholds.no_high_min_active {
            return None;
        }

        let ids = first_ids(active, thresholds.no_high_promote);

        Some(Suggestion::new(
            format!(
                "您有 {} 个待办事项，但没有高优先级任务。建议将最重要的 2-3 个任务设置为高优先级",
                active.len()
            ),
            SuggestionKind::Priority,
            Priority::Medium,
            TaskMutation::SetPriority {
                ids,
                priority: Priority::High,
            },
        ))
    }

    /// Open tasks match words that keep showing up in finished ones
    fn suggest_pattern(&self, analysis: &TaskAnalysis, active: &[&Task]) -> Option<Suggestion> {
        let top = analysis.frequent_patterns.first()?;

        let lowered: Vec<(String, &Task)> = active
            .iter()
            .map(|t| (t.text.to_lowercase(), *t))
            .collect();

        if !lowered.iter().any(|(text, _)| text.contains(top.as_str())) {
            return None;
        }

        let ids: Vec<String> = lowered
            .iter()
            .filter(|(text, task)| {
                task.priority != Priority::High
                    && analysis
                        .frequent_patterns
                        .iter()
                        .any(|p| text.contains(p.as_str()))
            })
            .map(|(_, task)| task.id.clone())
            .collect();

        Some(Suggestion::new(
            format!("根据历史记录，您经常处理包含\"{}\"的任务。建议优先完成这类任务", top),
            SuggestionKind::Pattern,
            Priority::Medium,
            TaskMutation::SetPriority {
                ids,
                priority: Priority::High,
            },
        ))
    }

    /// Too much on the plate: pick focus tasks
    fn suggest_workload(&self, active: &[&Task]) -> Option<Suggestion> {
        let thresholds = self.thresholds();
        if active.len() <= thresholds.workload {
            return None;
        }

        let high: Vec<String> = active
            .iter()
            .filter(|t| t.priority == Priority::High)
            .map(|t| t.id.clone())
            .collect();

        if !high.is_empty() {
            return Some(Suggestion::new(
                format!(
                    "您当前有 {} 个待办事项，建议使用番茄工作法，为高优先级任务添加专注标记",
                    active.len()
                ),
                SuggestionKind::Schedule,
                Priority::Medium,
                TaskMutation::FocusMark {
                    ids: high,
                    promote: false,
                },
            ));
        }

        Some(Suggestion::new(
            format!(
                "您当前有 {} 个待办事项，建议将前{}个任务设置为高优先级并使用番茄工作法",
                active.len(),
                thresholds.focus_promote
            ),
            SuggestionKind::Schedule,
            Priority::Medium,
            TaskMutation::FocusMark {
                ids: first_ids(active, thresholds.focus_promote),
                promote: true,
            },
        ))
    }

    /// Long descriptions are usually several tasks in one
    fn suggest_decompose(&self, active: &[&Task]) -> Option<Suggestion> {
        let limit = self.thresholds().long_task_chars;
        let ids: Vec<String> = active
            .iter()
            .filter(|t| t.text.chars().count() > limit)
            .map(|t| t.id.clone())
            .collect();

        if ids.is_empty() {
            return None;
        }

        Some(Suggestion::new(
            format!("检测到 {} 个较长的任务描述，建议将它们分解为更小的子任务", ids.len()),
            SuggestionKind::Decompose,
            Priority::Low,
            TaskMutation::Decompose { ids },
        ))
    }

    /// Good completion record: mark recent wins
    fn suggest_encourage(&self, analysis: &TaskAnalysis, now_ms: i64) -> Option<Suggestion> {
        let thresholds = self.thresholds();
        if analysis.completion_rate <= thresholds.completion_rate
            || analysis.completed_count <= thresholds.completion_min_done
        {
            return None;
        }

        Some(Suggestion::new(
            format!(
                "您的任务完成率是 {}%，表现优秀！建议为最近完成的任务添加成就标记",
                Scorer::as_percent(analysis.completion_rate)
            ),
            SuggestionKind::Encourage,
            Priority::Low,
            TaskMutation::Achieve {
                since_ms: now_ms.saturating_sub(thresholds.recent_window_ms()),
            },
        ))
    }
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn first_ids(active: &[&Task], n: usize) -> Vec<String> {
    active.iter().take(n).map(|t| t.id.clone()).collect()
}
