/// Task analyzer
///
/// Folds categorization, pairwise similarity, priority spread, completion
/// stats and recurring words over one snapshot into a `TaskAnalysis`.
///
/// Similarity is checked for every pair of active tasks, so this is
/// quadratic in the active count. Fine for a personal list of a few dozen
/// items; not meant for thousands.

use crate::config::{EngineConfig, Thresholds};
use crate::db::{Priority, Task};
use crate::intelligence::{Categorizer, PatternDetector, Scorer};
use indexmap::IndexMap;
use serde::Serialize;

/// Two active tasks that read alike
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarPair {
    pub first: Task,
    pub second: Task,
    pub score: f64,
}

/// Active-task counts per priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityCounts {
    fn record(&mut self, priority: Priority) {
        match priority {
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
        }
    }
}

/// Snapshot analysis. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskAnalysis {
    /// Category tag → active tasks in it, in first-seen order
    pub categories: IndexMap<String, usize>,
    pub similar_pairs: Vec<SimilarPair>,
    pub priority_counts: PriorityCounts,
    /// Mean active-task text length in characters
    pub average_length: f64,
    /// Active tasks mentioning an urgent keyword
    pub urgent_count: usize,
    pub completion_rate: f64,
    pub recent_completions: Vec<Task>,
    pub frequent_patterns: Vec<String>,
    pub active_count: usize,
    pub completed_count: usize,
}

impl TaskAnalysis {
    /// Category with the most active tasks. Ties go to the first seen.
    pub fn dominant_category(&self) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        for (tag, count) in &self.categories {
            match best {
                Some((_, top)) if *count <= top => {}
                _ => best = Some((tag.as_str(), *count)),
            }
        }
        best
    }

    /// Highest-scoring similar pair. Ties go to the earlier pair.
    pub fn most_similar(&self) -> Option<&SimilarPair> {
        let mut best: Option<&SimilarPair> = None;
        for pair in &self.similar_pairs {
            match best {
                Some(top) if pair.score <= top.score => {}
                _ => best = Some(pair),
            }
        }
        best
    }
}

/// Main analyzer
pub struct Analyzer {
    categorizer: Categorizer,
    pattern_detector: PatternDetector,
    thresholds: Thresholds,
}

impl Analyzer {
    /// Create a new analyzer
    pub fn new(config: EngineConfig) -> Self {
        Self {
            categorizer: Categorizer::new(config.taxonomy),
            pattern_detector: PatternDetector::new(config.thresholds.clone()),
            thresholds: config.thresholds,
        }
    }

    pub fn categorizer(&self) -> &Categorizer {
        &self.categorizer
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Analyze against the current wall clock
    pub fn analyze(&self, tasks: &[Task]) -> TaskAnalysis {
        self.analyze_at(tasks, chrono::Utc::now().timestamp_millis())
    }

    /// Analyze as if the time were `now_ms`
    pub fn analyze_at(&self, tasks: &[Task], now_ms: i64) -> TaskAnalysis {
        let (active, completed): (Vec<&Task>, Vec<&Task>) =
            tasks.iter().partition(|t| t.is_active());

        let mut categories: IndexMap<String, usize> = IndexMap::new();
        let mut priority_counts = PriorityCounts::default();
        let mut urgent_count = 0;
        let mut total_length = 0usize;

        for task in &active {
            for tag in self.categorizer.categorize(&task.text) {
                *categories.entry(tag).or_insert(0) += 1;
            }
            priority_counts.record(task.priority);
            if self.categorizer.is_urgent(&task.text) {
                urgent_count += 1;
            }
            total_length += task.text.chars().count();
        }

        let average_length = if active.is_empty() {
            0.0
        } else {
            total_length as f64 / active.len() as f64
        };

        let similar_pairs = self.find_similar_pairs(&active);
        let recent_completions = self.pattern_detector.recent_completions(&completed, now_ms);
        let frequent_patterns = self.pattern_detector.frequent_words(&completed);

        tracing::debug!(
            active = active.len(),
            completed = completed.len(),
            similar = similar_pairs.len(),
            patterns = frequent_patterns.len(),
            "analyzed task snapshot"
        );

        TaskAnalysis {
            categories,
            similar_pairs,
            priority_counts,
            average_length,
            urgent_count,
            completion_rate: Scorer::ratio(completed.len(), tasks.len()),
            recent_completions,
            frequent_patterns,
            active_count: active.len(),
            completed_count: completed.len(),
        }
    }

    /// Every unordered pair of active tasks scoring above the pair threshold
    fn find_similar_pairs(&self, active: &[&Task]) -> Vec<SimilarPair> {
        let mut pairs = Vec::new();

        for (i, first) in active.iter().enumerate() {
            for second in &active[i + 1..] {
                let score = Scorer::similarity(&first.text, &second.text);
                if score > self.thresholds.similar_pair {
                    pairs.push(SimilarPair {
                        first: (*first).clone(),
                        second: (*second).clone(),
                        score,
                    });
                }
            }
        }

        pairs
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000_000;
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn task(id: &str, text: &str, completed: bool, priority: Priority) -> Task {
        Task {
            id: id.to_string(),
            text: text.to_string(),
            completed,
            created_at: NOW - DAY_MS,
            priority,
            ai_suggestion: None,
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let analysis = Analyzer::default().analyze_at(&[], NOW);

        assert!(analysis.categories.is_empty());
        assert_eq!(analysis.completion_rate, 0.0);
        assert_eq!(analysis.average_length, 0.0);
        assert_eq!(analysis.active_count, 0);
        assert!(analysis.dominant_category().is_none());
        assert!(analysis.most_similar().is_none());
    }

    #[test]
    fn test_counts_only_active_tasks() {
        let tasks = vec![
            task("1", "准备会议材料", false, Priority::High),
            task("2", "紧急 修电脑", false, Priority::Low),
            task("3", "写项目报告", true, Priority::Medium),
            task("4", "散步", false, Priority::Medium),
        ];

        let analysis = Analyzer::default().analyze_at(&tasks, NOW);

        assert_eq!(analysis.active_count, 3);
        assert_eq!(analysis.completed_count, 1);
        assert_eq!(analysis.categories.get("work"), Some(&1));
        assert_eq!(analysis.categories.get("urgent"), Some(&1));
        assert_eq!(analysis.categories.get("other"), Some(&1));
        assert_eq!(
            analysis.priority_counts,
            PriorityCounts {
                high: 1,
                medium: 1,
                low: 1
            }
        );
        assert_eq!(analysis.urgent_count, 1);
        assert_eq!(analysis.completion_rate, 0.25);
        // 6 + 6 + 2 characters
        assert!((analysis.average_length - 14.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_similar_pairs_threshold() {
        let tasks = vec![
            task("1", "buy milk and eggs", false, Priority::Medium),
            task("2", "buy milk and bread", false, Priority::Medium),
            task("3", "call the plumber", false, Priority::Medium),
        ];

        let analysis = Analyzer::default().analyze_at(&tasks, NOW);

        // 3 shared of 5 words
        assert_eq!(analysis.similar_pairs.len(), 1);
        let pair = analysis.most_similar().unwrap();
        assert_eq!(pair.first.id, "1");
        assert_eq!(pair.second.id, "2");
        assert!((pair.score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_completed_tasks_not_paired() {
        let tasks = vec![
            task("1", "water the plants", false, Priority::Medium),
            task("2", "water the plants", true, Priority::Medium),
        ];

        let analysis = Analyzer::default().analyze_at(&tasks, NOW);
        assert!(analysis.similar_pairs.is_empty());
    }

    #[test]
    fn test_dominant_category_tie_goes_to_first_seen() {
        let tasks = vec![
            task("1", "跑步", false, Priority::Medium),
            task("2", "写代码", false, Priority::Medium),
            task("3", "瑜伽", false, Priority::Medium),
            task("4", "开发新功能", false, Priority::Medium),
        ];

        let analysis = Analyzer::default().analyze_at(&tasks, NOW);
        assert_eq!(analysis.dominant_category(), Some(("health", 2)));
    }

    #[test]
    fn test_analyze_is_pure() {
        let tasks = vec![
            task("1", "email the team", false, Priority::Low),
            task("2", "email the client", false, Priority::Medium),
            task("3", "review email", true, Priority::Medium),
        ];
        let before = tasks.clone();

        let analyzer = Analyzer::default();
        let first = analyzer.analyze_at(&tasks, NOW);
        let second = analyzer.analyze_at(&tasks, NOW);

        assert_eq!(tasks, before);
        assert_eq!(first, second);
    }
}
