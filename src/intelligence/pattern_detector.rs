// Finds habits in what you've already finished
//
// If "周报" shows up in three finished tasks, it's probably a recurring chore,
// and open tasks mentioning it deserve attention first.

use crate::config::Thresholds;
use crate::db::Task;
use indexmap::IndexMap;

pub struct PatternDetector {
    thresholds: Thresholds,
}

impl PatternDetector {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Words that recur across completed tasks
    ///
    /// Returned in first-seen order, not by frequency. Callers treat the
    /// first entry as the "top" pattern, so this order is part of the contract.
    pub fn frequent_words(&self, completed: &[&Task]) -> Vec<String> {
        let counts = self.count_words(completed);

        counts
            .into_iter()
            .filter(|(word, count)| {
                *count >= self.thresholds.pattern_min_occurrences
                    && word.chars().count() > self.thresholds.pattern_min_word_chars
            })
            .map(|(word, _)| word)
            .take(self.thresholds.pattern_limit)
            .collect()
    }

    /// Word counts over completed task text, insertion-ordered
    fn count_words(&self, completed: &[&Task]) -> IndexMap<String, usize> {
        let mut counts: IndexMap<String, usize> = IndexMap::new();

        for task in completed {
            let lower = task.text.to_lowercase();
            for word in lower
                .split_whitespace()
                .filter(|w| w.chars().count() > self.thresholds.token_min_chars)
            {
                *counts.entry(word.to_string()).or_insert(0) += 1;
            }
        }

        counts
    }

    /// Completed tasks created inside the recent window, newest first
    pub fn recent_completions(&self, completed: &[&Task], now_ms: i64) -> Vec<Task> {
        let cutoff = now_ms.saturating_sub(self.thresholds.recent_window_ms());

        let mut recent: Vec<Task> = completed
            .iter()
            .filter(|t| t.created_at > cutoff)
            .map(|t| (*t).clone())
            .collect();

        // stable: equal timestamps keep list order
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(self.thresholds.recent_limit);

        recent
    }
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}
