/// Calendar bucketing
///
/// Groups tasks by the UTC date they were created on, for the `--by-day` view.

use crate::db::Task;
use chrono::{DateTime, NaiveDate};
use std::collections::BTreeMap;

/// All tasks created on one calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub tasks: Vec<Task>,
}

impl DayBucket {
    /// `YYYY-MM-DD`
    pub fn key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Buckets in ascending date order, list order kept within a day
///
/// Timestamps outside chrono's range are skipped with a warning.
pub fn group_by_day(tasks: &[Task]) -> Vec<DayBucket> {
    let mut days: BTreeMap<NaiveDate, Vec<Task>> = BTreeMap::new();

    for task in tasks {
        match DateTime::from_timestamp_millis(task.created_at) {
            Some(created) => days.entry(created.date_naive()).or_default().push(task.clone()),
            None => tracing::warn!(id = %task.id, created_at = task.created_at, "timestamp out of range"),
        }
    }

    days.into_iter()
        .map(|(date, tasks)| DayBucket { date, tasks })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Priority;

    const DAY_MS: i64 = 86_400_000;

    fn task(id: &str, created_at: i64) -> Task {
        Task {
            id: id.to_string(),
            text: id.to_string(),
            completed: false,
            created_at,
            priority: Priority::Low,
            ai_suggestion: None,
        }
    }

    #[test]
    fn test_empty() {
        assert!(group_by_day(&[]).is_empty());
    }

    #[test]
    fn test_groups_ascending_and_keeps_order() {
        let tasks = vec![
            task("late", 2 * DAY_MS + 5),
            task("first", 10),
            task("second", DAY_MS - 1),
            task("next-day", DAY_MS),
        ];

        let buckets = group_by_day(&tasks);

        let keys: Vec<String> = buckets.iter().map(|b| b.key()).collect();
        assert_eq!(keys, vec!["1970-01-01", "1970-01-02", "1970-01-03"]);

        let first_day: Vec<&str> = buckets[0].tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(first_day, vec!["first", "second"]);
    }

    #[test]
    fn test_out_of_range_skipped() {
        let buckets = group_by_day(&[task("bad", i64::MAX), task("ok", 0)]);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].tasks[0].id, "ok");
    }
}
