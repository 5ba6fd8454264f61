/// Scoring helpers for task text
///
/// Jaccard similarity between descriptions and the guarded ratios the
/// analyzer reports.

use std::collections::HashSet;

/// Scorer for similarity and rates
pub struct Scorer;

impl Scorer {
    /// Jaccard similarity over lower-cased, whitespace-delimited words
    ///
    /// # Returns
    /// * Score between 0.0 and 1.0, symmetric in its arguments.
    ///   Two texts with no words at all score 0.0.
    pub fn similarity(a: &str, b: &str) -> f64 {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        let words_a: HashSet<&str> = a.split_whitespace().collect();
        let words_b: HashSet<&str> = b.split_whitespace().collect();

        let union = words_a.union(&words_b).count();
        if union == 0 {
            return 0.0;
        }

        let intersection = words_a.intersection(&words_b).count();
        intersection as f64 / union as f64
    }

    /// `part / total`, or 0.0 when there is nothing to divide by
    pub fn ratio(part: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }

        (part as f64 / total as f64).clamp(0.0, 1.0)
    }

    /// Score in [0, 1] as a whole percentage, rounded half up
    pub fn as_percent(score: f64) -> u32 {
        (score * 100.0).round().clamp(0.0, 100.0) as u32
    }
}
