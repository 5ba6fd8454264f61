/// Intelligence module
///
/// Looks at the task list and proposes changes to it: categorization,
/// similarity, recurring patterns, and the ranked suggestions built on them.

pub mod analyzer;
pub mod categorizer;
pub mod mutation;
pub mod pattern_detector;
pub mod scorer;
pub mod suggestion_engine;

pub use analyzer::{Analyzer, PriorityCounts, SimilarPair, TaskAnalysis};
pub use categorizer::{Categorizer, OTHER_TAG};
pub use mutation::TaskMutation;
pub use pattern_detector::PatternDetector;
pub use scorer::Scorer;
pub use suggestion_engine::{Suggestion, SuggestionEngine, SuggestionKind};
