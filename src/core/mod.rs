/// Core functionality modules
///
/// Everything around the suggestion engine: storing and editing tasks,
/// summarizing a proposed change, day bucketing, and the arbiter that
/// decides whether a proposed list replaces the stored one.

pub mod arbiter;
pub mod changes;
pub mod recorder;
pub mod retriever;
pub mod store;
pub mod timeline;

pub use arbiter::{apply_suggestion, Arbiter, PendingChange, Resolution};
pub use changes::{ChangeSet, FieldChange, TaskChange};
pub use recorder::Recorder;
pub use retriever::Retriever;
pub use store::{MemoryStore, TaskStore};
pub use timeline::{group_by_day, DayBucket};
