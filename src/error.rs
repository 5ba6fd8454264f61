/// Error types for taskmind
///
/// The suggestion engine itself is total and never fails. Everything here
/// belongs to the plumbing around it: storage, config, imports, the CLI.
/// Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Main error type for taskmind operations
#[derive(Error, Debug)]
pub enum TaskmindError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O errors (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Config file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// No task with the given id
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Task text is empty or otherwise unusable
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// Task text exceeds maximum length
    #[error("Task exceeds maximum allowed length of {0} characters")]
    TaskTooLong(usize),

    /// A proposal is already waiting for confirm/cancel
    #[error("A change is already pending confirmation")]
    ChangeAlreadyPending,

    /// Suggestion index out of range
    #[error("Suggestion not found: {0}")]
    SuggestionNotFound(usize),

    /// Suggestion has no mutation attached
    #[error("Suggestion {0} is informational and cannot be applied")]
    NotApplicable(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for taskmind operations
pub type Result<T> = std::result::Result<T, TaskmindError>;

/// Convert TaskmindError to a user-friendly error message
impl TaskmindError {
    pub fn user_message(&self) -> String {
        match self {
            TaskmindError::Database(e) => {
                format!("Database error occurred. Please try again. Details: {}", e)
            }
            TaskmindError::Io(e) => {
                format!("File system error. Check permissions. Details: {}", e)
            }
            TaskmindError::Serialization(e) => {
                format!("Data format error: {}", e)
            }
            TaskmindError::ConfigParse(e) => {
                format!("Could not read config file: {}", e)
            }
            TaskmindError::TaskNotFound(id) => {
                format!("No task with id '{}'", id)
            }
            TaskmindError::InvalidTask(reason) => {
                format!("Invalid task: {}", reason)
            }
            TaskmindError::TaskTooLong(max) => {
                format!("Task exceeds maximum length of {} characters", max)
            }
            TaskmindError::ChangeAlreadyPending => {
                "Another change is waiting for confirmation. Confirm or cancel it first.".to_string()
            }
            TaskmindError::SuggestionNotFound(index) => {
                format!("There is no suggestion #{}. Run 'taskmind suggest' to list them.", index)
            }
            TaskmindError::NotApplicable(index) => {
                format!("Suggestion #{} is just a tip, there is nothing to apply", index)
            }
            TaskmindError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_user_messages() {
        let err = TaskmindError::TaskNotFound("1700000000000".to_string());
        assert!(err.user_message().contains("1700000000000"));

        let err = TaskmindError::NotApplicable(3);
        assert!(err.user_message().contains("#3"));
    }

    #[test]
    fn test_error_display() {
        let err = TaskmindError::InvalidTask("empty text".to_string());
        let display = format!("{}", err);
        assert!(display.contains("Invalid task"));
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{nope");
        let err: TaskmindError = parse.unwrap_err().into();
        assert!(matches!(err, TaskmindError::Serialization(_)));
    }
}
