use serde::{Deserialize, Serialize};

/// Failure reported by a task handler for one attempt.
/// ---
/// `fatal` marks the task as permanently failed regardless of how many
/// attempts remain; non-fatal failures are retried with backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerError {
    pub message: String,
    pub fatal: bool,
}

impl HandlerError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: false,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fatal: true,
        }
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for HandlerError {}
