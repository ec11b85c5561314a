use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

// It is used by strum to convert the enum to a string
// but the compiler complains that it is unused
#[allow(unused_imports)]
use std::str::FromStr;

#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Cancelled,
    Failed,
    Pending,
    Complete,
    Paused,
    Running,
}

impl TaskStatus {
    /// Terminal tasks are never picked up again by the scheduler.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Cancelled)
    }

    pub fn is_runnable(self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Aggregate state of a task's dependency set.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DependStatus {
    /// At least one dependency failed or was cancelled.
    Failed,
    /// The task has no dependencies.
    None,
    /// Every dependency completed.
    Clear,
    /// Some dependency has not reached a terminal state yet.
    Wait,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        let s = "PENDING";
        let status = TaskStatus::from_str(s).unwrap();
        assert_eq!(status, TaskStatus::Pending);
    }

    #[test]
    fn test_to_string() {
        assert_eq!(TaskStatus::Cancelled.to_string(), "CANCELLED");
        assert_eq!(DependStatus::Clear.to_string(), "CLEAR");
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskStatus::Complete.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Paused.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }

    #[test]
    fn test_runnable_states() {
        assert!(TaskStatus::Pending.is_runnable());
        assert!(!TaskStatus::Running.is_runnable());
        assert!(!TaskStatus::Paused.is_runnable());
    }
}
