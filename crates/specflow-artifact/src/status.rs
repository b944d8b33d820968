//! Unit-of-work lifecycle status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by jobs and both grading passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Created or reset, outputs empty or stale
    #[default]
    New,
    /// An execution is in flight
    Running,
    /// Last execution finished successfully
    Completed,
    /// Last execution aborted on a gateway failure
    Failed,
}

impl Status {
    /// Whether this is a terminal state of a run
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }

    /// Whether a run is recorded as in flight
    #[inline]
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, Status::Running)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::New => "new",
            Status::Running => "running",
            Status::Completed => "completed",
            Status::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Running).unwrap(), "\"running\"");
        let s: Status = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(s, Status::Failed);
    }

    #[test]
    fn terminal_states() {
        assert!(Status::Completed.is_terminal());
        assert!(Status::Failed.is_terminal());
        assert!(!Status::Running.is_terminal());
        assert!(!Status::New.is_terminal());
    }
}
