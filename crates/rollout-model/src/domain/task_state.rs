use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Lifecycle state of a task, as reported by the orchestrator.
///
/// Variants are declared in rank order. [`TaskState::Unknown`] stands for any
/// state name this crate does not recognise and ranks below everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    New,
    Allocated,
    Pending,
    Assigned,
    Accepted,
    Preparing,
    Ready,
    Starting,
    Running,
    Complete,
    Shutdown,
    Failed,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// Every recognised state, lowest rank first.
    pub const ALL: [TaskState; 13] = [
        TaskState::New,
        TaskState::Allocated,
        TaskState::Pending,
        TaskState::Assigned,
        TaskState::Accepted,
        TaskState::Preparing,
        TaskState::Ready,
        TaskState::Starting,
        TaskState::Running,
        TaskState::Complete,
        TaskState::Shutdown,
        TaskState::Failed,
        TaskState::Rejected,
    ];

    /// Position in the total order, starting at 1 for `New`.
    ///
    /// Returns `0` for [`TaskState::Unknown`].
    pub const fn rank(self) -> i64 {
        match self {
            TaskState::Unknown => 0,
            TaskState::New => 1,
            TaskState::Allocated => 2,
            TaskState::Pending => 3,
            TaskState::Assigned => 4,
            TaskState::Accepted => 5,
            TaskState::Preparing => 6,
            TaskState::Ready => 7,
            TaskState::Starting => 8,
            TaskState::Running => 9,
            TaskState::Complete => 10,
            TaskState::Shutdown => 11,
            TaskState::Failed => 12,
            TaskState::Rejected => 13,
        }
    }

    /// Returns `true` for states ranked above `Running`.
    pub const fn is_terminal(self) -> bool {
        self.rank() > TaskState::Running.rank()
    }

    /// Returns `false` only for [`TaskState::Unknown`].
    pub const fn is_known(self) -> bool {
        self.rank() != 0
    }

    /// Lowercase wire name of the state.
    pub const fn as_str(self) -> &'static str {
        match self {
            TaskState::New => "new",
            TaskState::Allocated => "allocated",
            TaskState::Pending => "pending",
            TaskState::Assigned => "assigned",
            TaskState::Accepted => "accepted",
            TaskState::Preparing => "preparing",
            TaskState::Ready => "ready",
            TaskState::Starting => "starting",
            TaskState::Running => "running",
            TaskState::Complete => "complete",
            TaskState::Shutdown => "shutdown",
            TaskState::Failed => "failed",
            TaskState::Rejected => "rejected",
            TaskState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `pad` keeps width/alignment flags working for progress lines.
        f.pad(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        Ok(TaskState::ALL
            .into_iter()
            .find(|state| state.as_str() == norm)
            .unwrap_or(TaskState::Unknown))
    }
}

impl Default for TaskState {
    fn default() -> Self {
        TaskState::Unknown
    }
}
