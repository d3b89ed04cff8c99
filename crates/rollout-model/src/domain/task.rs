use serde::{Deserialize, Serialize};

use crate::{JobIteration, NodeId, Slot, TaskId, TaskState};

/// One observed attempt to run one unit of a service.
///
/// The orchestrator never mutates a task into a new attempt: a restart shows up as a
/// different task sharing the same slot (or node) with a new `id`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Orchestrator-assigned identifier.
    pub id: TaskId,
    /// Replica position (replicated modes only).
    #[serde(default)]
    pub slot: Slot,
    /// Node the task is or was scheduled to; empty while unassigned.
    #[serde(default)]
    pub node_id: NodeId,
    /// State the orchestrator wants the task to reach.
    pub desired_state: TaskState,
    /// State the task was last observed in.
    pub state: TaskState,
    /// Failure description, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
    /// Job run this task belongs to (job modes only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_iteration: Option<JobIteration>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, desired_state: TaskState, state: TaskState) -> Self {
        Self {
            id: id.into(),
            desired_state,
            state,
            ..Default::default()
        }
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_node(mut self, node_id: impl Into<NodeId>) -> Self {
        self.node_id = node_id.into();
        self
    }

    pub fn with_err(mut self, err: impl Into<String>) -> Self {
        self.err = Some(err.into());
        self
    }

    pub fn with_job_iteration(mut self, iteration: JobIteration) -> Self {
        self.job_iteration = Some(iteration);
        self
    }

    /// Error text, treating an empty string as no error.
    pub fn error(&self) -> Option<&str> {
        self.err.as_deref().filter(|e| !e.is_empty())
    }

    /// Both desired and observed states are recognised.
    pub fn has_known_states(&self) -> bool {
        self.desired_state.is_known() && self.state.is_known()
    }
}
