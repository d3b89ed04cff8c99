mod task_state;
pub use task_state::TaskState;

mod task;
pub use task::Task;

mod service;
pub use service::{Service, ServiceMode, UpdateState, UpdateStatus};

mod progress;
pub use progress::ProgressEvent;

/// Opaque task identifier assigned by the orchestrator.
pub type TaskId = String;

/// Identifier of a cluster node.
pub type NodeId = String;

/// Replica position of a task inside a replicated service.
///
/// Replacement tasks reuse the slot of the task they supersede.
pub type Slot = u64;

/// Counter distinguishing successive runs of a job-mode service.
pub type JobIteration = u64;
