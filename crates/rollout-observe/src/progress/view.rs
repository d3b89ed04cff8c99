use rollout_core::{
    monitor::{ROLLBACK, VERIFY},
    updater::{ACTIVE_TASKS, JOB_PROGRESS, OVERALL_PROGRESS},
};
use rollout_model::ProgressEvent;

/// What a progress line stands for, judged from its id and payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKind {
    /// Stability window and final convergence messages.
    Verify,
    /// Rollback notices from the orchestrator.
    Rollback,
    /// Counters over the whole service.
    Aggregate,
    /// Per-unit state bar.
    Bar,
    /// Per-unit error text replacing the bar.
    TaskError,
    /// Blank line reserving a unit position.
    Placeholder,
    /// Lines without an id, such as the cancellation hint.
    Notice,
}

impl ProgressKind {
    pub fn of(event: &ProgressEvent) -> Self {
        match event.id.as_str() {
            VERIFY => ProgressKind::Verify,
            ROLLBACK => ProgressKind::Rollback,
            OVERALL_PROGRESS | JOB_PROGRESS | ACTIVE_TASKS => ProgressKind::Aggregate,
            "" => ProgressKind::Notice,
            _ if event.has_bar() => ProgressKind::Bar,
            _ if event.action.trim().is_empty() => ProgressKind::Placeholder,
            _ => ProgressKind::TaskError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressKind::Verify => "verify",
            ProgressKind::Rollback => "rollback",
            ProgressKind::Aggregate => "aggregate",
            ProgressKind::Bar => "bar",
            ProgressKind::TaskError => "task-error",
            ProgressKind::Placeholder => "placeholder",
            ProgressKind::Notice => "notice",
        }
    }
}
