//! Per-mode progress updaters.
//!
//! Each tick an updater receives the freshly fetched snapshot, writes per-unit lines
//! (in display order) followed by the aggregate lines, and reports whether the
//! service has converged.

use std::collections::HashSet;

use rollout_model::{NodeId, ProgressEvent, Service, ServiceMode, Task, TaskState};

use crate::{
    error::MonitorError,
    output::ProgressOutput,
    rank::{MAX_JOB_PROGRESS, MAX_PROGRESS, progress, state_action, trunc_error},
};

mod global;
pub use global::GlobalUpdater;

mod global_job;
pub use global_job::GlobalJobUpdater;

mod replicated;
pub use replicated::ReplicatedUpdater;

mod replicated_job;
pub use replicated_job::ReplicatedJobUpdater;

/// Line id of the aggregate for long-running services.
pub const OVERALL_PROGRESS: &str = "overall progress";
/// Line id of the completion aggregate for jobs.
pub const JOB_PROGRESS: &str = "job progress";
/// Line id of the active-task aggregate for replicated jobs.
pub const ACTIVE_TASKS: &str = "active tasks";

/// Progress updater selected from the service mode on the first tick.
#[derive(Debug)]
pub enum Updater {
    Replicated(ReplicatedUpdater),
    Global(GlobalUpdater),
    ReplicatedJob(ReplicatedJobUpdater),
    GlobalJob(GlobalJobUpdater),
}

impl Updater {
    /// Build the updater matching `service.mode`.
    ///
    /// `max_bars` caps the number of units that get their own line.
    pub fn for_service(service: &Service, max_bars: usize) -> Result<Self, MonitorError> {
        let updater = match service.mode {
            ServiceMode::Replicated { replicas: Some(_) } => {
                Updater::Replicated(ReplicatedUpdater::new(max_bars))
            }
            ServiceMode::Replicated { replicas: None } => return Err(MonitorError::NoReplicaCount),
            ServiceMode::Global => Updater::Global(GlobalUpdater::new(max_bars)),
            ServiceMode::ReplicatedJob {
                max_concurrent,
                total_completions,
            } => Updater::ReplicatedJob(ReplicatedJobUpdater::new(
                service.current_iteration(),
                max_concurrent,
                total_completions,
                max_bars,
            )),
            ServiceMode::GlobalJob => {
                Updater::GlobalJob(GlobalJobUpdater::new(service.current_iteration(), max_bars))
            }
        };
        Ok(updater)
    }

    /// Mode name this updater was built for.
    pub fn kind(&self) -> &'static str {
        match self {
            Updater::Replicated(_) => "replicated",
            Updater::Global(_) => "global",
            Updater::ReplicatedJob(_) => "replicated-job",
            Updater::GlobalJob(_) => "global-job",
        }
    }

    /// Returns `true` if this updater can track a service in `mode`.
    pub fn matches(&self, mode: &ServiceMode) -> bool {
        matches!(
            (self, mode),
            (Updater::Replicated(_), ServiceMode::Replicated { .. })
                | (Updater::Global(_), ServiceMode::Global)
                | (Updater::ReplicatedJob(_), ServiceMode::ReplicatedJob { .. })
                | (Updater::GlobalJob(_), ServiceMode::GlobalJob)
        )
    }

    /// Process one tick and return whether the service has converged.
    pub fn update(
        &mut self,
        service: &Service,
        tasks: &[Task],
        active_nodes: &HashSet<NodeId>,
        rollback: bool,
        out: &mut dyn ProgressOutput,
    ) -> Result<bool, MonitorError> {
        match self {
            Updater::Replicated(u) => u.update(service, tasks, active_nodes, rollback, out),
            Updater::Global(u) => Ok(u.update(tasks, active_nodes, rollback, out)),
            Updater::ReplicatedJob(u) => Ok(u.update(tasks, out)),
            Updater::GlobalJob(u) => Ok(u.update(tasks, active_nodes, out)),
        }
    }
}

fn write_overall_progress(out: &mut dyn ProgressOutput, running: u64, desired: u64, rollback: bool) {
    let action = if rollback {
        format!("rolling back update: {running} out of {desired} tasks")
    } else {
        format!("{running} out of {desired} tasks")
    };
    out.write_progress(ProgressEvent::line(OVERALL_PROGRESS, action));
}

/// Empty lines that pin the order of per-unit lines before any task is seen.
fn write_placeholders(out: &mut dyn ProgressOutput, count: u64) {
    for i in 1..=count {
        out.write_progress(ProgressEvent::line(format!("{i}/{count}"), " "));
    }
}

/// Line for a long-running service task, if it has anything to show.
///
/// Tasks that have left the non-terminal range without an error produce nothing.
fn service_task_progress(task: &Task, id: String, rollback: bool) -> Option<ProgressEvent> {
    if let Some(err) = task.error() {
        return Some(ProgressEvent::line(id, trunc_error(err)));
    }
    if task.desired_state.is_terminal() || task.state.is_terminal() {
        return None;
    }
    Some(ProgressEvent::bar(
        id,
        state_action(task.state),
        progress(task.state, rollback),
        MAX_PROGRESS,
    ))
}

/// Line for a job task; terminal states stay visible.
fn job_task_progress(task: &Task, id: String) -> ProgressEvent {
    match task.error() {
        Some(err) => ProgressEvent::line(id, trunc_error(err)),
        None => ProgressEvent::bar(
            id,
            state_action(task.state),
            task.state.rank(),
            MAX_JOB_PROGRESS,
        ),
    }
}

/// Shortened node identifier used as a line id.
fn node_label(node_id: &str) -> String {
    node_id.chars().take(12).collect()
}

fn is_running(task: &Task) -> bool {
    !task.desired_state.is_terminal() && task.state == TaskState::Running
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollout_model::TaskState::*;

    #[test]
    fn selects_updater_by_mode() {
        let svc = Service::new("s", ServiceMode::Replicated { replicas: Some(2) });
        let u = Updater::for_service(&svc, 20).unwrap();
        assert_eq!(u.kind(), "replicated");
        assert!(u.matches(&ServiceMode::Replicated { replicas: Some(9) }));
        assert!(!u.matches(&ServiceMode::Global));

        let svc = Service::new("s", ServiceMode::GlobalJob);
        assert_eq!(Updater::for_service(&svc, 20).unwrap().kind(), "global-job");
    }

    #[test]
    fn replicated_without_count_is_rejected() {
        let svc = Service::new("s", ServiceMode::Replicated { replicas: None });
        assert!(matches!(
            Updater::for_service(&svc, 20),
            Err(MonitorError::NoReplicaCount)
        ));
    }

    #[test]
    fn service_task_line_variants() {
        let bar = service_task_progress(&Task::new("t", Running, Assigned), "1/1".into(), false)
            .unwrap();
        assert_eq!((bar.current, bar.total), (4, MAX_PROGRESS));
        assert_eq!(bar.action, "assigned ");

        let err = service_task_progress(
            &Task::new("t", Running, Failed).with_err("oom\nkilled"),
            "1/1".into(),
            false,
        )
        .unwrap();
        assert_eq!(err.action, "oom killed");
        assert!(!err.has_bar());

        assert!(service_task_progress(&Task::new("t", Shutdown, Running), "1/1".into(), false).is_none());
    }

    #[test]
    fn job_task_line_keeps_complete() {
        let ev = job_task_progress(&Task::new("t", Complete, Complete), "1/3".into());
        assert_eq!((ev.current, ev.total), (10, MAX_JOB_PROGRESS));
    }

    #[test]
    fn node_label_truncates() {
        assert_eq!(node_label("abcdefghijklmnopqrstuvwxyz"), "abcdefghijkl");
        assert_eq!(node_label("short"), "short");
    }
}
