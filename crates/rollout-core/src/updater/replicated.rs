use std::collections::HashSet;

use rollout_model::{NodeId, Service, ServiceMode, Slot, Task, TaskState};
use tracing::trace;

use super::{is_running, service_task_progress, write_overall_progress, write_placeholders};
use crate::{
    error::MonitorError,
    output::ProgressOutput,
    reconcile::{DisplayIndex, Reconciler},
};

/// Tracks a replicated service until `replicas` tasks are running.
#[derive(Debug)]
pub struct ReplicatedUpdater {
    /// Maps raw slot numbers onto contiguous display positions.
    slots: DisplayIndex<Slot>,
    max_bars: usize,
    initialized: bool,
    done: bool,
}

impl ReplicatedUpdater {
    pub fn new(max_bars: usize) -> Self {
        Self {
            slots: DisplayIndex::new(),
            max_bars,
            initialized: false,
            done: false,
        }
    }

    pub fn update(
        &mut self,
        service: &Service,
        tasks: &[Task],
        active_nodes: &HashSet<NodeId>,
        rollback: bool,
        out: &mut dyn ProgressOutput,
    ) -> Result<bool, MonitorError> {
        let ServiceMode::Replicated {
            replicas: Some(replicas),
        } = service.mode
        else {
            return Err(MonitorError::NoReplicaCount);
        };
        let show_bars = replicas <= self.max_bars as u64;

        if !self.initialized {
            write_overall_progress(out, 0, replicas, rollback);
            if show_bars {
                write_placeholders(out, replicas);
            }
            self.initialized = true;
        }

        let by_slot = Reconciler::service()
            .with_active_nodes(active_nodes)
            .by_slot(tasks);

        if self.done && by_slot.values().any(|task| task.state != TaskState::Running) {
            trace!("replicated service left converged state");
            self.done = false;
        }

        let mut running = 0u64;
        let mut lines = Vec::new();
        for (slot, task) in by_slot {
            let position = self.slots.position(slot);
            if is_running(task) {
                running += 1;
            }
            if self.done || !show_bars || position as u64 > replicas {
                continue;
            }
            let id = format!("{position}/{replicas}");
            if let Some(event) = service_task_progress(task, id, rollback) {
                lines.push((position, event));
            }
        }
        lines.sort_by_key(|(position, _)| *position);
        for (_, event) in lines {
            out.write_progress(event);
        }

        // Surplus slots can outlive a scale-down for a tick or two.
        let running = running.min(replicas);
        if !self.done {
            write_overall_progress(out, running, replicas, rollback);
            if running == replicas {
                self.done = true;
            }
        }
        Ok(running == replicas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollout_model::{ProgressEvent, TaskState::*};

    fn service(replicas: u64) -> Service {
        Service::new("web", ServiceMode::Replicated {
            replicas: Some(replicas),
        })
    }

    fn tick(
        u: &mut ReplicatedUpdater,
        svc: &Service,
        tasks: &[Task],
    ) -> (bool, Vec<ProgressEvent>) {
        let mut out: Vec<ProgressEvent> = Vec::new();
        let converged = u.update(svc, tasks, &HashSet::new(), false, &mut out).unwrap();
        (converged, out)
    }

    #[test]
    fn single_replica_scenario() {
        let svc = service(1);
        let mut u = ReplicatedUpdater::new(20);

        let (converged, out) = tick(&mut u, &svc, &[]);
        assert!(!converged);
        assert_eq!(out[0].id, "overall progress");
        assert_eq!(out[0].action, "0 out of 1 tasks");
        assert_eq!(out[1].id, "1/1");
        assert_eq!(out.last().unwrap().action, "0 out of 1 tasks");

        let (converged, out) = tick(&mut u, &svc, &[Task::new("t1", Running, New)]);
        assert!(!converged);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "1/1");
        assert_eq!((out[0].current, out[0].total), (1, 9));
        assert_eq!(out[1].action, "0 out of 1 tasks");

        let (converged, out) = tick(&mut u, &svc, &[Task::new("t1", Running, Running)]);
        assert!(converged);
        assert_eq!(out.last().unwrap().action, "1 out of 1 tasks");
    }

    #[test]
    fn done_suppresses_output_until_regression() {
        let svc = service(2);
        let mut u = ReplicatedUpdater::new(20);
        let healthy = [
            Task::new("a", Running, Running).with_slot(1),
            Task::new("b", Running, Running).with_slot(2),
        ];
        tick(&mut u, &svc, &[]);
        let (converged, _) = tick(&mut u, &svc, &healthy);
        assert!(converged);

        let (converged, out) = tick(&mut u, &svc, &healthy);
        assert!(converged);
        assert!(out.is_empty());

        let degraded = [
            Task::new("a", Running, Running).with_slot(1),
            Task::new("c", Running, Starting).with_slot(2),
        ];
        let (converged, out) = tick(&mut u, &svc, &degraded);
        assert!(!converged);
        let ids: Vec<_> = out.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1/2", "2/2", "overall progress"]);
        assert_eq!(out[1].action, "starting ");
        assert_eq!(out[2].action, "1 out of 2 tasks");
    }

    #[test]
    fn display_positions_follow_first_sight() {
        let svc = service(3);
        let mut u = ReplicatedUpdater::new(20);
        tick(&mut u, &svc, &[]);

        let (_, out) = tick(&mut u, &svc, &[Task::new("x", Running, Pending).with_slot(42)]);
        assert_eq!(out[0].id, "1/3");

        let tasks = [
            Task::new("y", Running, Pending).with_slot(7),
            Task::new("x2", Running, New).with_slot(42),
        ];
        let (_, out) = tick(&mut u, &svc, &tasks);
        let ids: Vec<_> = out.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1/3", "2/3", "overall progress"]);
        // slot 42 keeps position 1 after its task was replaced
        assert_eq!(out[0].current, 1);
    }

    #[test]
    fn large_services_only_report_aggregates() {
        let svc = service(25);
        let mut u = ReplicatedUpdater::new(20);
        let tasks: Vec<_> = (1..=25)
            .map(|slot| Task::new(format!("t{slot}"), Running, Running).with_slot(slot))
            .collect();

        let (_, first) = tick(&mut u, &svc, &[]);
        assert!(first.iter().all(|e| e.id == "overall progress"));

        let (converged, out) = tick(&mut u, &svc, &tasks);
        assert!(converged);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].action, "25 out of 25 tasks");
    }

    #[test]
    fn rollback_reports_direction() {
        let svc = service(1);
        let mut u = ReplicatedUpdater::new(20);
        let mut out: Vec<ProgressEvent> = Vec::new();
        u.update(&svc, &[Task::new("t", Running, New)], &HashSet::new(), true, &mut out)
            .unwrap();
        let bar = out.iter().find(|e| e.id == "1/1" && e.has_bar()).unwrap();
        assert_eq!(bar.current, 8);
        assert_eq!(
            out.last().unwrap().action,
            "rolling back update: 0 out of 1 tasks"
        );
    }

    #[test]
    fn running_never_exceeds_replicas() {
        let svc = service(1);
        let mut u = ReplicatedUpdater::new(20);
        let tasks = [
            Task::new("a", Running, Running).with_slot(1),
            Task::new("b", Running, Running).with_slot(2),
        ];
        let (converged, out) = tick(&mut u, &svc, &tasks);
        assert!(converged);
        assert_eq!(out.last().unwrap().action, "1 out of 1 tasks");
    }

    #[test]
    fn errors_replace_bars() {
        let svc = service(1);
        let mut u = ReplicatedUpdater::new(20);
        let failing = [Task::new("t", Running, Rejected).with_err("no suitable node")];
        let (converged, out) = tick(&mut u, &svc, &failing);
        assert!(!converged);
        let line = out.iter().rev().find(|e| e.id == "1/1").unwrap();
        assert_eq!(line.action, "no suitable node");
        assert!(!line.has_bar());
    }

    #[test]
    fn same_snapshot_twice_repeats_events() {
        let svc = service(2);
        let mut u = ReplicatedUpdater::new(20);
        tick(&mut u, &svc, &[]);
        let tasks = [
            Task::new("a", Running, Starting).with_slot(1),
            Task::new("b", Running, Pending).with_slot(2),
        ];
        let (_, first) = tick(&mut u, &svc, &tasks);
        let (_, second) = tick(&mut u, &svc, &tasks);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_replica_count_fails() {
        let svc = Service::new("web", ServiceMode::Replicated { replicas: None });
        let mut u = ReplicatedUpdater::new(20);
        let mut out: Vec<ProgressEvent> = Vec::new();
        let res = u.update(&svc, &[], &HashSet::new(), false, &mut out);
        assert!(matches!(res, Err(MonitorError::NoReplicaCount)));
    }
}
