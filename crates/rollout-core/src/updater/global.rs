use std::collections::HashSet;

use rollout_model::{NodeId, ProgressEvent, Task, TaskState};
use tracing::trace;

use super::{
    OVERALL_PROGRESS, is_running, node_label, service_task_progress, write_overall_progress,
};
use crate::{
    output::ProgressOutput,
    reconcile::{DisplayIndex, Reconciler},
};

/// Tracks a global service until every node carrying a task runs it.
///
/// The set of eligible nodes is not known up front. The orchestrator creates the
/// tasks for all of them at once, so the nodes seen among up-to-date tasks stand in
/// for it.
#[derive(Debug)]
pub struct GlobalUpdater {
    nodes: DisplayIndex<NodeId>,
    max_bars: usize,
    initialized: bool,
    done: bool,
}

impl GlobalUpdater {
    pub fn new(max_bars: usize) -> Self {
        Self {
            nodes: DisplayIndex::new(),
            max_bars,
            initialized: false,
            done: false,
        }
    }

    pub fn update(
        &mut self,
        tasks: &[Task],
        active_nodes: &HashSet<NodeId>,
        rollback: bool,
        out: &mut dyn ProgressOutput,
    ) -> bool {
        let by_node = Reconciler::service()
            .with_active_nodes(active_nodes)
            .by_node(tasks);
        let node_count = by_node.len() as u64;

        if !self.initialized {
            if node_count == 0 {
                // Tasks are not created yet, or no node satisfies the constraints.
                out.write_progress(ProgressEvent::line(OVERALL_PROGRESS, "waiting for new tasks"));
                return false;
            }
            write_overall_progress(out, 0, node_count, rollback);
            self.initialized = true;
        }

        if self.done && by_node.values().any(|task| task.state != TaskState::Running) {
            trace!("global service left converged state");
            self.done = false;
        }

        let show_bars = node_count <= self.max_bars as u64;
        let mut running = 0u64;
        let mut lines = Vec::new();
        for (node_id, task) in by_node {
            let position = self.nodes.position(node_id.to_string());
            if is_running(task) {
                running += 1;
            }
            if self.done || !show_bars {
                continue;
            }
            if let Some(event) = service_task_progress(task, node_label(node_id), rollback) {
                lines.push((position, event));
            }
        }
        lines.sort_by_key(|(position, _)| *position);
        for (_, event) in lines {
            out.write_progress(event);
        }

        if !self.done {
            write_overall_progress(out, running, node_count, rollback);
            if running == node_count {
                self.done = true;
            }
        }
        running == node_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollout_model::TaskState::*;

    fn active(ids: &[&str]) -> HashSet<NodeId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn tick(
        u: &mut GlobalUpdater,
        tasks: &[Task],
        nodes: &HashSet<NodeId>,
    ) -> (bool, Vec<ProgressEvent>) {
        let mut out: Vec<ProgressEvent> = Vec::new();
        let converged = u.update(tasks, nodes, false, &mut out);
        (converged, out)
    }

    #[test]
    fn waits_for_tasks() {
        let mut u = GlobalUpdater::new(20);
        let nodes = active(&["n1", "n2", "n3"]);

        let (converged, out) = tick(&mut u, &[], &nodes);
        assert!(!converged);
        assert_eq!(out, vec![ProgressEvent::line(OVERALL_PROGRESS, "waiting for new tasks")]);

        // Still waiting on the next tick.
        let (converged, out) = tick(&mut u, &[], &nodes);
        assert!(!converged);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn converges_when_all_nodes_run() {
        let mut u = GlobalUpdater::new(20);
        let nodes = active(&["n1", "n2"]);
        let starting = [
            Task::new("a", Running, Starting).with_node("n1"),
            Task::new("b", Running, Pending).with_node("n2"),
        ];
        let (converged, out) = tick(&mut u, &starting, &nodes);
        assert!(!converged);
        assert_eq!(out[0].action, "0 out of 2 tasks");
        let ids: Vec<_> = out.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["overall progress", "n1", "n2", "overall progress"]);

        let running = [
            Task::new("a", Running, Running).with_node("n1"),
            Task::new("b", Running, Running).with_node("n2"),
        ];
        let (converged, out) = tick(&mut u, &running, &nodes);
        assert!(converged);
        assert_eq!(out.last().unwrap().action, "2 out of 2 tasks");

        let (converged, out) = tick(&mut u, &running, &nodes);
        assert!(converged);
        assert!(out.is_empty());
    }

    #[test]
    fn departed_nodes_do_not_count() {
        let mut u = GlobalUpdater::new(20);
        let nodes = active(&["n1"]);
        let tasks = [
            Task::new("a", Running, Running).with_node("n1"),
            Task::new("b", Running, Pending).with_node("n2"),
        ];
        let (converged, out) = tick(&mut u, &tasks, &nodes);
        assert!(converged);
        assert_eq!(out.last().unwrap().action, "1 out of 1 tasks");
    }

    #[test]
    fn regression_clears_done() {
        let mut u = GlobalUpdater::new(20);
        let nodes = active(&["n1"]);
        tick(&mut u, &[Task::new("a", Running, Running).with_node("n1")], &nodes);

        let restarted = [
            Task::new("a", Shutdown, Failed).with_node("n1").with_err("exit 1"),
            Task::new("b", Running, Assigned).with_node("n1"),
        ];
        let (converged, out) = tick(&mut u, &restarted, &nodes);
        assert!(!converged);
        assert_eq!(out[0].id, "n1");
        assert_eq!(out[0].action, "assigned ");
        assert_eq!(out[1].action, "0 out of 1 tasks");
    }

    #[test]
    fn many_nodes_only_report_aggregates() {
        let mut u = GlobalUpdater::new(2);
        let nodes = active(&["n1", "n2", "n3"]);
        let tasks = [
            Task::new("a", Running, Running).with_node("n1"),
            Task::new("b", Running, Starting).with_node("n2"),
            Task::new("c", Running, Rejected).with_node("n3").with_err("no suitable node"),
        ];
        let (converged, out) = tick(&mut u, &tasks, &nodes);
        assert!(!converged);
        assert!(out.iter().all(|e| e.id == OVERALL_PROGRESS));
        assert_eq!(out.last().unwrap().action, "1 out of 3 tasks");
    }

    #[test]
    fn long_node_ids_are_shortened() {
        let mut u = GlobalUpdater::new(20);
        let id = "4lv0r3v2nqy7z0yzm1jyvuv6a";
        let nodes = active(&[id]);
        let (_, out) = tick(&mut u, &[Task::new("a", Running, New).with_node(id)], &nodes);
        assert_eq!(out[1].id, "4lv0r3v2nqy7");
    }
}
