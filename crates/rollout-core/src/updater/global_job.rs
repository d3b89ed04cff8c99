use std::collections::{BTreeSet, HashSet};

use rollout_model::{JobIteration, NodeId, ProgressEvent, Task, TaskState};
use tracing::{debug, warn};

use super::{JOB_PROGRESS, job_task_progress, node_label};
use crate::{
    output::ProgressOutput,
    rank::digits,
    reconcile::{DisplayIndex, Reconciler},
};

/// Tracks a global job until the task on every initial node has completed.
///
/// A global job also runs on nodes that join later. Only the nodes carrying a task
/// on the first tick are followed.
#[derive(Debug)]
pub struct GlobalJobUpdater {
    iteration: JobIteration,
    task_nodes: BTreeSet<NodeId>,
    positions: DisplayIndex<NodeId>,
    total: u64,
    progress_digits: usize,
    max_bars: usize,
    initialized: bool,
}

impl GlobalJobUpdater {
    pub fn new(iteration: JobIteration, max_bars: usize) -> Self {
        Self {
            iteration,
            task_nodes: BTreeSet::new(),
            positions: DisplayIndex::new(),
            total: 0,
            progress_digits: 1,
            max_bars,
            initialized: false,
        }
    }

    pub fn update(
        &mut self,
        tasks: &[Task],
        active_nodes: &HashSet<NodeId>,
        out: &mut dyn ProgressOutput,
    ) -> bool {
        if !self.initialized {
            if tasks.is_empty() && !active_nodes.is_empty() {
                out.write_progress(ProgressEvent::line(JOB_PROGRESS, "waiting for tasks"));
                return false;
            }

            // All tasks of a global job are created together.
            self.task_nodes = tasks
                .iter()
                .filter(|task| task.job_iteration == Some(self.iteration))
                .filter(|task| !task.node_id.is_empty())
                .map(|task| task.node_id.clone())
                .collect();
            self.total = self.task_nodes.len() as u64;
            self.progress_digits = digits(self.total);
            if self.task_nodes.is_empty() && !tasks.is_empty() {
                warn!(
                    iteration = self.iteration,
                    tasks = tasks.len(),
                    "no placed task belongs to the current job iteration; nothing to wait for"
                );
            } else {
                debug!(nodes = self.total, "global job node set captured");
            }

            self.write_overall_progress(out, 0);
            self.initialized = true;
        }

        let by_node = Reconciler::job(self.iteration)
            .with_active_nodes(active_nodes)
            .within(&self.task_nodes)
            .by_node(tasks);

        let show_bars = self.total <= self.max_bars as u64;
        let mut complete = 0u64;
        let mut lines = Vec::new();
        for (node_id, task) in by_node {
            let position = self.positions.position(node_id.to_string());
            if task.state == TaskState::Complete {
                complete += 1;
            }
            if show_bars {
                lines.push((position, job_task_progress(task, node_label(node_id))));
            }
        }
        lines.sort_by_key(|(position, _)| *position);
        for (_, event) in lines {
            out.write_progress(event);
        }

        self.write_overall_progress(out, complete);
        complete == self.total
    }

    fn write_overall_progress(&self, out: &mut dyn ProgressOutput, complete: u64) {
        // Every task of a global job is active at once; only completion is shown.
        out.write_progress(ProgressEvent::line(
            JOB_PROGRESS,
            format!(
                "{complete:>width$} out of {} complete",
                self.total,
                width = self.progress_digits
            ),
        ));
    }
}
