use rollout_model::{JobIteration, ProgressEvent, Slot, Task, TaskState};

use super::{ACTIVE_TASKS, JOB_PROGRESS, job_task_progress, write_placeholders};
use crate::{
    output::ProgressOutput,
    rank::digits,
    reconcile::{DisplayIndex, Reconciler},
};

/// Tracks a replicated job until `total` tasks have completed.
#[derive(Debug)]
pub struct ReplicatedJobUpdater {
    slots: DisplayIndex<Slot>,
    iteration: JobIteration,
    /// Maximum number of tasks allowed to run simultaneously.
    concurrent: u64,
    /// Number of completions the job needs.
    total: u64,
    /// Padding for the completed count, fixed so the line never changes width.
    progress_digits: usize,
    /// Padding for both sides of the active count.
    active_digits: usize,
    max_bars: usize,
    initialized: bool,
}

impl ReplicatedJobUpdater {
    pub fn new(iteration: JobIteration, concurrent: u64, total: u64, max_bars: usize) -> Self {
        Self {
            slots: DisplayIndex::new(),
            iteration,
            concurrent,
            total,
            progress_digits: digits(total),
            active_digits: digits(concurrent),
            max_bars,
            initialized: false,
        }
    }

    pub fn update(&mut self, tasks: &[Task], out: &mut dyn ProgressOutput) -> bool {
        let show_bars = self.total <= self.max_bars as u64;

        if !self.initialized {
            self.write_overall_progress(out, 0, 0);
            if show_bars {
                write_placeholders(out, self.total);
            }
            self.initialized = true;
        }

        let by_slot = Reconciler::job(self.iteration).by_slot(tasks);

        let mut complete = 0u64;
        let mut active = 0u64;
        let mut lines = Vec::new();
        for (slot, task) in by_slot {
            let position = self.slots.position(slot);
            if task.state == TaskState::Complete {
                complete += 1;
            } else if task.state.rank() < TaskState::Complete.rank() {
                active += 1;
            }
            if show_bars && position as u64 <= self.total {
                let id = format!("{position}/{}", self.total);
                lines.push((position, job_task_progress(task, id)));
            }
        }
        lines.sort_by_key(|(position, _)| *position);
        for (_, event) in lines {
            out.write_progress(event);
        }

        let complete = complete.min(self.total);
        self.write_overall_progress(out, active, complete);
        complete == self.total
    }

    fn write_overall_progress(&self, out: &mut dyn ProgressOutput, active: u64, complete: u64) {
        out.write_progress(ProgressEvent::line(
            JOB_PROGRESS,
            format!(
                "{complete:>width$} out of {} complete",
                self.total,
                width = self.progress_digits
            ),
        ));

        // Fewer tasks can be active than allowed once the job nears its end.
        let desired = self.total.saturating_sub(complete).min(self.concurrent);
        out.write_progress(ProgressEvent::line(
            ACTIVE_TASKS,
            format!(
                "{active:>width$} out of {desired:>width$} tasks",
                width = self.active_digits
            ),
        ));
    }
}
