//! Fixed lookup data derived from the task state order.

use std::sync::OnceLock;

use rollout_model::TaskState;

/// Bar length for service tasks: every non-terminal state.
pub const MAX_PROGRESS: i64 = TaskState::Running.rank();

/// Bar length for job tasks: non-terminal states plus `Complete`.
pub const MAX_JOB_PROGRESS: i64 = TaskState::Complete.rank();

/// Above this many units only aggregate lines are emitted.
pub const MAX_PROGRESS_BARS: usize = 20;

/// Maximum width of an error line, in characters.
pub const MAX_ERROR_LEN: usize = 75;

static LONGEST_STATE: OnceLock<usize> = OnceLock::new();

/// Width of the longest state name a progress bar can show.
pub fn longest_state_name() -> usize {
    *LONGEST_STATE.get_or_init(|| {
        TaskState::ALL
            .into_iter()
            .filter(|state| !state.is_terminal() || *state == TaskState::Complete)
            .map(|state| state.as_str().len())
            .max()
            .unwrap_or(0)
    })
}

/// Bar position for a state.
///
/// During a rollback the bar runs backwards from `Running`.
pub fn progress(state: TaskState, rollback: bool) -> i64 {
    if rollback {
        TaskState::Running.rank() - state.rank()
    } else {
        state.rank()
    }
}

/// State name left-aligned to [`longest_state_name`].
pub fn state_action(state: TaskState) -> String {
    format!("{:<width$}", state, width = longest_state_name())
}

/// Flattens an error onto one line and caps it at [`MAX_ERROR_LEN`] characters.
pub fn trunc_error(err: &str) -> String {
    let flat = err.replace('\n', " ");
    if flat.chars().count() > MAX_ERROR_LEN {
        let mut out: String = flat.chars().take(MAX_ERROR_LEN - 1).collect();
        out.push('…');
        out
    } else {
        flat
    }
}

/// Number of decimal digits needed to print `n`.
pub fn digits(n: u64) -> usize {
    n.to_string().len()
}
