//! Reduction of raw task observations to one authoritative task per unit.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use rollout_model::{JobIteration, NodeId, Slot, Task};

/// Which states decide between two tasks competing for the same unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    /// Lower desired state first, then lower observed state.
    ///
    /// During a restart the replacement task desires `Running` while the old one
    /// desires `Shutdown`, so the replacement is tracked.
    DesiredThenObserved,
    /// Lower observed state only. Job tasks all desire the same state.
    Observed,
}

/// Filtering and deduplication rules for one tick.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    precedence: Precedence,
    iteration: Option<JobIteration>,
    active_nodes: Option<&'a HashSet<NodeId>>,
    within: Option<&'a BTreeSet<NodeId>>,
}

impl<'a> Reconciler<'a> {
    /// Rules for long-running services.
    pub fn service() -> Self {
        Self {
            precedence: Precedence::DesiredThenObserved,
            iteration: None,
            active_nodes: None,
            within: None,
        }
    }

    /// Rules for a job run; tasks of other iterations are ignored.
    pub fn job(iteration: JobIteration) -> Self {
        Self {
            precedence: Precedence::Observed,
            iteration: Some(iteration),
            active_nodes: None,
            within: None,
        }
    }

    /// Drop tasks assigned to nodes outside `nodes`.
    pub fn with_active_nodes(mut self, nodes: &'a HashSet<NodeId>) -> Self {
        self.active_nodes = Some(nodes);
        self
    }

    /// Only consider tasks placed on one of `nodes`.
    pub fn within(mut self, nodes: &'a BTreeSet<NodeId>) -> Self {
        self.within = Some(nodes);
        self
    }

    /// One task per replica slot, in slot order.
    pub fn by_slot<'t>(&self, tasks: &'t [Task]) -> BTreeMap<Slot, &'t Task> {
        self.collect(tasks.iter(), |task| task.slot)
    }

    /// One task per node, in node ID order. Unassigned tasks are skipped.
    pub fn by_node<'t>(&self, tasks: &'t [Task]) -> BTreeMap<&'t str, &'t Task> {
        self.collect(
            tasks.iter().filter(|task| !task.node_id.is_empty()),
            |task| task.node_id.as_str(),
        )
    }

    fn collect<'t, K, I, F>(&self, tasks: I, key: F) -> BTreeMap<K, &'t Task>
    where
        K: Ord,
        I: Iterator<Item = &'t Task>,
        F: Fn(&'t Task) -> K,
    {
        let mut out = BTreeMap::new();
        for task in tasks.filter(|task| self.admits(task)) {
            let current = out.entry(key(task)).or_insert(task);
            if self.supersedes(task, *current) {
                *current = task;
            }
        }
        out
    }

    fn admits(&self, task: &Task) -> bool {
        if !task.has_known_states() {
            return false;
        }
        if let Some(iteration) = self.iteration
            && task.job_iteration != Some(iteration)
        {
            return false;
        }
        if let Some(active) = self.active_nodes
            && !task.node_id.is_empty()
            && !active.contains(&task.node_id)
        {
            return false;
        }
        if let Some(within) = self.within
            && !within.contains(&task.node_id)
        {
            return false;
        }
        true
    }

    /// Ties go to `candidate`, the later observation.
    fn supersedes(&self, candidate: &Task, existing: &Task) -> bool {
        let observed = candidate.state.rank() <= existing.state.rank();
        match self.precedence {
            Precedence::Observed => observed,
            Precedence::DesiredThenObserved => {
                let (c, e) = (candidate.desired_state.rank(), existing.desired_state.rank());
                c < e || (c == e && observed)
            }
        }
    }
}

/// Stable 1-based display positions, assigned in first-seen order.
#[derive(Debug)]
pub struct DisplayIndex<K> {
    positions: HashMap<K, usize>,
}

impl<K> DisplayIndex<K>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    /// Position of `key`, assigning the next free one on first sight.
    pub fn position(&mut self, key: K) -> usize {
        let next = self.positions.len() + 1;
        *self.positions.entry(key).or_insert(next)
    }
}

impl<K> Default for DisplayIndex<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
