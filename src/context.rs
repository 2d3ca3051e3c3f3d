/*! Per-analysis mutable state.

Every analysis owns one [AnalysisContext], indexed by task position in
the [TaskSystem][crate::model::TaskSystem]. Keeping the scratch fields
out of the task model means a task system can be shared read-only while
each analysis mutates its own context.
*/

use std::ops::{Index, IndexMut};

use crate::model::TaskSystem;
use crate::time::{Duration, Service};

/// Response-time bookkeeping for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskState {
    /// Working execution cost; reset to `uninflated_cost` before each
    /// co-analysis pass so the blocking oracle can re-inflate it.
    pub cost: Service,
    /// The cost as charged by the overhead model, before any
    /// per-iteration inflation.
    pub uninflated_cost: Service,
    /// Blocking charge assigned by the external blocking-bound oracle.
    pub blocked: Duration,
    /// Extra blocking attributable to the reclaimer, charged to the
    /// highest-priority writer of a contended partition.
    pub q_blocked: Duration,
    /// Current write-side response-time bound.
    pub response_time: Duration,
    /// The previous iteration's bound, for convergence and
    /// monotonicity checks.
    pub response_old: Duration,
    /// Current read-section response-time bound; non-zero only for
    /// tasks that issue read requests.
    pub read_response_time: Duration,
    /// Previous iteration's read-side bound.
    pub read_response_old: Duration,
}

/// The mutable counterpart of a task system during one analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisContext {
    states: Vec<TaskState>,
}

impl AnalysisContext {
    /// Fresh per-task state: response times start at the task's cost
    /// (read side: at its longest read section), nothing blocked yet.
    pub fn new(system: &TaskSystem) -> Self {
        let states = system
            .iter()
            .map(|t| TaskState {
                cost: t.cost,
                uninflated_cost: t.cost,
                blocked: 0,
                q_blocked: 0,
                response_time: t.cost,
                response_old: 0,
                read_response_time: t.max_read_length(),
                read_response_old: 0,
            })
            .collect();
        AnalysisContext { states }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[TaskState] {
        &self.states
    }

    /// Have all write-side response times stopped changing?
    pub fn write_side_consistent(&self) -> bool {
        self.states
            .iter()
            .all(|s| s.response_time == s.response_old)
    }

    /// Have all read-side response times stopped changing?
    pub fn read_side_consistent(&self) -> bool {
        self.states
            .iter()
            .all(|s| s.read_response_time == s.read_response_old)
    }
}

impl Index<usize> for AnalysisContext {
    type Output = TaskState;

    fn index(&self, index: usize) -> &TaskState {
        &self.states[index]
    }
}

impl IndexMut<usize> for AnalysisContext {
    fn index_mut(&mut self, index: usize) -> &mut TaskState {
        &mut self.states[index]
    }
}
