/*! The task model: sporadic tasks, their shared-resource request
profiles, and partitioned task systems.

Tasks are static descriptions only. All mutable per-analysis state
(response times, blocking charges, working costs) lives in an
[AnalysisContext][crate::context::AnalysisContext] so that concurrent
analyses never alias each other's scratch fields.
*/

use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

use derive_more::{Display, From, Into};
use itertools::Itertools;

use crate::time::{Duration, Service};

/// Identifier of a shared resource.
pub type ResourceId = usize;

/// The core a task is statically assigned to under partitioned
/// fixed-priority scheduling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into, Default,
)]
#[display(fmt = "{}", _0)]
pub struct CoreId(usize);

/// Counts and maximum lengths of the read and write critical sections
/// a task issues on one shared resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestProfile {
    /// Maximum number of read sections per job.
    pub max_reads: u64,
    /// Length of the longest read section.
    pub max_read_length: Duration,
    /// Maximum number of write sections per job.
    pub max_writes: u64,
    /// Length of the longest write section.
    pub max_write_length: Duration,
}

impl RequestProfile {
    /// Record one more read section of the given length.
    pub fn add_read_request(&mut self, length: Duration) {
        self.max_reads += 1;
        self.max_read_length = self.max_read_length.max(length);
    }

    /// Record one more write section of the given length.
    pub fn add_write_request(&mut self, length: Duration) {
        self.max_writes += 1;
        self.max_write_length = self.max_write_length.max(length);
    }

    /// Does this profile describe at least one write section of
    /// positive length?
    pub fn writes(&self) -> bool {
        self.max_writes > 0 && self.max_write_length > 0
    }
}

/// A sporadic task with an implicit-or-constrained deadline, statically
/// assigned to one core. Priorities are by period: within a partition,
/// an earlier period means a higher priority, with declaration order
/// breaking ties (see [TaskSystem::sort_by_period]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Worst-case execution time, inclusive of charged overheads.
    pub cost: Service,
    /// Minimum inter-arrival separation.
    pub period: Duration,
    /// Relative deadline.
    pub deadline: Duration,
    /// The core this task runs on.
    pub partition: CoreId,
    /// Per-resource request profiles; absent entries mean the task
    /// never touches that resource.
    pub requests: BTreeMap<ResourceId, RequestProfile>,
}

impl Task {
    /// A task with an implicit deadline, assigned to core 0.
    pub fn new(cost: Service, period: Duration) -> Self {
        Task {
            cost,
            period,
            deadline: period,
            partition: CoreId(0),
            requests: BTreeMap::new(),
        }
    }

    /// Move the task to the given core.
    pub fn on(mut self, partition: impl Into<CoreId>) -> Self {
        self.partition = partition.into();
        self
    }

    /// Constrain the deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Record a read section of the given length on `resource`.
    pub fn add_read_request(&mut self, resource: ResourceId, length: Duration) {
        self.requests
            .entry(resource)
            .or_default()
            .add_read_request(length);
    }

    /// Record a write section of the given length on `resource`.
    pub fn add_write_request(&mut self, resource: ResourceId, length: Duration) {
        self.requests
            .entry(resource)
            .or_default()
            .add_write_request(length);
    }

    /// Does the task issue any write section of positive length?
    pub fn is_writer(&self) -> bool {
        self.requests.values().any(RequestProfile::writes)
    }

    /// Length of the longest read section the task issues, zero if it
    /// reads nothing.
    pub fn max_read_length(&self) -> Duration {
        self.requests
            .values()
            .filter(|r| r.max_reads > 0)
            .map(|r| r.max_read_length)
            .max()
            .unwrap_or(0)
    }

    /// Length of the longest write section the task issues, zero if it
    /// writes nothing.
    pub fn max_write_length(&self) -> Duration {
        self.requests
            .values()
            .filter(|r| r.max_writes > 0)
            .map(|r| r.max_write_length)
            .max()
            .unwrap_or(0)
    }

    /// The task's processor utilization.
    pub fn utilization(&self) -> f64 {
        self.cost as f64 / self.period as f64
    }
}

/// An ordered collection of tasks, partitionable by core.
///
/// The stored order doubles as the priority order once
/// [sort_by_period][TaskSystem::sort_by_period] has been applied;
/// all analyses index tasks by their position in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSystem {
    tasks: Vec<Task>,
}

impl TaskSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        TaskSystem { tasks }
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Task> {
        self.tasks.iter_mut()
    }

    /// Establish rate-monotonic priority order: stable sort by period,
    /// so ties keep their declaration order.
    pub fn sort_by_period(&mut self) {
        self.tasks.sort_by_key(|t| t.period);
    }

    /// The longest period in the system, zero if the system is empty.
    pub fn max_period(&self) -> Duration {
        self.tasks.iter().map(|t| t.period).max().unwrap_or(0)
    }

    /// Total utilization across all cores.
    pub fn utilization(&self) -> f64 {
        self.tasks.iter().map(Task::utilization).sum()
    }

    /// Group task indices by partition, cores in ascending order and
    /// each partition's tasks in priority order.
    pub fn partitions(&self) -> Vec<(CoreId, Vec<usize>)> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.partition, i))
            .into_group_map()
            .into_iter()
            .sorted_by_key(|(core, _)| *core)
            .collect()
    }

    /// The highest-priority writer among the given partition's tasks,
    /// if any.
    pub fn highest_priority_writer(&self, partition: &[usize]) -> Option<usize> {
        partition.iter().copied().find(|&i| self.tasks[i].is_writer())
    }
}

impl Index<usize> for TaskSystem {
    type Output = Task;

    fn index(&self, index: usize) -> &Task {
        &self.tasks[index]
    }
}

impl IndexMut<usize> for TaskSystem {
    fn index_mut(&mut self, index: usize) -> &mut Task {
        &mut self.tasks[index]
    }
}

impl FromIterator<Task> for TaskSystem {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        TaskSystem {
            tasks: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TaskSystem {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
