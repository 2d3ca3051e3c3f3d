/*! Bounds on grace-period memory: how many deferred objects can pile
up before the reclaimer catches up. */

use crate::context::AnalysisContext;
use crate::model::TaskSystem;
use crate::quiescence::Quiescence;
use crate::scheme::SmrScheme;
use crate::time::{divide_with_ceil, Duration};

/// Number of objects that can be deferred over a window of the given
/// length: every writer contributes one write epoch per job that can
/// overlap the window, each deferring `per_epoch` objects.
pub fn deferred_objects(
    system: &TaskSystem,
    ctx: &AnalysisContext,
    window: Duration,
    per_epoch: u64,
) -> u64 {
    let epochs: u64 = system
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_writer())
        .map(|(i, t)| divide_with_ceil(window + ctx[i].response_time, t.period))
        .sum();
    per_epoch * epochs
}

/// Worst-case deferred-object count for a converged analysis: the
/// window spans theta plus the latency until the reclaimer observes
/// the last contributing writer's completion.
pub fn worst_case_memory<S>(
    system: &TaskSystem,
    ctx: &AnalysisContext,
    scheme: &S,
    q: &Quiescence,
) -> u64
where
    S: SmrScheme + ?Sized,
{
    let window = scheme.theta(system, ctx, q) + scheme.reclaimer_latency(system, ctx, q);
    deferred_objects(system, ctx, window, q.num_mem)
}
