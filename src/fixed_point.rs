/*! Quiescence-aware busy-period recurrences.

The write-side and read-side solvers share one iteration scheme: seed
the busy window with the cumulative higher-priority cost plus the
task's own demand, then repeatedly fold the window's interference back
into the demand until a fixed point is reached. A window that grows
past the task's deadline means the task is unschedulable in the
current environment, which is a normal negative verdict rather than an
error.

Both solvers account for the reclaimer as one more interfering
activity whenever the task's period does not beat the reclaimer's
synthetic priority: one detection pass per grace period, plus the cost
of freeing every object that can be deferred by the end of the window.
The two sides deliberately disagree on how a priority tie is resolved:
the write side yields to the reclaimer on equal periods, the read side
does not.
*/

use crate::context::AnalysisContext;
use crate::model::TaskSystem;
use crate::quiescence::Quiescence;
use crate::smr::memory::deferred_objects;
use crate::time::{divide_with_ceil, Duration, Service};

// The recurrence core shared by both sides. Returns the fixed point,
// or the first window length past the deadline if none exists.
fn busy_period(
    system: &TaskSystem,
    ctx: &AnalysisContext,
    higher_prio: &[usize],
    deadline: Duration,
    own_demand: Service,
    reclaimer_competes: bool,
    q: &Quiescence,
    theta: Duration,
) -> (bool, Duration) {
    let mut delta: Duration =
        higher_prio.iter().map(|&j| ctx[j].cost).sum::<Service>() + own_demand;
    while delta <= deadline {
        let mut demand = own_demand;
        for &j in higher_prio {
            demand += ctx[j].cost * divide_with_ceil(delta, system[j].period);
        }
        if reclaimer_competes {
            demand += q.arpha_cost * divide_with_ceil(delta, q.period);
            demand += deferred_objects(system, ctx, theta + delta, q.num_mem) * q.beta_cost;
        }
        if demand == delta {
            return (true, delta);
        }
        delta = demand;
    }
    (false, delta)
}

/// Write-side response time of the task at position `pos` of
/// `partition` (tasks in priority order). Stores the resulting bound
/// in the context, converged or not, and reports convergence.
pub fn quiescence_aware_rta(
    system: &TaskSystem,
    ctx: &mut AnalysisContext,
    partition: &[usize],
    pos: usize,
    q: &Quiescence,
    theta: Duration,
) -> bool {
    let idx = partition[pos];
    let own_demand = ctx[idx].cost + ctx[idx].blocked + ctx[idx].q_blocked;
    let competes = matches!(q.priority, Some(p) if system[idx].period >= p);
    let (converged, delta) = busy_period(
        system,
        ctx,
        &partition[..pos],
        system[idx].deadline,
        own_demand,
        competes,
        q,
        theta,
    );
    ctx[idx].response_time = delta;
    converged
}

/// Read-side counterpart: the demand is the task's longest read
/// section, and a priority tie with the reclaimer is resolved in the
/// task's favor (strict comparison). Tasks without read requests
/// converge trivially.
pub fn quiescence_aware_read_rta(
    system: &TaskSystem,
    ctx: &mut AnalysisContext,
    partition: &[usize],
    pos: usize,
    q: &Quiescence,
    theta: Duration,
) -> bool {
    let idx = partition[pos];
    let own_demand = system[idx].max_read_length();
    if own_demand == 0 {
        return true;
    }
    let competes = matches!(q.priority, Some(p) if system[idx].period > p);
    let (converged, delta) = busy_period(
        system,
        ctx,
        &partition[..pos],
        system[idx].deadline,
        own_demand,
        competes,
        q,
        theta,
    );
    ctx[idx].read_response_time = delta;
    converged
}
