/*! The schedulability co-analysis.

Write-side response times, read-side response times, the grace-period
latency bound theta, and the oracle-assigned blocking charges all feed
back into one another. [smr_schedulable] searches for their common
fixed point: an inner loop stabilizes the write side (re-applying the
blocking oracle each pass), a second inner loop stabilizes the read
side, and the outer loop repeats both until theta and the reclaimer
blocking computed from the stable state match the values that seeded
the iteration.

Termination rests on response times never decreasing between passes
for a fixed configuration: demands only grow with theta and blocking,
both of which are non-decreasing by contract. A decrease therefore
indicates a defect in the oracle or the scheme's bound functions and
aborts the analysis with [AnalysisError::MonotonicityViolation]
instead of being reported as a (wrong) schedulability verdict.
*/

pub mod memory;
pub mod search;

use derive_more::Display;
use thiserror::Error;

use crate::context::AnalysisContext;
use crate::fixed_point::{quiescence_aware_read_rta, quiescence_aware_rta};
use crate::model::TaskSystem;
use crate::oracle::BlockingOracle;
use crate::overhead::OverheadError;
use crate::quiescence::Quiescence;
use crate::scheme::SmrScheme;
use crate::time::Duration;

/// Hard cap on co-analysis iterations. Response times are bounded by
/// deadlines and strictly increase until they stabilize, so hitting
/// this cap means the convergence argument has been violated.
pub const MAX_ITERATIONS: usize = 4096;

/// Which response-time bookkeeping a defect was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Side {
    #[display(fmt = "write")]
    Write,
    #[display(fmt = "read")]
    Read,
}

/// Defects and precondition violations of the co-analysis. An
/// unschedulable task set is never an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// A response time shrank between iterations, violating the
    /// contract that makes the fixed-point iteration terminate.
    #[error("{side}-side response time of task {task} decreased from {previous} to {current}")]
    MonotonicityViolation {
        task: usize,
        side: Side,
        previous: Duration,
        current: Duration,
    },
    /// The co-analysis failed to stabilize within [MAX_ITERATIONS].
    #[error("co-analysis did not stabilize within {limit} iterations")]
    IterationLimitExceeded { limit: usize },
    /// The grace-period search was started with inconsistent bounds.
    #[error("invalid quiescence-period search bounds [{min_q}, {max_q}]")]
    InvalidSearchBounds { min_q: Duration, max_q: Duration },
    /// The overhead table could not supply a required cost.
    #[error(transparent)]
    Overhead(#[from] OverheadError),
}

fn count_iteration(iterations: &mut usize) -> Result<(), AnalysisError> {
    *iterations += 1;
    if *iterations > MAX_ITERATIONS {
        Err(AnalysisError::IterationLimitExceeded {
            limit: MAX_ITERATIONS,
        })
    } else {
        Ok(())
    }
}

/// Plain partitioned fixed-priority schedulability: no reclaimer, no
/// blocking beyond what is already recorded in the context.
pub fn fp_schedulable(system: &TaskSystem, ctx: &mut AnalysisContext) -> bool {
    let inert = Quiescence::default();
    for (_, partition) in system.partitions() {
        for pos in 0..partition.len() {
            if !quiescence_aware_rta(system, ctx, &partition, pos, &inert, 0) {
                return false;
            }
        }
    }
    true
}

/// Write-side schedulability under a reclaimer with the given latency
/// bound. Per partition, the reclaimer's synthetic priority becomes
/// the lead writer's period wherever the scheme's reclaimer competes,
/// and that writer is charged `q_block` of reclaimer blocking.
pub fn fp_schedulable_with_quiescence<S>(
    system: &TaskSystem,
    ctx: &mut AnalysisContext,
    q: &mut Quiescence,
    scheme: &S,
    theta: Duration,
    q_block: Duration,
) -> bool
where
    S: SmrScheme + ?Sized,
{
    for (core, partition) in system.partitions() {
        match system.highest_priority_writer(&partition) {
            Some(w) if scheme.competes_on(core, q) => {
                q.priority = Some(system[w].period);
                ctx[w].q_blocked = q_block;
            }
            _ => q.priority = None,
        }
        for pos in 0..partition.len() {
            if !quiescence_aware_rta(system, ctx, &partition, pos, q, theta) {
                return false;
            }
        }
    }
    true
}

/// Read-side schedulability under a reclaimer with the given latency
/// bound. Same priority assignment as the write side, but no blocking
/// is charged and ties go to the tasks.
pub fn fp_read_schedulable_with_quiescence<S>(
    system: &TaskSystem,
    ctx: &mut AnalysisContext,
    q: &mut Quiescence,
    scheme: &S,
    theta: Duration,
) -> bool
where
    S: SmrScheme + ?Sized,
{
    for (core, partition) in system.partitions() {
        match system.highest_priority_writer(&partition) {
            Some(w) if scheme.competes_on(core, q) => {
                q.priority = Some(system[w].period);
            }
            _ => q.priority = None,
        }
        for pos in 0..partition.len() {
            if !quiescence_aware_read_rta(system, ctx, &partition, pos, q, theta) {
                return false;
            }
        }
    }
    true
}

/// The co-analysis proper: `Ok(true)` if the task set is schedulable
/// under the scheme with the grace period currently set in `q`,
/// `Ok(false)` if not. On success the context holds the converged
/// response times, ready for the deferred-memory bound.
///
/// The context is taken as-is; callers start a fresh analysis by
/// passing a fresh [AnalysisContext]. Re-running on an already
/// converged context is a no-op that reports the same verdict.
pub fn smr_schedulable<S, O>(
    system: &TaskSystem,
    ctx: &mut AnalysisContext,
    q: &mut Quiescence,
    scheme: &S,
    oracle: &O,
) -> Result<bool, AnalysisError>
where
    S: SmrScheme + ?Sized,
    O: BlockingOracle + ?Sized,
{
    let mut iterations = 0;
    loop {
        let seed_theta = scheme.theta(system, ctx, q);
        let seed_block = scheme.block(system, ctx);

        // Stabilize the write side.
        loop {
            for i in 0..system.len() {
                ctx[i].cost = ctx[i].uninflated_cost;
                if ctx[i].response_time < ctx[i].response_old {
                    return Err(AnalysisError::MonotonicityViolation {
                        task: i,
                        side: Side::Write,
                        previous: ctx[i].response_old,
                        current: ctx[i].response_time,
                    });
                }
                ctx[i].response_old = ctx[i].response_time;
            }
            let theta = scheme.theta(system, ctx, q);
            let block = scheme.block(system, ctx);
            oracle.apply(system, ctx);
            if !fp_schedulable_with_quiescence(system, ctx, q, scheme, theta, block) {
                return Ok(false);
            }
            if ctx.write_side_consistent() {
                break;
            }
            count_iteration(&mut iterations)?;
        }

        // Stabilize the read side.
        loop {
            for i in 0..system.len() {
                if ctx[i].read_response_time < ctx[i].read_response_old {
                    return Err(AnalysisError::MonotonicityViolation {
                        task: i,
                        side: Side::Read,
                        previous: ctx[i].read_response_old,
                        current: ctx[i].read_response_time,
                    });
                }
                ctx[i].read_response_old = ctx[i].read_response_time;
            }
            let theta = scheme.theta(system, ctx, q);
            if !fp_read_schedulable_with_quiescence(system, ctx, q, scheme, theta) {
                return Ok(false);
            }
            if ctx.read_side_consistent() {
                break;
            }
            count_iteration(&mut iterations)?;
        }

        debug_assert!(ctx.write_side_consistent() && ctx.read_side_consistent());

        // Both sides are stable; accept only if the bounds they imply
        // are the ones this iteration was computed under.
        if seed_theta == scheme.theta(system, ctx, q) && seed_block == scheme.block(system, ctx) {
            return Ok(true);
        }
        count_iteration(&mut iterations)?;
    }
}

#[cfg(test)]
mod tests;
