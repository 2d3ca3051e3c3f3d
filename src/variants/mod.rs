/*! Per-discipline analysis drivers.

These are thin compositions of the overhead model, the blocking
oracle, the co-analysis, and the grace-period search. Each driver
deep-copies the task system it is handed, so the same system can be
analyzed under several disciplines (or concurrently) without aliasing
any mutable state.
*/

use crate::context::AnalysisContext;
use crate::model::TaskSystem;
use crate::oracle::BlockingOracle;
use crate::overhead::{self, AnalysisParams, OverheadTable};
use crate::quiescence::Quiescence;
use crate::scheme::SmrScheme;
use crate::smr::{
    self, fp_schedulable, fp_schedulable_with_quiescence, search, smr_schedulable, AnalysisError,
    Side, MAX_ITERATIONS,
};
use crate::time::Duration;

/// How the grace-period search proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Bisection; requires schedulability to be monotonic in the
    /// grace period.
    Binary,
    /// Step through multiples of the minimum period; no monotonicity
    /// assumption.
    Linear,
}

/// Verdict of an SMR analysis: the schedulability decision, the
/// worst-case deferred-object count, and, when a search ran and
/// succeeded, the chosen grace period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmrOutcome {
    pub schedulable: bool,
    pub worst_case_memory: u64,
    pub period: Option<Duration>,
}

impl SmrOutcome {
    fn unschedulable() -> Self {
        SmrOutcome {
            schedulable: false,
            worst_case_memory: 0,
            period: None,
        }
    }
}

/// Baseline: no shared resources, no reclaimer; plain partitioned
/// fixed-priority schedulability.
pub fn no_locking_schedulable(system: &TaskSystem) -> bool {
    let mut ctx = AnalysisContext::new(system);
    fp_schedulable(system, &mut ctx)
}

// The oracle/response-time iteration shared by all lock-based
// disciplines: re-apply the blocking bounds until response times
// stop moving, guarding the monotonic-growth argument.
fn lock_aware<O>(system: &TaskSystem, oracle: &O) -> Result<bool, AnalysisError>
where
    O: BlockingOracle + ?Sized,
{
    let mut ctx = AnalysisContext::new(system);
    let mut iterations = 0;
    while !ctx.write_side_consistent() {
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
        oracle.apply(system, &mut ctx);
        if !fp_schedulable(system, &mut ctx) {
            return Ok(false);
        }
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            return Err(AnalysisError::IterationLimitExceeded {
                limit: MAX_ITERATIONS,
            });
        }
    }
    Ok(true)
}

/// Spin-lock discipline: charge lock acquisition to every section,
/// then iterate the caller's blocking bounds to a fixed point.
pub fn spinlock_schedulable<O>(
    system: &TaskSystem,
    table: &OverheadTable,
    params: &AnalysisParams,
    oracle: &O,
) -> Result<bool, AnalysisError>
where
    O: BlockingOracle + ?Sized,
{
    let mut ts = system.clone();
    ts.sort_by_period();
    overhead::charge_spinlock(table, &mut ts, params)?;
    lock_aware(&ts, oracle)
}

/// Phase-fair reader-writer lock discipline.
pub fn phase_fair_schedulable<O>(
    system: &TaskSystem,
    table: &OverheadTable,
    params: &AnalysisParams,
    oracle: &O,
) -> Result<bool, AnalysisError>
where
    O: BlockingOracle + ?Sized,
{
    let mut ts = system.clone();
    ts.sort_by_period();
    overhead::charge_phase_fair(table, &mut ts, params)?;
    lock_aware(&ts, oracle)
}

fn prepare<S>(
    system: &TaskSystem,
    table: &OverheadTable,
    params: &AnalysisParams,
    scheme: &S,
) -> Result<(TaskSystem, Quiescence), AnalysisError>
where
    S: SmrScheme + ?Sized,
{
    let mut ts = system.clone();
    ts.sort_by_period();
    overhead::charge_smr(table, &mut ts, params, scheme.read_primitive())?;
    let q = Quiescence::from_table(table, scheme.quiescence_primitive(), params)?;
    Ok((ts, q))
}

/// Full SMR analysis: charge the scheme's overheads, search for the
/// shortest schedulable grace period, and bound the deferred memory
/// at that period.
///
/// Degenerate case: a system without writers needs no reclamation at
/// all, so a single schedulability check with a latency bound of zero
/// decides the verdict and the memory bound is zero.
pub fn smr_analysis<S, O>(
    system: &TaskSystem,
    table: &OverheadTable,
    params: &AnalysisParams,
    scheme: &S,
    oracle: &O,
    strategy: SearchStrategy,
) -> Result<SmrOutcome, AnalysisError>
where
    S: SmrScheme + ?Sized,
    O: BlockingOracle + ?Sized,
{
    let (ts, mut q) = prepare(system, table, params, scheme)?;
    let max_q = ts.max_period();
    let (min_q, core) = scheme.min_quiescence(&ts);
    q.core = core;
    q.period = max_q;

    if min_q == 0 {
        let mut ctx = AnalysisContext::new(&ts);
        let schedulable = fp_schedulable_with_quiescence(&ts, &mut ctx, &mut q, scheme, 0, 0);
        return Ok(SmrOutcome {
            schedulable,
            worst_case_memory: 0,
            period: None,
        });
    }

    let outcome = match strategy {
        SearchStrategy::Binary => {
            // Establish the monotonic search's precondition: the
            // longest candidate period must itself be schedulable.
            let mut ctx = AnalysisContext::new(&ts);
            if !smr_schedulable(&ts, &mut ctx, &mut q, scheme, oracle)? {
                return Ok(SmrOutcome::unschedulable());
            }
            search::binary_search(&ts, &mut q, scheme, oracle, min_q, max_q)?
        }
        SearchStrategy::Linear => {
            search::linear_search(&ts, &mut q, scheme, oracle, min_q, max_q)?
        }
    };

    Ok(SmrOutcome {
        schedulable: outcome.schedulable,
        worst_case_memory: outcome.worst_case_memory,
        period: outcome.schedulable.then_some(outcome.period),
    })
}

/// SMR analysis at one externally chosen grace period: no search,
/// just the co-analysis verdict and the memory bound at that period.
pub fn smr_analysis_with_period<S, O>(
    system: &TaskSystem,
    table: &OverheadTable,
    params: &AnalysisParams,
    scheme: &S,
    oracle: &O,
    period: Duration,
) -> Result<SmrOutcome, AnalysisError>
where
    S: SmrScheme + ?Sized,
    O: BlockingOracle + ?Sized,
{
    let (ts, mut q) = prepare(system, table, params, scheme)?;
    q.core = scheme.min_quiescence(&ts).1;
    q.period = period;
    let mut ctx = AnalysisContext::new(&ts);
    let schedulable = smr_schedulable(&ts, &mut ctx, &mut q, scheme, oracle)?;
    let worst_case_memory = if schedulable {
        smr::memory::worst_case_memory(&ts, &ctx, scheme, &q)
    } else {
        0
    };
    Ok(SmrOutcome {
        schedulable,
        worst_case_memory,
        period: Some(period),
    })
}
