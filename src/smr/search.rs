/*! Search for the shortest schedulable grace period.

Longer grace periods mean fewer detection passes and less reclaimer
interference, but more deferred memory per grace period; shorter ones
reclaim eagerly but are harder to schedule. Binary search exploits
schedulability being monotonic in the period; the linear variant makes
no such assumption and is the fallback for schemes where monotonicity
cannot be argued.
*/

use super::{memory, smr_schedulable, AnalysisError};
use crate::context::AnalysisContext;
use crate::model::TaskSystem;
use crate::oracle::BlockingOracle;
use crate::quiescence::Quiescence;
use crate::scheme::SmrScheme;
use crate::time::Duration;

/// Result of a grace-period search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub schedulable: bool,
    /// Worst-case deferred-object count at the chosen period; zero if
    /// nothing was schedulable.
    pub worst_case_memory: u64,
    /// The chosen grace period (for an unschedulable outcome: the
    /// last candidate probed).
    pub period: Duration,
}

/// Bisect `[min_q, max_q]` for the shortest schedulable grace period.
///
/// Requires schedulability to be monotonic in the period over the
/// probed range; callers must establish that `max_q` itself is
/// schedulable beforehand. The co-analysis is re-run once at the
/// chosen period so the reported memory bound reflects that period's
/// converged response times.
pub fn binary_search<S, O>(
    system: &TaskSystem,
    q: &mut Quiescence,
    scheme: &S,
    oracle: &O,
    min_q: Duration,
    max_q: Duration,
) -> Result<SearchOutcome, AnalysisError>
where
    S: SmrScheme + ?Sized,
    O: BlockingOracle + ?Sized,
{
    if min_q == 0 || min_q > max_q {
        return Err(AnalysisError::InvalidSearchBounds { min_q, max_q });
    }
    let (mut lo, mut hi) = (min_q, max_q);
    while lo < hi {
        let candidate = (lo + hi) / 2;
        q.period = candidate;
        let mut ctx = AnalysisContext::new(system);
        if smr_schedulable(system, &mut ctx, q, scheme, oracle)? {
            hi = candidate;
        } else {
            lo = candidate + 1;
        }
    }

    q.period = hi;
    let mut ctx = AnalysisContext::new(system);
    let schedulable = smr_schedulable(system, &mut ctx, q, scheme, oracle)?;
    let worst_case_memory = if schedulable {
        memory::worst_case_memory(system, &ctx, scheme, q)
    } else {
        0
    };
    Ok(SearchOutcome {
        schedulable,
        worst_case_memory,
        period: hi,
    })
}

/// Probe candidate periods `min_q, 2 min_q, ...` up to `max_q` and
/// stop at the first schedulable one. No monotonicity assumption.
pub fn linear_search<S, O>(
    system: &TaskSystem,
    q: &mut Quiescence,
    scheme: &S,
    oracle: &O,
    min_q: Duration,
    max_q: Duration,
) -> Result<SearchOutcome, AnalysisError>
where
    S: SmrScheme + ?Sized,
    O: BlockingOracle + ?Sized,
{
    if min_q == 0 || min_q > max_q {
        return Err(AnalysisError::InvalidSearchBounds { min_q, max_q });
    }
    let mut candidate = min_q;
    while candidate <= max_q {
        q.period = candidate;
        let mut ctx = AnalysisContext::new(system);
        if smr_schedulable(system, &mut ctx, q, scheme, oracle)? {
            return Ok(SearchOutcome {
                schedulable: true,
                worst_case_memory: memory::worst_case_memory(system, &ctx, scheme, q),
                period: candidate,
            });
        }
        candidate += min_q;
    }
    Ok(SearchOutcome {
        schedulable: false,
        worst_case_memory: 0,
        period: candidate,
    })
}
