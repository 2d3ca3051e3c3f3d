/*! The seam to an external blocking-bound analysis.

Locking-protocol blocking bounds (task-fair mutexes, phase-fair
reader-writer locks, LP-based bounds, ...) are computed outside this
crate. The co-analysis only requires that whatever computes them
honors one contract: blocking charges are non-decreasing in contention
and identical across repeated calls on the same input state. A
violation of that contract surfaces as a
[MonotonicityViolation][crate::smr::AnalysisError::MonotonicityViolation].
*/

use auto_impl::auto_impl;

use crate::context::AnalysisContext;
use crate::model::TaskSystem;

/// Assigns each task's worst-case blocking under some locking
/// discipline.
#[auto_impl(&, Box, Rc)]
pub trait BlockingOracle {
    /// Repopulate the `blocked` charge of every task. Oracles that
    /// model busy-waiting may additionally re-inflate the working
    /// `cost`; it has been reset to the uninflated cost before this
    /// call.
    fn apply(&self, system: &TaskSystem, ctx: &mut AnalysisContext);
}

/// The trivial oracle: nothing ever blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBlocking;

impl BlockingOracle for NoBlocking {
    fn apply(&self, system: &TaskSystem, ctx: &mut AnalysisContext) {
        for i in 0..system.len() {
            ctx[i].blocked = 0;
        }
    }
}

/// Adapter for closure-based oracles, mainly useful in tests and for
/// bridging to external solvers.
pub struct FnOracle<F>(F);

impl<F> FnOracle<F>
where
    F: Fn(&TaskSystem, &mut AnalysisContext),
{
    pub fn new(f: F) -> Self {
        FnOracle(f)
    }
}

impl<F> BlockingOracle for FnOracle<F>
where
    F: Fn(&TaskSystem, &mut AnalysisContext),
{
    fn apply(&self, system: &TaskSystem, ctx: &mut AnalysisContext) {
        (self.0)(system, ctx)
    }
}
