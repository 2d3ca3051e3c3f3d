use super::{
    lead_writer_response, max_lead_writer_period, max_read_response, max_writer_response,
    SmrScheme,
};
use crate::context::AnalysisContext;
use crate::model::{CoreId, TaskSystem};
use crate::overhead::Primitive;
use crate::quiescence::Quiescence;
use crate::time::Duration;

/// Timestamp-published reclamation: readers publish the time at which
/// they entered their section and the reclaimer frees everything
/// older than the minimum published timestamp. The grace-period
/// geometry matches the epoch scheme's; only the read-side and
/// detection costs differ.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timestamp;

impl SmrScheme for Timestamp {
    fn read_primitive(&self) -> Primitive {
        Primitive::TimeRead
    }

    fn quiescence_primitive(&self) -> Primitive {
        Primitive::TimeQuiescence
    }

    fn theta(&self, system: &TaskSystem, ctx: &AnalysisContext, q: &Quiescence) -> Duration {
        max_writer_response(system, ctx) + max_read_response(system, ctx) + q.period
    }

    fn block(&self, _system: &TaskSystem, _ctx: &AnalysisContext) -> Duration {
        0
    }

    fn competes_on(&self, _partition: CoreId, _q: &Quiescence) -> bool {
        true
    }

    fn min_quiescence(&self, system: &TaskSystem) -> (Duration, Option<CoreId>) {
        (max_lead_writer_period(system), None)
    }

    fn reclaimer_latency(
        &self,
        system: &TaskSystem,
        ctx: &AnalysisContext,
        _q: &Quiescence,
    ) -> Duration {
        lead_writer_response(system, ctx, None)
    }
}
