use super::{
    lead_writer_response, max_lead_writer_period, max_read_response, max_writer_response,
    SmrScheme,
};
use crate::context::AnalysisContext;
use crate::model::{CoreId, TaskSystem};
use crate::overhead::Primitive;
use crate::quiescence::Quiescence;
use crate::time::Duration;

/// Epoch-based reclamation: every core advances its local epoch and
/// the reclaimer frees a write's deferral once all cores have passed
/// the write's epoch. A grace period therefore ends only after the
/// slowest writer *and* the slowest reader of the whole system have
/// made progress, but the reclaimer itself never blocks anyone beyond
/// its periodic detection pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Epoch;

impl SmrScheme for Epoch {
    fn read_primitive(&self) -> Primitive {
        Primitive::EpochRead
    }

    fn quiescence_primitive(&self) -> Primitive {
        Primitive::EpochQuiescence
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
