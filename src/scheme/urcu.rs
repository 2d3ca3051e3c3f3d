use super::{first_lead_writer, lead_writer_response, max_read_response, max_writer_response, SmrScheme};
use crate::context::AnalysisContext;
use crate::model::{CoreId, TaskSystem};
use crate::overhead::Primitive;
use crate::quiescence::Quiescence;
use crate::time::Duration;

/// Userspace-RCU-style reclamation with a single grace-period
/// detector. Detection is driven by one designated partition's
/// writer, so only that partition sees the reclaimer as a competing
/// activity, but the detector must wait out the slowest read section
/// anywhere in the system, which shows up as blocking on the lead
/// writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Urcu;

impl SmrScheme for Urcu {
    fn read_primitive(&self) -> Primitive {
        Primitive::RcuRead
    }

    fn quiescence_primitive(&self) -> Primitive {
        Primitive::RcuQuiescence
    }

    fn theta(&self, system: &TaskSystem, ctx: &AnalysisContext, q: &Quiescence) -> Duration {
        max_writer_response(system, ctx) + q.period
    }

    fn block(&self, system: &TaskSystem, ctx: &AnalysisContext) -> Duration {
        max_read_response(system, ctx)
    }

    fn competes_on(&self, partition: CoreId, q: &Quiescence) -> bool {
        q.core == Some(partition)
    }

    fn min_quiescence(&self, system: &TaskSystem) -> (Duration, Option<CoreId>) {
        match first_lead_writer(system) {
            Some((period, core)) => (period, Some(core)),
            None => (0, None),
        }
    }

    fn reclaimer_latency(
        &self,
        system: &TaskSystem,
        ctx: &AnalysisContext,
        q: &Quiescence,
    ) -> Duration {
        lead_writer_response(system, ctx, q.core)
    }
}
