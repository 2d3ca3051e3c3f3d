/*! Reclamation-scheme strategies.

Every supported scheme supplies the same small set of ingredients to
the co-analysis: its grace-period latency bound (theta), the blocking
it charges to the lead writer, which partitions its reclaimer competes
on, the lower bound of the grace-period search, and the latency until
the reclaimer observes the last contributing writer. The co-analysis
loop itself is scheme-agnostic.
*/

use auto_impl::auto_impl;

use crate::context::AnalysisContext;
use crate::model::{CoreId, TaskSystem};
use crate::overhead::Primitive;
use crate::quiescence::Quiescence;
use crate::time::Duration;

/// The scheme-specific ingredients of the co-analysis.
#[auto_impl(&, Box, Rc)]
pub trait SmrScheme {
    /// The read-side primitive charged to every read section.
    fn read_primitive(&self) -> Primitive;

    /// The primitive measuring one quiescence-detection pass.
    fn quiescence_primitive(&self) -> Primitive;

    /// Upper bound on the latency between a write completing and the
    /// reclaimer observing enough quiescence to reclaim it.
    fn theta(&self, system: &TaskSystem, ctx: &AnalysisContext, q: &Quiescence) -> Duration;

    /// Worst-case blocking the reclaimer imposes on the lead writer
    /// of a contended partition.
    fn block(&self, system: &TaskSystem, ctx: &AnalysisContext) -> Duration;

    /// Does the reclaimer compete with tasks on this partition?
    fn competes_on(&self, partition: CoreId, q: &Quiescence) -> bool;

    /// The smallest sensible grace period (zero when no writer
    /// exists), and for single-core variants the partition whose
    /// writer drives quiescence detection.
    fn min_quiescence(&self, system: &TaskSystem) -> (Duration, Option<CoreId>);

    /// Worst-case latency until the reclaimer observes the completion
    /// of the last contributing writer; extends the window of the
    /// deferred-memory bound.
    fn reclaimer_latency(
        &self,
        system: &TaskSystem,
        ctx: &AnalysisContext,
        q: &Quiescence,
    ) -> Duration;
}

/// Worst write-path response time over all writers, on any partition.
pub(crate) fn max_writer_response(system: &TaskSystem, ctx: &AnalysisContext) -> Duration {
    system
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_writer())
        .map(|(i, _)| ctx[i].response_time)
        .max()
        .unwrap_or(0)
}

/// Worst read-section response time over all tasks.
pub(crate) fn max_read_response(system: &TaskSystem, ctx: &AnalysisContext) -> Duration {
    (0..system.len())
        .map(|i| ctx[i].read_response_time)
        .max()
        .unwrap_or(0)
}

/// Worst response time among the per-partition lead writers,
/// optionally restricted to a single partition.
pub(crate) fn lead_writer_response(
    system: &TaskSystem,
    ctx: &AnalysisContext,
    only: Option<CoreId>,
) -> Duration {
    system
        .partitions()
        .iter()
        .filter(|(core, _)| only.map_or(true, |c| c == *core))
        .filter_map(|(_, part)| system.highest_priority_writer(part))
        .map(|w| ctx[w].response_time)
        .max()
        .unwrap_or(0)
}

/// The longest period among the per-partition lead writers, zero when
/// no writer exists anywhere.
pub(crate) fn max_lead_writer_period(system: &TaskSystem) -> Duration {
    system
        .partitions()
        .iter()
        .filter_map(|(_, part)| system.highest_priority_writer(part))
        .map(|w| system[w].period)
        .max()
        .unwrap_or(0)
}

/// The lead writer of the lowest-numbered partition that has one.
pub(crate) fn first_lead_writer(system: &TaskSystem) -> Option<(Duration, CoreId)> {
    system
        .partitions()
        .iter()
        .find_map(|(core, part)| {
            system
                .highest_priority_writer(part)
                .map(|w| (system[w].period, *core))
        })
}

mod epoch;
mod timestamp;
mod urcu;

pub use epoch::Epoch;
pub use timestamp::Timestamp;
pub use urcu::Urcu;
