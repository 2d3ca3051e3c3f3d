/*! The grace-period parameter record of a reclamation scheme. */

use crate::model::CoreId;
use crate::overhead::{AnalysisParams, OverheadError, OverheadTable, Primitive};
use crate::time::{Duration, Service};

/// Parameters of the reclaimer's periodic quiescence detection.
///
/// One record is created per analysis and mutated in place while the
/// grace-period length and the reclaimer's competing priority are
/// retried; it must never be shared between concurrent analyses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quiescence {
    /// Grace-period length; the free variable of the period search.
    pub period: Duration,
    /// Fixed execution cost of one quiescence detection pass.
    pub arpha_cost: Service,
    /// Incremental cost per deferred object freed.
    pub beta_cost: Service,
    /// Memory allocations per write section, i.e. deferred objects
    /// per write epoch.
    pub num_mem: u64,
    /// Period of the highest-priority writer the reclaimer competes
    /// with; `None` when no such writer exists, in which case the
    /// reclaimer never preempts anyone.
    pub priority: Option<Duration>,
    /// For single-core reclamation variants: the partition whose
    /// writer drives quiescence detection.
    pub core: Option<CoreId>,
}

impl Quiescence {
    pub fn new(arpha_cost: Service, beta_cost: Service, num_mem: u64) -> Self {
        Quiescence {
            period: 0,
            arpha_cost,
            beta_cost,
            num_mem,
            priority: None,
            core: None,
        }
    }

    /// Build the record from measured overheads: the detection pass
    /// costs the scheme's quiescence primitive, each freed object one
    /// memory release. Costs are rounded up to whole time units.
    pub fn from_table(
        table: &OverheadTable,
        detection: Primitive,
        params: &AnalysisParams,
    ) -> Result<Self, OverheadError> {
        let arpha = (table.cost(detection, params.num_cores)? * params.oh_scale).ceil() as Service;
        let beta = (table.cost(Primitive::MemFree, params.num_cores)? * params.oh_scale).ceil()
            as Service;
        Ok(Quiescence::new(arpha, beta, params.num_mem))
    }
}
