/*! Schedulability and grace-period memory co-analysis for partitioned
fixed-priority real-time systems whose tasks share data through a
safe-memory-reclamation (SMR) scheme.

The crate answers two coupled questions about a given task system,
reclamation scheme, and locking discipline: does every task meet its
deadline once the reclaimer's interference and the scheme's
grace-period latency are accounted for, and how many
reclamation-deferred objects can accumulate before the reclaimer
catches up?

The moving parts:

- [model] describes tasks, their shared-resource request profiles,
  and partitioned task systems; [context] holds all per-analysis
  mutable state.
- [overhead] turns measured primitive costs into per-task execution
  cost.
- [fixed_point] solves the quiescence-aware response-time recurrences.
- [scheme] captures what is specific to each reclamation scheme
  (epoch-based, userspace RCU, timestamp-based).
- [oracle] is the seam to an external locking blocking-bound analysis.
- [smr] runs the co-analysis loop, bounds deferred memory, and
  searches for the shortest schedulable grace period.
- [variants] wires everything together, one driver per
  synchronization discipline.
*/

pub mod context;
pub mod fixed_point;
pub mod model;
pub mod oracle;
pub mod overhead;
pub mod quiescence;
pub mod scheme;
pub mod smr;
pub mod time;
pub mod variants;
