/*! The overhead model: measured primitive costs and how they are
charged to tasks.

An [OverheadTable] maps each synchronization primitive to a
`core count -> cost` relation obtained from microbenchmarks. The
charging functions convert those measurements into additional
worst-case execution cost: for every task, each read section pays the
discipline's per-read cost and each write section its per-write cost,
and the total is rounded up to the next whole time unit.
*/

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;

use crate::model::TaskSystem;
use crate::time::Time;

/// A measured synchronization or memory-management primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    SpinLock,
    ReadLock,
    ReadUnlock,
    RcuRead,
    EpochRead,
    TimeRead,
    RcuQuiescence,
    EpochQuiescence,
    TimeQuiescence,
    MemAlloc,
    MemFree,
}

impl Primitive {
    pub const ALL: [Primitive; 11] = [
        Primitive::SpinLock,
        Primitive::ReadLock,
        Primitive::ReadUnlock,
        Primitive::RcuRead,
        Primitive::EpochRead,
        Primitive::TimeRead,
        Primitive::RcuQuiescence,
        Primitive::EpochQuiescence,
        Primitive::TimeQuiescence,
        Primitive::MemAlloc,
        Primitive::MemFree,
    ];

    /// The column label under which this primitive's measurements
    /// appear in an overhead table.
    pub fn column(self) -> &'static str {
        match self {
            Primitive::SpinLock => "SPIN-LOCK",
            Primitive::ReadLock => "READ-LOCK",
            Primitive::ReadUnlock => "READ-UNLOCK",
            Primitive::RcuRead => "RCU-READ",
            Primitive::EpochRead => "EPOCH-READ",
            Primitive::TimeRead => "TIME-READ",
            Primitive::RcuQuiescence => "RCU-QUI",
            Primitive::EpochQuiescence => "EPOCH-QUI",
            Primitive::TimeQuiescence => "TIME-QUI",
            Primitive::MemAlloc => "MEM-ALLOC",
            Primitive::MemFree => "MEM-FREE",
        }
    }

    fn from_column(label: &str) -> Option<Primitive> {
        Primitive::ALL.into_iter().find(|p| p.column() == label)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Errors while loading or querying an overhead table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OverheadError {
    /// The mandatory `CORE-COUNT` column is absent.
    #[error("overhead table lacks the CORE-COUNT column")]
    MissingCoreCountColumn,
    /// A primitive was measured, but not for the requested core count.
    #[error("no {primitive} measurement for {cores} cores")]
    UnknownCoreCount { primitive: Primitive, cores: usize },
    /// The table text could not be parsed.
    #[error("malformed overhead table: {0}")]
    MalformedTable(String),
}

/// Per-primitive cost tables indexed by core count.
///
/// Parsed from comma-separated text with one header row of column
/// labels and one row per measured core count. Columns that do not
/// name a known primitive are ignored; primitives without a column
/// cost nothing.
#[derive(Debug, Clone, Default)]
pub struct OverheadTable {
    costs: HashMap<Primitive, BTreeMap<usize, f64>>,
}

impl OverheadTable {
    /// A table in which every primitive is free; useful for analyses
    /// that deliberately ignore overheads.
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, OverheadError> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));
        let header = lines
            .next()
            .ok_or_else(|| OverheadError::MalformedTable("no header row".to_string()))?;
        let labels: Vec<&str> = header.split(',').map(str::trim).collect();
        let core_column = labels
            .iter()
            .position(|l| *l == "CORE-COUNT")
            .ok_or(OverheadError::MissingCoreCountColumn)?;

        let mut costs: HashMap<Primitive, BTreeMap<usize, f64>> = HashMap::new();
        for line in lines {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != labels.len() {
                return Err(OverheadError::MalformedTable(format!(
                    "row has {} fields, header has {}",
                    fields.len(),
                    labels.len()
                )));
            }
            let cores = fields[core_column]
                .parse::<f64>()
                .map_err(|_| {
                    OverheadError::MalformedTable(format!(
                        "bad core count {:?}",
                        fields[core_column]
                    ))
                })? as usize;
            for (label, field) in labels.iter().zip(&fields) {
                let primitive = match Primitive::from_column(label) {
                    Some(p) => p,
                    None => continue,
                };
                let value = field.parse::<f64>().map_err(|_| {
                    OverheadError::MalformedTable(format!("bad value {:?} for {}", field, label))
                })?;
                costs.entry(primitive).or_default().insert(cores, value);
            }
        }
        Ok(OverheadTable { costs })
    }

    /// The measured cost of `primitive` at `cores`. Unmeasured
    /// primitives are free; a measured primitive without a row for
    /// the requested core count is an error.
    pub fn cost(&self, primitive: Primitive, cores: usize) -> Result<f64, OverheadError> {
        match self.costs.get(&primitive) {
            None => Ok(0.0),
            Some(by_cores) => by_cores
                .get(&cores)
                .copied()
                .ok_or(OverheadError::UnknownCoreCount { primitive, cores }),
        }
    }
}

/// Engine-relevant knobs of an analysis run: the platform size, the
/// number of memory allocations per write section, and a scale factor
/// applied to all charged overheads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    pub num_cores: usize,
    pub num_mem: u64,
    pub oh_scale: f64,
}

impl AnalysisParams {
    pub fn new(num_cores: usize, num_mem: u64) -> Self {
        AnalysisParams {
            num_cores,
            num_mem,
            oh_scale: 1.0,
        }
    }

    pub fn with_scale(mut self, oh_scale: f64) -> Self {
        self.oh_scale = oh_scale;
        self
    }
}

// Inflate each task's cost by its request counts times the
// per-request charges, rounding the per-task total up once.
fn charge(system: &mut TaskSystem, read_cost: f64, write_cost: f64) {
    for task in system.iter_mut() {
        let mut extra = 0.0;
        for req in task.requests.values() {
            extra += req.max_reads as f64 * read_cost;
            extra += req.max_writes as f64 * write_cost;
        }
        task.cost += extra.ceil() as Time;
    }
}

/// Charge spin-lock entry/exit to every critical section.
pub fn charge_spinlock(
    table: &OverheadTable,
    system: &mut TaskSystem,
    params: &AnalysisParams,
) -> Result<(), OverheadError> {
    let c = table.cost(Primitive::SpinLock, params.num_cores)? * params.oh_scale;
    charge(system, c, c);
    Ok(())
}

/// Charge phase-fair reader-writer lock costs: read sections pay the
/// read-lock path, write sections the write path.
pub fn charge_phase_fair(
    table: &OverheadTable,
    system: &mut TaskSystem,
    params: &AnalysisParams,
) -> Result<(), OverheadError> {
    let read = table.cost(Primitive::ReadLock, params.num_cores)? * params.oh_scale;
    let write = table.cost(Primitive::ReadUnlock, params.num_cores)? * params.oh_scale;
    charge(system, read, write);
    Ok(())
}

/// Charge a reclamation scheme's costs: read sections pay the scheme's
/// read-side primitive, write sections the writer lock plus one
/// allocation per deferred object.
pub fn charge_smr(
    table: &OverheadTable,
    system: &mut TaskSystem,
    params: &AnalysisParams,
    read_primitive: Primitive,
) -> Result<(), OverheadError> {
    let read = table.cost(read_primitive, params.num_cores)? * params.oh_scale;
    let write = (table.cost(Primitive::SpinLock, params.num_cores)?
        + table.cost(Primitive::MemAlloc, params.num_cores)? * params.num_mem as f64)
        * params.oh_scale;
    charge(system, read, write);
    Ok(())
}
