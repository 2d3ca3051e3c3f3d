use std::cell::Cell;

use super::memory::deferred_objects;
use super::search::{binary_search, linear_search};
use super::{
    fp_schedulable, fp_schedulable_with_quiescence, smr_schedulable, AnalysisError, Side,
};
use crate::context::AnalysisContext;
use crate::model::{Task, TaskSystem};
use crate::oracle::{FnOracle, NoBlocking};
use crate::quiescence::Quiescence;
use crate::scheme::Epoch;

// Two tasks per core on three cores, already in priority order.
fn reference_system() -> TaskSystem {
    vec![
        Task::new(2, 10).on(1),
        Task::new(5, 20).on(0),
        Task::new(5, 20).on(1),
        Task::new(5, 20).on(2),
        Task::new(10, 30).on(0),
        Task::new(10, 30).on(2),
    ]
    .into_iter()
    .collect()
}

fn response_times(ctx: &AnalysisContext) -> Vec<u64> {
    ctx.states().iter().map(|s| s.response_time).collect()
}

fn read_response_times(ctx: &AnalysisContext) -> Vec<u64> {
    ctx.states().iter().map(|s| s.read_response_time).collect()
}

#[test]
fn baseline_fixed_priority_schedulability() {
    let ts = reference_system();
    let mut ctx = AnalysisContext::new(&ts);
    assert!(fp_schedulable(&ts, &mut ctx));
    assert_eq!(response_times(&ctx), vec![2, 5, 7, 5, 15, 15]);
}

#[test]
fn overloaded_partition_is_a_negative_verdict() {
    let ts: TaskSystem = vec![Task::new(10, 20), Task::new(15, 30)].into_iter().collect();
    let mut ctx = AnalysisContext::new(&ts);
    assert!(!fp_schedulable(&ts, &mut ctx));
    // the diverged window is recorded as-is
    assert!(ctx[1].response_time > ts[1].deadline);
}

#[test]
fn no_requests_reduce_to_plain_fixed_priority() {
    let ts = reference_system();
    for t in &ts {
        assert_eq!(t.max_read_length(), 0);
    }

    let mut plain = AnalysisContext::new(&ts);
    assert!(fp_schedulable(&ts, &mut plain));

    // with a zero latency bound and zero reclaimer blocking, the
    // quiescence-aware test is the plain one
    let mut ctx = AnalysisContext::new(&ts);
    let mut q = Quiescence::new(5, 5, 3);
    q.period = ts.max_period();
    assert!(fp_schedulable_with_quiescence(
        &ts, &mut ctx, &mut q, &Epoch, 0, 0
    ));
    assert_eq!(plain, ctx);
}

#[test]
fn read_requests_on_lead_tasks_cost_exactly_their_length() {
    let mut ts = reference_system();
    // one reader per partition, each at the head of its partition
    ts[0].add_read_request(0, 3);
    ts[1].add_read_request(0, 3);
    ts[3].add_read_request(0, 3);

    let mut ctx = AnalysisContext::new(&ts);
    let mut q = Quiescence::new(0, 0, 0);
    q.period = 30;
    let verdict = smr_schedulable(&ts, &mut ctx, &mut q, &Epoch, &NoBlocking).unwrap();
    assert!(verdict);
    assert_eq!(read_response_times(&ctx), vec![3, 3, 0, 3, 0, 0]);
    // the write side is untouched by read requests
    assert_eq!(response_times(&ctx), vec![2, 5, 7, 5, 15, 15]);
}

#[test]
fn read_response_is_at_least_the_section_length() {
    let mut ts = reference_system();
    // a low-priority reader also pays preemption by its local
    // higher-priority task
    ts[2].add_read_request(0, 4);

    let mut ctx = AnalysisContext::new(&ts);
    let mut q = Quiescence::new(0, 0, 0);
    q.period = 30;
    assert!(smr_schedulable(&ts, &mut ctx, &mut q, &Epoch, &NoBlocking).unwrap());
    assert!(ctx[2].read_response_time >= 4);
    assert_eq!(ctx[2].read_response_time, 6);
    assert_eq!(response_times(&ctx), vec![2, 5, 7, 5, 15, 15]);
}

// One writer per partition: at the head of core 1's queue, behind a
// higher-priority task on cores 0 and 2.
fn with_lead_writers(w_len: u64) -> TaskSystem {
    let mut ts = reference_system();
    ts[0].add_write_request(0, w_len);
    ts[4].add_write_request(0, w_len);
    ts[5].add_write_request(0, w_len);
    ts
}

// Oracle charging each writer per its position: a partition-leading
// writer pays two section lengths, a lower-priority one three.
fn position_dependent_blocking(w_len: u64) -> FnOracle<impl Fn(&TaskSystem, &mut AnalysisContext)> {
    FnOracle::new(move |sys: &TaskSystem, ctx: &mut AnalysisContext| {
        for (_, part) in sys.partitions() {
            for (pos, &i) in part.iter().enumerate() {
                if sys[i].is_writer() {
                    ctx[i].blocked = if pos == 0 { 2 * w_len } else { 3 * w_len };
                }
            }
        }
    })
}

#[test]
fn writer_blocking_depends_on_relative_priority() {
    let ts = with_lead_writers(1);
    let mut ctx = AnalysisContext::new(&ts);
    let mut q = Quiescence::new(0, 0, 0);
    q.period = 30;
    let oracle = position_dependent_blocking(1);
    let verdict = smr_schedulable(&ts, &mut ctx, &mut q, &Epoch, &oracle).unwrap();
    assert!(verdict);

    let blocked: Vec<u64> = ctx.states().iter().map(|s| s.blocked).collect();
    assert_eq!(blocked, vec![2, 0, 0, 0, 3, 3]);
    assert_eq!(response_times(&ctx), vec![4, 5, 7, 5, 18, 18]);
    // epoch-based reclamation charges no reclaimer blocking
    let q_blocked: Vec<u64> = ctx.states().iter().map(|s| s.q_blocked).collect();
    assert_eq!(q_blocked, vec![0; 6]);
}

#[test]
fn converged_co_analysis_is_idempotent() {
    let ts = with_lead_writers(1);
    let mut ctx = AnalysisContext::new(&ts);
    let mut q = Quiescence::new(0, 0, 0);
    q.period = 30;
    let oracle = position_dependent_blocking(1);
    assert!(smr_schedulable(&ts, &mut ctx, &mut q, &Epoch, &oracle).unwrap());

    let converged = ctx.clone();
    assert!(smr_schedulable(&ts, &mut ctx, &mut q, &Epoch, &oracle).unwrap());
    assert_eq!(ctx, converged);
}

#[test]
fn deferred_objects_step_with_write_epochs() {
    // one writer per partition: periods 30, 30, 20 with initial
    // response times 10, 10, 5
    let mut ts = reference_system();
    ts[2].add_write_request(0, 1);
    ts[4].add_write_request(0, 1);
    ts[5].add_write_request(0, 1);
    let ctx = AnalysisContext::new(&ts);

    assert_eq!(deferred_objects(&ts, &ctx, 0, 1), 3);
    assert_eq!(deferred_objects(&ts, &ctx, 15, 1), 3);
    assert_eq!(deferred_objects(&ts, &ctx, 16, 1), 4);
    assert_eq!(deferred_objects(&ts, &ctx, 20, 1), 4);
    assert_eq!(deferred_objects(&ts, &ctx, 21, 1), 6);
    assert_eq!(deferred_objects(&ts, &ctx, 30, 1), 6);
    assert_eq!(deferred_objects(&ts, &ctx, 100, 1), 14);
    // scales linearly in the per-epoch deferral count
    assert_eq!(deferred_objects(&ts, &ctx, 100, 2), 28);

    // a non-decreasing step function of the window length
    for t in 0..150 {
        assert!(deferred_objects(&ts, &ctx, t + 1, 1) >= deferred_objects(&ts, &ctx, t, 1));
    }
}

// A single-core system whose low-priority task tolerates the
// reclaimer only if detection runs no more than once per busy window:
// schedulable exactly for grace periods of at least 20.
fn detection_sensitive_system() -> TaskSystem {
    let mut writer = Task::new(2, 10);
    writer.add_write_request(0, 1);
    vec![writer, Task::new(13, 20)].into_iter().collect()
}

#[test]
fn binary_and_linear_search_agree() {
    let ts = detection_sensitive_system();

    let mut q = Quiescence::new(3, 0, 1);
    let binary = binary_search(&ts, &mut q, &Epoch, &NoBlocking, 10, 20).unwrap();

    let mut q = Quiescence::new(3, 0, 1);
    let linear = linear_search(&ts, &mut q, &Epoch, &NoBlocking, 10, 20).unwrap();

    assert_eq!(binary, linear);
    assert!(binary.schedulable);
    assert_eq!(binary.period, 20);
    // 4 write epochs overlap the reclamation window at the chosen
    // period
    assert_eq!(binary.worst_case_memory, 4);
}

#[test]
fn linear_search_reports_exhaustion() {
    let ts = detection_sensitive_system();
    // periods 10..=19 are all unschedulable
    let mut q = Quiescence::new(3, 0, 1);
    let outcome = linear_search(&ts, &mut q, &Epoch, &NoBlocking, 10, 19).unwrap();
    assert!(!outcome.schedulable);
    assert_eq!(outcome.worst_case_memory, 0);
}

#[test]
fn inconsistent_search_bounds_fail_fast() {
    let ts = detection_sensitive_system();
    let mut q = Quiescence::new(3, 0, 1);
    assert!(matches!(
        binary_search(&ts, &mut q, &Epoch, &NoBlocking, 30, 20),
        Err(AnalysisError::InvalidSearchBounds {
            min_q: 30,
            max_q: 20
        })
    ));
    assert!(matches!(
        linear_search(&ts, &mut q, &Epoch, &NoBlocking, 0, 20),
        Err(AnalysisError::InvalidSearchBounds { .. })
    ));
}

#[test]
fn shrinking_blocking_bounds_are_a_defect() {
    let mut writer = Task::new(2, 10);
    writer.add_write_request(0, 1);
    let ts: TaskSystem = vec![writer, Task::new(5, 20)].into_iter().collect();

    // an oracle that violates its contract: blocking shrinks on the
    // second call
    let calls = Cell::new(0u32);
    let oracle = FnOracle::new(move |sys: &TaskSystem, ctx: &mut AnalysisContext| {
        let n = calls.get();
        calls.set(n + 1);
        let charge = if n == 0 { 10 } else { 0 };
        for i in 0..sys.len() {
            ctx[i].blocked = if sys[i].period == 20 { charge } else { 0 };
        }
    });

    let mut ctx = AnalysisContext::new(&ts);
    let mut q = Quiescence::new(0, 0, 0);
    q.period = 30;
    let result = smr_schedulable(&ts, &mut ctx, &mut q, &Epoch, &oracle);
    assert!(matches!(
        result,
        Err(AnalysisError::MonotonicityViolation {
            task: 1,
            side: Side::Write,
            ..
        })
    ));
}

#[test]
fn reclaimer_memory_cost_feeds_back_into_demand() {
    // freeing deferred objects is charged to the competing writer,
    // and the charge grows with theta until both stabilize
    let mut w = Task::new(2, 10);
    w.add_write_request(0, 1);
    let ts: TaskSystem = vec![w].into_iter().collect();

    let mut ctx = AnalysisContext::new(&ts);
    let mut q = Quiescence::new(1, 1, 1);
    q.period = 10;
    assert!(smr_schedulable(&ts, &mut ctx, &mut q, &Epoch, &NoBlocking).unwrap());
    // one detection pass plus three deferred frees on top of the
    // writer's own cost
    assert_eq!(ctx[0].response_time, 6);
    assert_eq!(super::memory::worst_case_memory(&ts, &ctx, &Epoch, &q), 3);
}

#[test]
fn reclaimer_priority_tie_breaks_differ_between_sides() {
    // a writer whose period equals the reclaimer's synthetic
    // priority: the write side is charged the detection pass, the
    // read side is not
    let mut w = Task::new(2, 10);
    w.add_write_request(0, 1);
    w.add_read_request(0, 1);
    let ts: TaskSystem = vec![w].into_iter().collect();

    let mut ctx = AnalysisContext::new(&ts);
    let mut q = Quiescence::new(7, 0, 0);
    q.period = 10;
    assert!(smr_schedulable(&ts, &mut ctx, &mut q, &Epoch, &NoBlocking).unwrap());
    assert_eq!(ctx[0].response_time, 9);
    assert_eq!(ctx[0].read_response_time, 1);
}
