//! Dispatch ordering and delay-gating behavior.
//!
//! Validates:
//! 1. Non-immediate tasks are held while the queue is delayed
//! 2. FIFO order within a bucket, strict priority across buckets
//! 3. Direct dispatch when the queue is open and idle
//! 4. One task in flight at a time, even with a free backend

mod common;

use common::{DeferredBackend, ExecutionLog, InlineBackend, ManualScheduler};
use prometheus_dispatch::config::QueueConfig;
use prometheus_dispatch::core::{TaskClass, TaskQueue};
use prometheus_dispatch::util::clock::ManualClock;

fn inline_queue() -> (
    TaskQueue<InlineBackend, ManualScheduler, ManualClock>,
    ManualScheduler,
) {
    let clock = ManualClock::new();
    let scheduler = ManualScheduler::new(clock.clone());
    let queue = TaskQueue::new(
        InlineBackend,
        scheduler.clone(),
        clock,
        QueueConfig::default(),
    );
    (queue, scheduler)
}

fn deferred_queue() -> (
    TaskQueue<DeferredBackend, ManualScheduler, ManualClock>,
    DeferredBackend,
) {
    let clock = ManualClock::new();
    let scheduler = ManualScheduler::new(clock.clone());
    let backend = DeferredBackend::new();
    let queue = TaskQueue::new(
        backend.clone(),
        scheduler,
        clock,
        QueueConfig::default(),
    );
    (queue, backend)
}

#[test]
fn holds_non_immediate_tasks_until_initialized() {
    let (queue, _scheduler) = inline_queue();
    let log = ExecutionLog::new();

    assert!(queue.is_delayed());
    queue.execute("u1", TaskClass::UserFacing, log.entry("u1"));
    queue.execute("b1", TaskClass::Background, log.entry("b1"));
    assert!(log.entries().is_empty());

    queue.initialize(log.entry("init"));
    assert!(!queue.is_delayed());
    assert_eq!(log.entries(), vec!["init", "u1", "b1"]);
}

#[test]
fn fifo_within_a_bucket() {
    let (queue, _scheduler) = inline_queue();
    let log = ExecutionLog::new();

    queue.execute("u1", TaskClass::UserFacing, log.entry("u1"));
    queue.execute("u2", TaskClass::UserFacing, log.entry("u2"));
    queue.execute("u3", TaskClass::UserFacing, log.entry("u3"));

    queue.initialize(log.entry("init"));
    assert_eq!(log.entries(), vec!["init", "u1", "u2", "u3"]);
}

#[test]
fn priority_order_across_buckets() {
    // Background, then user-facing, then immediate, all submitted while
    // delayed. The immediate task runs right away; the rest drain in
    // priority order once the queue opens.
    let (queue, _scheduler) = inline_queue();
    let log = ExecutionLog::new();

    queue.execute("b1", TaskClass::Background, log.entry("b1"));
    queue.execute("u1", TaskClass::UserFacing, log.entry("u1"));
    queue.execute("i1", TaskClass::Immediate, log.entry("i1"));
    assert_eq!(log.entries(), vec!["i1"]);

    queue.complete_reset();
    assert_eq!(log.entries(), vec!["i1", "u1", "b1"]);
}

#[test]
fn dispatches_directly_when_open_and_idle() {
    let (queue, _scheduler) = inline_queue();
    let log = ExecutionLog::new();

    queue.initialize(log.entry("init"));
    queue.execute("direct", TaskClass::UserFacing, log.entry("direct"));
    assert_eq!(log.entries(), vec!["init", "direct"]);
}

#[test]
fn serializes_tasks_even_with_a_free_backend() {
    let (queue, backend) = deferred_queue();
    let log = ExecutionLog::new();

    queue.initialize(log.entry("init"));
    assert_eq!(backend.run_next().as_deref(), Some("initialize"));

    queue.execute("t1", TaskClass::UserFacing, log.entry("t1"));
    assert_eq!(backend.pending(), 1);

    // t1 has not finished; t2 must wait in the bucket, not on the backend.
    queue.execute("t2", TaskClass::UserFacing, log.entry("t2"));
    assert_eq!(backend.pending(), 1);

    assert_eq!(backend.run_next().as_deref(), Some("t1"));
    assert_eq!(backend.pending(), 1);
    assert_eq!(backend.run_next().as_deref(), Some("t2"));
    assert_eq!(log.entries(), vec!["init", "t1", "t2"]);
}

#[test]
fn initialize_twice_still_runs() {
    let (queue, _scheduler) = inline_queue();
    let log = ExecutionLog::new();

    queue.initialize(log.entry("first"));
    queue.initialize(log.entry("second"));
    assert_eq!(log.entries(), vec!["first", "second"]);
    assert!(!queue.is_delayed());
}

#[test]
fn stats_track_submissions_and_depths() {
    let (queue, _scheduler) = inline_queue();
    let log = ExecutionLog::new();

    queue.execute("u1", TaskClass::UserFacing, log.entry("u1"));
    queue.execute("u2", TaskClass::UserFacing, log.entry("u2"));
    queue.execute("b1", TaskClass::Background, log.entry("b1"));
    queue.initialize(log.entry("init"));

    let stats = queue.stats();
    assert_eq!(stats.submitted_tasks, 4);
    assert_eq!(stats.user_facing_tasks, 2);
    assert_eq!(stats.background_tasks, 1);
    assert_eq!(stats.completed_tasks, 4);
    assert_eq!(stats.max_user_facing_depth, 2);
    assert_eq!(stats.max_background_depth, 1);
}
