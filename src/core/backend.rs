//! Collaborator traits the queue executes through.

use std::time::Duration;

use crate::core::task::TaskFn;

/// Asynchronous execution backend.
///
/// Runs a named unit of work exactly once, eventually. The queue never relies
/// on the work finishing before `run` returns, but it tolerates backends that
/// execute inline; see `TaskQueue::run_tasks_for_test` for the escape hatch
/// synchronous test backends need.
pub trait Backend: Send + Sync + 'static {
    /// Hand a unit of work to the backend. The name is for diagnostics.
    fn run(&self, name: &str, work: TaskFn);
}

/// One-shot delayed callback scheduler.
///
/// Callbacks must run on a coordination context distinct from the `Backend`,
/// so the starvation watchdog keeps ticking even when the backend is stalled.
pub trait DelayScheduler: Send + Sync + 'static {
    /// Invoke `callback` once after `delay` has elapsed.
    fn schedule(&self, delay: Duration, callback: TaskFn);
}
