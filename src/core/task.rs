//! Task classification and the start-vs-timeout race guard.

use std::sync::atomic::{AtomicU8, Ordering};

/// A unit of deferred work. Runs at most once, on the backend.
pub type TaskFn = Box<dyn FnOnce() + Send + 'static>;

/// Priority class assigned at submission time.
///
/// `Immediate`, `InvalidateSnapshot`, and `ResetSnapshot` share the
/// immediate-class bucket and stay eligible while the queue is delayed.
/// `UserFacing` and `Background` tasks are held until the delay clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskClass {
    /// Always eligible, ahead of all user-facing and background work.
    Immediate,
    /// Marks the shared snapshot stale. Starting one puts the queue into the
    /// delayed state until a matching `ResetSnapshot` completes.
    InvalidateSnapshot,
    /// Rebuilds the shared snapshot. Completing one clears the delayed state.
    ResetSnapshot,
    /// Work a user is actively waiting on.
    UserFacing,
    /// Deferred maintenance work, dispatched last.
    Background,
}

/// Internal classification, including the initialization task that callers
/// never submit through `execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatchClass {
    Init,
    Immediate,
    Invalidate,
    Reset,
    UserFacing,
    Background,
}

impl From<TaskClass> for DispatchClass {
    fn from(class: TaskClass) -> Self {
        match class {
            TaskClass::Immediate => Self::Immediate,
            TaskClass::InvalidateSnapshot => Self::Invalidate,
            TaskClass::ResetSnapshot => Self::Reset,
            TaskClass::UserFacing => Self::UserFacing,
            TaskClass::Background => Self::Background,
        }
    }
}

const PENDING: u8 = 0;
const STARTED: u8 = 1;
const FIRED: u8 = 2;

/// Settles the race between a task starting and its timeout firing.
///
/// The timer callback and the dispatch path run on different scheduling
/// contexts, so the winner is decided with a single compare-exchange rather
/// than a lock. Whichever side loses becomes a no-op.
#[derive(Debug)]
pub(crate) struct TimeoutRace {
    state: AtomicU8,
}

impl TimeoutRace {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(PENDING),
        }
    }

    /// Claim the race for the task. Returns false if the timeout already fired.
    pub(crate) fn try_start(&self) -> bool {
        self.state
            .compare_exchange(PENDING, STARTED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Claim the race for the timeout. Returns false if the task already started.
    pub(crate) fn try_fire(&self) -> bool {
        self.state
            .compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
