//! Diagnostic counters for queue introspection.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::task::DispatchClass;

/// Point-in-time snapshot of queue activity.
///
/// Diagnostic only; none of these values carry a behavioral contract.
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    /// Tasks submitted through `execute` and `initialize`.
    pub submitted_tasks: u64,
    /// Immediate-class submissions (Immediate, InvalidateSnapshot, ResetSnapshot).
    pub immediate_tasks: u64,
    /// User-facing submissions.
    pub user_facing_tasks: u64,
    /// Background submissions.
    pub background_tasks: u64,
    /// Tasks whose dispatch cycle finished, including timed-out no-ops.
    pub completed_tasks: u64,
    /// Duplicate snapshot-invalidate submissions dropped.
    pub dropped_duplicates: u64,
    /// Tasks whose timeout fired before they started.
    pub timed_out_tasks: u64,
    /// Times the watchdog forced the queue open.
    pub starvation_recoveries: u64,
    /// Deepest the immediate-class bucket has been.
    pub max_immediate_depth: u64,
    /// Deepest the user-facing bucket has been.
    pub max_user_facing_depth: u64,
    /// Deepest the background bucket has been.
    pub max_background_depth: u64,
}

/// Internal counters (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct QueueCounters {
    submitted_tasks: AtomicU64,
    immediate_tasks: AtomicU64,
    user_facing_tasks: AtomicU64,
    background_tasks: AtomicU64,
    completed_tasks: AtomicU64,
    dropped_duplicates: AtomicU64,
    timed_out_tasks: AtomicU64,
    starvation_recoveries: AtomicU64,
    max_immediate_depth: AtomicU64,
    max_user_facing_depth: AtomicU64,
    max_background_depth: AtomicU64,
}

impl QueueCounters {
    pub(crate) fn record_submitted(&self, class: DispatchClass) {
        self.submitted_tasks.fetch_add(1, Ordering::Relaxed);
        match class {
            DispatchClass::Immediate | DispatchClass::Invalidate | DispatchClass::Reset => {
                self.immediate_tasks.fetch_add(1, Ordering::Relaxed);
            }
            DispatchClass::UserFacing => {
                self.user_facing_tasks.fetch_add(1, Ordering::Relaxed);
            }
            DispatchClass::Background => {
                self.background_tasks.fetch_add(1, Ordering::Relaxed);
            }
            DispatchClass::Init => {}
        }
    }

    pub(crate) fn record_completed(&self) {
        self.completed_tasks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_duplicate(&self) {
        self.dropped_duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timed_out(&self) {
        self.timed_out_tasks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_starvation_recovery(&self) {
        self.starvation_recoveries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn note_immediate_depth(&self, depth: usize) {
        self.max_immediate_depth
            .fetch_max(depth as u64, Ordering::Relaxed);
    }

    pub(crate) fn note_user_facing_depth(&self, depth: usize) {
        self.max_user_facing_depth
            .fetch_max(depth as u64, Ordering::Relaxed);
    }

    pub(crate) fn note_background_depth(&self, depth: usize) {
        self.max_background_depth
            .fetch_max(depth as u64, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub(crate) fn snapshot(&self) -> QueueStats {
        QueueStats {
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
            immediate_tasks: self.immediate_tasks.load(Ordering::Relaxed),
            user_facing_tasks: self.user_facing_tasks.load(Ordering::Relaxed),
            background_tasks: self.background_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            dropped_duplicates: self.dropped_duplicates.load(Ordering::Relaxed),
            timed_out_tasks: self.timed_out_tasks.load(Ordering::Relaxed),
            starvation_recoveries: self.starvation_recoveries.load(Ordering::Relaxed),
            max_immediate_depth: self.max_immediate_depth.load(Ordering::Relaxed),
            max_user_facing_depth: self.max_user_facing_depth.load(Ordering::Relaxed),
            max_background_depth: self.max_background_depth.load(Ordering::Relaxed),
        }
    }
}
