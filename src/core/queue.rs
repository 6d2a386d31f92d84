//! The delay-aware serial dispatch queue.
//!
//! Sequences tasks onto a single logical executor. Immediate-class tasks
//! (plain immediate plus snapshot invalidate/reset) always dispatch first and
//! stay eligible while the queue is delayed; user-facing and background tasks
//! accumulate until the delay clears. A starvation watchdog forces the queue
//! open if a delay persists with no task progress.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::config::QueueConfig;
use crate::core::backend::{Backend, DelayScheduler};
use crate::core::stats::{QueueCounters, QueueStats};
use crate::core::task::{DispatchClass, TaskClass, TaskFn, TimeoutRace};
use crate::util::clock::Clock;

/// A submitted task waiting in one of the buckets.
struct QueuedTask {
    name: String,
    class: DispatchClass,
    action: TaskFn,
    race: Option<Arc<TimeoutRace>>,
}

/// Mutable bookkeeping, all behind one mutex. Task actions run outside it.
struct QueueState {
    immediate: VecDeque<QueuedTask>,
    user_facing: VecDeque<QueuedTask>,
    background: VecDeque<QueuedTask>,
    initialized: bool,
    init_submitted: bool,
    waiting_for_reset: bool,
    /// Name and class of the in-flight task. Diagnostic only.
    running: Option<(String, DispatchClass)>,
    last_progress_ms: u128,
    watchdog_armed: bool,
}

impl QueueState {
    fn is_delayed(&self) -> bool {
        !self.initialized || self.waiting_for_reset
    }

    fn has_backlog(&self) -> bool {
        !self.immediate.is_empty() || !self.user_facing.is_empty() || !self.background.is_empty()
    }
}

struct QueueCore<B, D, C> {
    backend: B,
    scheduler: D,
    clock: C,
    config: QueueConfig,
    state: Mutex<QueueState>,
    counters: QueueCounters,
}

/// Delay-aware serial task dispatch queue.
///
/// Constructed once per session with its collaborators and shared by cloning;
/// clones point at the same queue. The queue guarantees that at most one
/// task's action is in flight at a time: the next dispatch only happens after
/// the current task's post-hook completes, even if the backend itself is
/// multi-threaded.
///
/// The queue starts uninitialized, so `is_delayed` is true until the task
/// submitted through [`TaskQueue::initialize`] completes.
pub struct TaskQueue<B, D, C> {
    core: Arc<QueueCore<B, D, C>>,
}

impl<B, D, C> Clone for TaskQueue<B, D, C> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<B, D, C> TaskQueue<B, D, C>
where
    B: Backend,
    D: DelayScheduler,
    C: Clock,
{
    /// Create a queue from its collaborators.
    pub fn new(backend: B, scheduler: D, clock: C, config: QueueConfig) -> Self {
        let now = clock.now_ms();
        Self {
            core: Arc::new(QueueCore {
                backend,
                scheduler,
                clock,
                config,
                state: Mutex::new(QueueState {
                    immediate: VecDeque::new(),
                    user_facing: VecDeque::new(),
                    background: VecDeque::new(),
                    initialized: false,
                    init_submitted: false,
                    waiting_for_reset: false,
                    running: None,
                    last_progress_ms: now,
                    watchdog_armed: false,
                }),
                counters: QueueCounters::default(),
            }),
        }
    }

    /// Submit the initialization task.
    ///
    /// Bypasses all queueing and runs directly on the backend; on completion
    /// the queue becomes initialized and drains whatever accumulated while it
    /// was held. Calling this more than once logs a warning but still runs
    /// the action.
    pub fn initialize(&self, action: TaskFn) {
        {
            let mut st = self.core.state.lock();
            if st.init_submitted {
                tracing::warn!("initialize submitted more than once");
            }
            st.init_submitted = true;
            st.running = Some(("initialize".to_string(), DispatchClass::Init));
        }
        self.core.counters.record_submitted(DispatchClass::Init);
        let core = Arc::clone(&self.core);
        self.core.backend.run(
            "initialize",
            Box::new(move || {
                action();
                QueueCore::task_finished(&core, DispatchClass::Init);
            }),
        );
    }

    /// Submit a task.
    ///
    /// Runs immediately on the backend when the queue is not delayed, has no
    /// backlog, and nothing is in flight; otherwise the task is enqueued into
    /// the bucket matching its class.
    pub fn execute(&self, name: impl Into<String>, class: TaskClass, action: TaskFn) {
        self.submit(name.into(), class.into(), action, None);
    }

    /// Submit a task with a start timeout.
    ///
    /// If the task has not begun executing within `timeout`, `on_timeout`
    /// runs on the backend instead and the original action becomes a no-op.
    /// If the task starts first, the fallback is inert. The race spans two
    /// scheduling contexts and is settled atomically, so exactly one side
    /// wins.
    pub fn execute_with_timeout(
        &self,
        name: impl Into<String>,
        class: TaskClass,
        action: TaskFn,
        timeout: Duration,
        on_timeout: TaskFn,
    ) {
        self.submit(name.into(), class.into(), action, Some((timeout, on_timeout)));
    }

    /// Drop all pending work and re-enter the delayed state.
    ///
    /// Used when the shared snapshot must be rebuilt from empty. Arms the
    /// watchdog, since a delay is now expected and must not hang forever.
    pub fn reset(&self) {
        let arm = {
            let mut st = self.core.state.lock();
            let dropped = st.immediate.len() + st.user_facing.len() + st.background.len();
            st.immediate.clear();
            st.user_facing.clear();
            st.background.clear();
            st.initialized = false;
            st.init_submitted = false;
            st.waiting_for_reset = false;
            st.last_progress_ms = self.core.clock.now_ms();
            if dropped > 0 {
                tracing::info!(dropped, "queue reset; pending tasks discarded");
            } else {
                tracing::debug!("queue reset");
            }
            let arm = !st.watchdog_armed;
            st.watchdog_armed = true;
            arm
        };
        if arm {
            QueueCore::schedule_watchdog_tick(&self.core);
        }
    }

    /// Mark the queue initialized without touching the snapshot-reset flag.
    ///
    /// Re-entry path for sessions that restore the snapshot out of band
    /// instead of running an initialization task.
    pub fn complete_reset(&self) {
        let mut st = self.core.state.lock();
        st.initialized = true;
        st.init_submitted = true;
        if st.running.is_none() {
            QueueCore::dispatch_next(&self.core, st);
        }
    }

    /// True while a snapshot invalidation is waiting on its matching reset.
    pub fn is_making_request(&self) -> bool {
        self.core.state.lock().waiting_for_reset
    }

    /// True while only immediate-class tasks may start.
    pub fn is_delayed(&self) -> bool {
        self.core.state.lock().is_delayed()
    }

    /// Diagnostic snapshot of queue counters.
    pub fn stats(&self) -> QueueStats {
        self.core.counters.snapshot()
    }

    /// Test-only escape hatch: force the snapshot-reset flag closed and
    /// attempt one dispatch.
    ///
    /// Synchronous test backends can observe reentrant orderings that a real
    /// asynchronous backend never produces; this lets such tests drain the
    /// queue anyway.
    pub fn run_tasks_for_test(&self) {
        let mut st = self.core.state.lock();
        st.waiting_for_reset = false;
        if st.running.is_none() {
            QueueCore::dispatch_next(&self.core, st);
        }
    }

    fn submit(
        &self,
        name: String,
        class: DispatchClass,
        action: TaskFn,
        timeout: Option<(Duration, TaskFn)>,
    ) {
        let mut task = QueuedTask {
            name,
            class,
            action,
            race: None,
        };
        if let Some((delay, fallback)) = timeout {
            let race = Arc::new(TimeoutRace::new());
            task.race = Some(Arc::clone(&race));
            let core = Arc::clone(&self.core);
            let task_name = task.name.clone();
            self.core.scheduler.schedule(
                delay,
                Box::new(move || {
                    if race.try_fire() {
                        tracing::warn!(
                            task = %task_name,
                            "task did not start before its timeout; running fallback"
                        );
                        core.counters.record_timed_out();
                        core.backend.run(&task_name, fallback);
                    }
                }),
            );
        }
        self.core.counters.record_submitted(class);
        let st = self.core.state.lock();
        if st.is_delayed() || st.has_backlog() || st.running.is_some() {
            QueueCore::enqueue(&self.core, st, task);
        } else {
            QueueCore::start_task(&self.core, st, task);
        }
    }
}

impl<B, D, C> QueueCore<B, D, C>
where
    B: Backend,
    D: DelayScheduler,
    C: Clock,
{
    fn enqueue(core: &Arc<Self>, mut st: MutexGuard<'_, QueueState>, task: QueuedTask) {
        match task.class {
            DispatchClass::Immediate | DispatchClass::Invalidate | DispatchClass::Reset => {
                if task.class == DispatchClass::Invalidate
                    && st
                        .immediate
                        .iter()
                        .any(|pending| pending.class == DispatchClass::Invalidate)
                {
                    tracing::warn!(
                        task = %task.name,
                        "snapshot invalidate already pending; dropping duplicate"
                    );
                    core.counters.record_dropped_duplicate();
                    return;
                }
                st.immediate.push_back(task);
                core.counters.note_immediate_depth(st.immediate.len());
                // Immediate-class work is eligible even while delayed; kick
                // the dispatcher if the backend is idle.
                if st.running.is_none() {
                    Self::dispatch_next(core, st);
                }
            }
            DispatchClass::UserFacing => {
                st.user_facing.push_back(task);
                core.counters.note_user_facing_depth(st.user_facing.len());
            }
            DispatchClass::Background => {
                st.background.push_back(task);
                core.counters.note_background_depth(st.background.len());
            }
            DispatchClass::Init => unreachable!("initialization bypasses the buckets"),
        }
    }

    /// Pick the next eligible task and start it. The immediate-class bucket
    /// is always eligible; the other buckets only when the queue is not
    /// delayed.
    fn dispatch_next(core: &Arc<Self>, mut st: MutexGuard<'_, QueueState>) {
        st.last_progress_ms = core.clock.now_ms();
        let next = if let Some(task) = st.immediate.pop_front() {
            Some(task)
        } else if st.is_delayed() {
            None
        } else if let Some(task) = st.user_facing.pop_front() {
            Some(task)
        } else {
            st.background.pop_front()
        };
        let Some(task) = next else { return };
        st.running = Some((task.name.clone(), task.class));
        drop(st);
        Self::start_on_backend(core, task);
    }

    fn start_task(core: &Arc<Self>, mut st: MutexGuard<'_, QueueState>, task: QueuedTask) {
        st.last_progress_ms = core.clock.now_ms();
        st.running = Some((task.name.clone(), task.class));
        drop(st);
        Self::start_on_backend(core, task);
    }

    fn start_on_backend(core: &Arc<Self>, task: QueuedTask) {
        let QueuedTask {
            name,
            class,
            action,
            race,
        } = task;
        let run_core = Arc::clone(core);
        let task_name = name.clone();
        core.backend.run(
            &name,
            Box::new(move || {
                // A snapshot invalidation delays the queue before its action
                // runs, not after.
                if class == DispatchClass::Invalidate {
                    run_core.state.lock().waiting_for_reset = true;
                }
                match race.as_ref() {
                    Some(race) if !race.try_start() => {
                        tracing::debug!(task = %task_name, "timeout already fired; skipping action");
                    }
                    _ => action(),
                }
                Self::task_finished(&run_core, class);
            }),
        );
    }

    /// Post-action hook: apply the class state transition, then keep the
    /// drain loop going.
    fn task_finished(core: &Arc<Self>, class: DispatchClass) {
        core.counters.record_completed();
        let mut arm = false;
        let st = {
            let mut st = core.state.lock();
            st.running = None;
            st.last_progress_ms = core.clock.now_ms();
            match class {
                DispatchClass::Init => st.initialized = true,
                DispatchClass::Reset => st.waiting_for_reset = false,
                DispatchClass::Invalidate => {
                    arm = !st.watchdog_armed;
                    st.watchdog_armed = true;
                }
                DispatchClass::Immediate
                | DispatchClass::UserFacing
                | DispatchClass::Background => {}
            }
            st
        };
        Self::dispatch_next(core, st);
        if arm {
            Self::schedule_watchdog_tick(core);
        }
    }

    fn schedule_watchdog_tick(core: &Arc<Self>) {
        let tick_core = Arc::clone(core);
        core.scheduler.schedule(
            core.config.watchdog_interval(),
            Box::new(move || Self::watchdog_tick(&tick_core)),
        );
    }

    /// Watchdog tick, run on the delay scheduler's coordination context so it
    /// stays live even when the backend is stalled.
    fn watchdog_tick(core: &Arc<Self>) {
        let mut st = core.state.lock();
        if !st.is_delayed() && !st.has_backlog() {
            st.watchdog_armed = false;
            return;
        }
        let idle_ms = core.clock.now_ms().saturating_sub(st.last_progress_ms);
        if idle_ms > u128::from(core.config.starvation_timeout_ms) {
            let idle_ms = u64::try_from(idle_ms).unwrap_or(u64::MAX);
            tracing::error!(
                idle_ms,
                "no task progress while delayed; forcing the queue open"
            );
            st.waiting_for_reset = false;
            st.initialized = true;
            st.watchdog_armed = false;
            core.counters.record_starvation_recovery();
            if st.running.is_none() {
                Self::dispatch_next(core, st);
            }
            return;
        }
        drop(st);
        Self::schedule_watchdog_tick(core);
    }
}
