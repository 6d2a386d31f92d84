//! Deterministic collaborators for driving the queue in tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use prometheus_dispatch::core::{Backend, DelayScheduler, TaskFn};
use prometheus_dispatch::util::clock::{Clock, ManualClock};

/// Backend that runs work inline on the caller's thread.
#[derive(Clone, Default)]
pub struct InlineBackend;

impl Backend for InlineBackend {
    fn run(&self, _name: &str, work: TaskFn) {
        work();
    }
}

/// Backend that parks work until the test releases it, modeling an
/// asynchronous executor whose timing the test controls.
#[derive(Clone, Default)]
pub struct DeferredBackend {
    work: Arc<Mutex<VecDeque<(String, TaskFn)>>>,
}

impl DeferredBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of parked units of work.
    pub fn pending(&self) -> usize {
        self.work.lock().unwrap().len()
    }

    /// Run the oldest parked unit of work, returning its name.
    pub fn run_next(&self) -> Option<String> {
        let next = self.work.lock().unwrap().pop_front();
        next.map(|(name, work)| {
            work();
            name
        })
    }

    /// Run parked work until none remains.
    pub fn drain(&self) {
        while self.run_next().is_some() {}
    }
}

impl Backend for DeferredBackend {
    fn run(&self, name: &str, work: TaskFn) {
        self.work.lock().unwrap().push_back((name.to_string(), work));
    }
}

/// Delay scheduler driven by a `ManualClock`; callbacks fire when the test
/// advances the shared clock past their deadline.
#[derive(Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    pending: Arc<Mutex<Vec<(u128, TaskFn)>>>,
}

impl ManualScheduler {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Advance the shared clock and fire every callback that came due.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
        self.fire_due();
    }

    /// Fire callbacks whose deadline has passed. Callbacks may schedule more,
    /// so the loop runs until nothing else is due.
    pub fn fire_due(&self) {
        loop {
            let now = self.clock.now_ms();
            let due = {
                let mut pending = self.pending.lock().unwrap();
                let mut due = Vec::new();
                let mut rest = Vec::new();
                for entry in pending.drain(..) {
                    if entry.0 <= now {
                        due.push(entry.1);
                    } else {
                        rest.push(entry);
                    }
                }
                *pending = rest;
                due
            };
            if due.is_empty() {
                return;
            }
            for callback in due {
                callback();
            }
        }
    }
}

impl DelayScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, callback: TaskFn) {
        let due = self.clock.now_ms() + delay.as_millis();
        self.pending.lock().unwrap().push((due, callback));
    }
}

/// Shared record of executed task names.
#[derive(Clone, Default)]
pub struct ExecutionLog(Arc<Mutex<Vec<String>>>);

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// An action that appends `name` to the log when it runs.
    pub fn entry(&self, name: &str) -> TaskFn {
        let log = Arc::clone(&self.0);
        let name = name.to_string();
        Box::new(move || log.lock().unwrap().push(name))
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}
