//! # Prometheus Dispatch
//!
//! A delay-aware serial task dispatch queue for the Prometheus AI Platform.
//!
//! This library sequences asynchronous units of work onto a single logical
//! executor, applying a priority scheme and a "delay" mode used while a
//! shared, rebuildable in-memory snapshot is being invalidated and rebuilt.
//! A starvation watchdog forces progress if delayed work stops being
//! serviced.
//!
//! ## Core Problem Solved
//!
//! Components that coordinate around one shared data structure need more than
//! a plain FIFO:
//!
//! - **Serialized Execution**: Only one task's side effects may be in flight
//!   at a time, even on a multi-threaded backend
//! - **Invalidation Lifecycle**: While the snapshot is being rebuilt, only
//!   the work rebuilding it (and other immediate-class work) may run
//! - **Priority Under Backlog**: User-facing work must get ahead of deferred
//!   maintenance the moment the queue opens
//! - **Hang Recovery**: A rebuild that stalls must not park the pipeline
//!   forever
//!
//! ## Key Features
//!
//! - **Three Priority Buckets**: Immediate-class, user-facing, and background
//!   work, drained in strict priority and FIFO order
//! - **Snapshot Delay Protocol**: `InvalidateSnapshot` tasks close the queue,
//!   `ResetSnapshot` tasks reopen it; duplicates are dropped
//! - **Start Timeouts**: A task can race a fallback action against its own
//!   start; exactly one side wins
//! - **Starvation Watchdog**: Prolonged inactivity while delayed forces the
//!   queue open instead of hanging
//! - **Pluggable Collaborators**: Execution backend, delayed-callback
//!   scheduler, and clock are traits; tokio adapters ship behind the
//!   `tokio-runtime` feature
//!
//! ```rust,ignore
//! use prometheus_dispatch::config::QueueConfig;
//! use prometheus_dispatch::core::{TaskClass, TaskQueue};
//! use prometheus_dispatch::runtime::{TokioBackend, TokioDelayScheduler};
//! use prometheus_dispatch::util::clock::SystemClock;
//!
//! let queue = TaskQueue::new(
//!     TokioBackend::with_worker_threads(4)?,
//!     TokioDelayScheduler::dedicated()?,
//!     SystemClock,
//!     QueueConfig::default(),
//! );
//!
//! // First load of the shared snapshot; everything else waits on it.
//! queue.initialize(Box::new(|| load_snapshot()));
//!
//! queue.execute("refresh-ui", TaskClass::UserFacing, Box::new(|| refresh()));
//! queue.execute("gc", TaskClass::Background, Box::new(|| collect_garbage()));
//! ```
//!
//! For complete examples, see `tests/dispatch_test.rs` and
//! `tests/watchdog_test.rs`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core queue, task classification, collaborator traits, and diagnostics.
pub mod core;
/// Configuration models for watchdog timings.
pub mod config;
/// Runtime adapters (tokio) for the collaborator traits.
pub mod runtime;
/// Shared utilities.
pub mod util;
