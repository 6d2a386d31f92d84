//! Tokio adapters for the backend and delay-scheduler traits.

use std::sync::Arc;
use std::time::Duration;

use crate::core::backend::{Backend, DelayScheduler};
use crate::core::error::DispatchError;
use crate::core::task::TaskFn;

/// Backend that runs task actions on a tokio runtime's blocking pool.
///
/// Actions are opaque synchronous callables and may block, so they go through
/// `spawn_blocking` rather than onto the async workers.
#[derive(Clone)]
pub struct TokioBackend {
    handle: tokio::runtime::Handle,
    /// Keeps a runtime we created ourselves alive for as long as any clone
    /// of this backend exists.
    _runtime: Option<Arc<tokio::runtime::Runtime>>,
}

impl TokioBackend {
    /// Wrap an existing tokio runtime handle.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle,
            _runtime: None,
        }
    }

    /// Create a backend with its own multi-threaded runtime.
    pub fn with_worker_threads(worker_threads: usize) -> Result<Self, DispatchError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .thread_name("dispatch-backend")
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();
        Ok(Self {
            handle,
            _runtime: Some(Arc::new(runtime)),
        })
    }
}

impl Backend for TokioBackend {
    fn run(&self, name: &str, work: TaskFn) {
        tracing::trace!(task = name, "handing task to backend");
        self.handle.spawn_blocking(work);
    }
}

/// Delay scheduler that runs callbacks off a tokio timer.
///
/// Use [`TokioDelayScheduler::dedicated`] to give the queue a coordination
/// context separate from the task backend; watchdog liveness depends on it
/// when the backend stalls.
#[derive(Clone)]
pub struct TokioDelayScheduler {
    handle: tokio::runtime::Handle,
    _runtime: Option<Arc<tokio::runtime::Runtime>>,
}

impl TokioDelayScheduler {
    /// Wrap an existing tokio runtime handle.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle,
            _runtime: None,
        }
    }

    /// Create a scheduler with its own single-worker runtime.
    pub fn dedicated() -> Result<Self, DispatchError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("dispatch-watchdog")
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();
        Ok(Self {
            handle,
            _runtime: Some(Arc::new(runtime)),
        })
    }
}

impl DelayScheduler for TokioDelayScheduler {
    fn schedule(&self, delay: Duration, callback: TaskFn) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
    }
}
