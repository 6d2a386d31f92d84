//! Runtime adapters binding the collaborator traits to concrete executors.

#[cfg(feature = "tokio-runtime")]
pub mod tokio_runtime;

#[cfg(feature = "tokio-runtime")]
pub use tokio_runtime::{TokioBackend, TokioDelayScheduler};
