//! Core queue types, collaborator traits, and diagnostics.

pub mod backend;
pub mod error;
pub mod queue;
pub mod stats;
pub mod task;

pub use backend::{Backend, DelayScheduler};
pub use error::{AppResult, DispatchError};
pub use queue::TaskQueue;
pub use stats::QueueStats;
pub use task::{TaskClass, TaskFn};
