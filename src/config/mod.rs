//! Configuration models for queue timings.

pub mod queue;

pub use queue::QueueConfig;
