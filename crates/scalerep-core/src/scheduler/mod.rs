//! Bounded worker scheduler.
//!
//! Submits jobs in enumeration order while worker slots are free, then
//! polls object storage for the artifacts of in-flight jobs until a slot
//! frees up. Single-threaded: the only suspension point is the sleep
//! between poll cycles.

mod pool;
mod run;

pub use pool::WorkerPool;
pub use run::{RunSummary, Scheduler, SchedulerOptions};
