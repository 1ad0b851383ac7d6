//! Bounded-concurrency batch fetch executor.
//!
//! Drives the lead source for an ordered list of partitions with at most
//! `max_concurrent` fetches in flight, isolates per-partition failure, and
//! aggregates one outcome per task into a batch result.

mod result;
mod run;
mod task;

pub use result::{BatchError, BatchFailure, BatchResult, FailureReason};
pub use run::run_batch;
pub use task::{FetchOutcome, FetchStatus, FetchTask, InvalidTask};
