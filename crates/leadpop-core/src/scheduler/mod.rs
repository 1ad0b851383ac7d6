//! Job orchestration and calendar scheduling.
//!
//! `Orchestrator` runs the detect → select → batch-fetch cycles (also usable as
//! manual entry points); `Scheduler` binds them to cron triggers, keeps each job
//! from overlapping itself, and owns the start/stop lifecycle.

mod cron;
mod guard;
mod jobs;

pub use cron::{Scheduler, SchedulerError, SchedulerState};
pub use jobs::{JobCancelled, JobKind, JobOutcome, JobReport, Orchestrator};
