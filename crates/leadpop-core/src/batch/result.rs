//! Batch-level aggregation of fetch outcomes.

use serde::Serialize;
use std::fmt::Write;
use std::time::Duration;

use super::task::{FetchOutcome, FetchStatus};
use crate::catalog::Partition;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    Failed(String),
    Cancelled,
}

/// One partition that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub partition: Partition,
    pub reason: FailureReason,
}

/// Every partition in a batch that failed or was skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", describe_failures(.total, .failures))]
pub struct BatchError {
    pub total: usize,
    pub failures: Vec<BatchFailure>,
}

fn describe_failures(total: &usize, failures: &[BatchFailure]) -> String {
    let mut text = format!("{} of {} fetch task(s) did not complete:", failures.len(), total);
    for failure in failures {
        let _ = match &failure.reason {
            FailureReason::Failed(msg) => write!(text, " [{}: {}]", failure.partition, msg),
            FailureReason::Cancelled => write!(text, " [{}: cancelled]", failure.partition),
        };
    }
    text
}

/// Outcomes of one batch. A batch with failures is still a completed batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub outcomes: Vec<FetchOutcome>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl BatchResult {
    pub(crate) fn new(outcomes: Vec<FetchOutcome>, elapsed: Duration) -> Self {
        Self { outcomes, elapsed }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FetchStatus::Failed(_)))
            .count()
    }

    pub fn cancelled(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == FetchStatus::Cancelled)
            .count()
    }

    pub fn short(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_short()).count()
    }

    pub fn total_fetched(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                FetchStatus::Fetched(n) => u64::from(n),
                _ => 0,
            })
            .sum()
    }

    /// True when no task failed or was cancelled.
    pub fn is_clean(&self) -> bool {
        self.succeeded() == self.outcomes.len()
    }

    /// Some iff at least one task failed or was skipped; lists all of them.
    pub fn error(&self) -> Option<BatchError> {
        let failures: Vec<BatchFailure> = self
            .outcomes
            .iter()
            .filter_map(|o| {
                let reason = match &o.status {
                    FetchStatus::Fetched(_) => return None,
                    FetchStatus::Failed(msg) => FailureReason::Failed(msg.clone()),
                    FetchStatus::Cancelled => FailureReason::Cancelled,
                };
                Some(BatchFailure {
                    partition: o.partition.clone(),
                    reason,
                })
            })
            .collect();
        if failures.is_empty() {
            return None;
        }
        Some(BatchError {
            total: self.outcomes.len(),
            failures,
        })
    }
}
