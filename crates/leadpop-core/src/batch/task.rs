//! Fetch tasks and their outcomes.

use serde::Serialize;

use crate::catalog::Partition;

/// Rejected before submission: target counts must be positive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetch target for {partition} must be > 0 (got {target})")]
pub struct InvalidTask {
    pub partition: Partition,
    pub target: i64,
}

/// One unit of work: request `target_count` leads for `partition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    partition: Partition,
    target_count: u32,
}

impl FetchTask {
    pub fn new(partition: Partition, target_count: i64) -> Result<Self, InvalidTask> {
        match u32::try_from(target_count) {
            Ok(target) if target > 0 => Ok(Self {
                partition,
                target_count: target,
            }),
            _ => Err(InvalidTask {
                partition,
                target: target_count,
            }),
        }
    }

    /// One task per partition, all with the same target.
    pub fn for_partitions(
        partitions: impl IntoIterator<Item = Partition>,
        target_count: i64,
    ) -> Result<Vec<Self>, InvalidTask> {
        partitions
            .into_iter()
            .map(|p| Self::new(p, target_count))
            .collect()
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn target_count(&self) -> u32 {
        self.target_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum FetchStatus {
    /// The source returned this many stored leads (may be below target).
    Fetched(u32),
    Failed(String),
    /// Never attempted, or abandoned after the batch was cancelled.
    Cancelled,
}

/// Result of one task. Exactly one per submitted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchOutcome {
    pub partition: Partition,
    pub target: u32,
    pub status: FetchStatus,
}

impl FetchOutcome {
    pub(crate) fn new(task: FetchTask, status: FetchStatus) -> Self {
        Self {
            partition: task.partition,
            target: task.target_count,
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, FetchStatus::Fetched(_))
    }

    /// Succeeded but returned fewer leads than requested.
    pub fn is_short(&self) -> bool {
        matches!(self.status, FetchStatus::Fetched(n) if n < self.target)
    }
}
