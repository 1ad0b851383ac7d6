//! Run a batch of fetch tasks behind a counting admission gate.
//!
//! Every task is spawned up front; each one waits for a semaphore permit
//! before calling the source and drops it when the call returns, so at most
//! `max_concurrent` fetches are outstanding at any instant.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::result::BatchResult;
use super::task::{FetchOutcome, FetchStatus, FetchTask};
use crate::source::{FetchError, LeadSource};

/// Runs `tasks` against `source` with at most `max_concurrent` fetches in flight.
///
/// Returns only once every task has an outcome. One task's failure never stops
/// its siblings. When `cancel` fires, tasks not yet admitted are recorded as
/// cancelled without calling the source; in-flight fetches see the same token.
/// Nothing is retried here. `max_concurrent` of 0 is treated as 1.
pub async fn run_batch(
    cancel: &CancellationToken,
    source: Arc<dyn LeadSource>,
    tasks: Vec<FetchTask>,
    max_concurrent: usize,
) -> BatchResult {
    let started = Instant::now();
    if tasks.is_empty() {
        return BatchResult::new(Vec::new(), started.elapsed());
    }

    let max_concurrent = max_concurrent.max(1);
    let gate = Arc::new(Semaphore::new(max_concurrent));
    let mut join_set = JoinSet::new();

    for (index, task) in tasks.iter().cloned().enumerate() {
        let gate = Arc::clone(&gate);
        let source = Arc::clone(&source);
        let cancel = cancel.clone();
        join_set.spawn(async move {
            let outcome = run_task(&cancel, &gate, source.as_ref(), task).await;
            (index, outcome)
        });
    }

    // One slot per task, written once.
    let mut slots: Vec<Option<FetchOutcome>> = (0..tasks.len()).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            Err(e) => tracing::error!(error = %e, "fetch task join failed"),
        }
    }

    let outcomes: Vec<FetchOutcome> = slots
        .into_iter()
        .zip(tasks)
        .map(|(slot, task)| {
            slot.unwrap_or_else(|| {
                FetchOutcome::new(task, FetchStatus::Failed("fetch task panicked".to_string()))
            })
        })
        .collect();

    let result = BatchResult::new(outcomes, started.elapsed());
    if result.is_clean() {
        tracing::info!(
            tasks = result.len(),
            succeeded = result.succeeded(),
            short = result.short(),
            fetched = result.total_fetched(),
            max_concurrent,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "batch completed"
        );
    } else {
        tracing::warn!(
            tasks = result.len(),
            succeeded = result.succeeded(),
            failed = result.failed(),
            cancelled = result.cancelled(),
            fetched = result.total_fetched(),
            max_concurrent,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "batch completed with failures"
        );
    }
    result
}

async fn run_task(
    cancel: &CancellationToken,
    gate: &Semaphore,
    source: &dyn LeadSource,
    task: FetchTask,
) -> FetchOutcome {
    let permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        permit = gate.acquire() => permit.ok(),
    };
    // Released on drop, whatever the fetch returns.
    let Some(_permit) = permit else {
        tracing::debug!(partition = %task.partition(), "fetch skipped: batch cancelled");
        return FetchOutcome::new(task, FetchStatus::Cancelled);
    };
    if cancel.is_cancelled() {
        return FetchOutcome::new(task, FetchStatus::Cancelled);
    }

    let result = source
        .fetch_and_store(cancel, task.partition(), task.target_count())
        .await;
    let status = match result {
        Ok(fetched) => {
            tracing::debug!(
                partition = %task.partition(),
                target = task.target_count(),
                fetched,
                "fetch completed"
            );
            FetchStatus::Fetched(fetched)
        }
        Err(FetchError::Cancelled) => {
            tracing::debug!(partition = %task.partition(), "fetch cancelled in flight");
            FetchStatus::Cancelled
        }
        Err(e) => {
            tracing::warn!(partition = %task.partition(), error = %e, "fetch failed");
            FetchStatus::Failed(e.to_string())
        }
    };
    FetchOutcome::new(task, status)
}
