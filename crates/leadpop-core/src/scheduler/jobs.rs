//! The three population jobs and their manual entry points.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::batch::{run_batch, BatchResult, FetchTask};
use crate::catalog::{Partition, PartitionCatalog};
use crate::config::{JobsConfig, LowDataJob, MissingJob};
use crate::detect::{select_top, ScarcityDetector};
use crate::source::LeadSource;
use crate::stats::{self, PopulationStats};
use crate::store::{LeadStore, StoreError};

/// Scheduled job identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JobKind {
    LowData,
    Missing,
    Stats,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [JobKind::LowData, JobKind::Missing, JobKind::Stats];

    pub fn name(self) -> &'static str {
        match self {
            JobKind::LowData => "low-data-population",
            JobKind::Missing => "missing-population",
            JobKind::Stats => "stats-report",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A job's token fired (budget expired or caller cancelled) while it was reading the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{job}: cancelled during {step}")]
pub struct JobCancelled {
    pub job: JobKind,
    pub step: &'static str,
}

/// Runs one store read unless `cancel` fires first.
async fn read_or_cancel<T>(
    job: JobKind,
    step: &'static str,
    cancel: &CancellationToken,
    read: impl Future<Output = Result<T, StoreError>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::warn!(job = job.name(), step, "store read abandoned: job cancelled");
            Err(JobCancelled { job, step }.into())
        }
        res = read => Ok(res?),
    }
}

/// What one detect-and-populate cycle did.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job: JobKind,
    /// Partitions the detector reported before top-K selection.
    pub candidates: usize,
    pub selected: Vec<Partition>,
    pub batch: BatchResult,
    #[serde(skip)]
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub enum JobOutcome {
    Populated(JobReport),
    Stats(PopulationStats),
}

/// Binds store, catalog, and source to the population jobs.
///
/// Each call recomputes scarcity from current store state; nothing is kept
/// between cycles.
pub struct Orchestrator {
    store: Arc<dyn LeadStore>,
    catalog: PartitionCatalog,
    source: Arc<dyn LeadSource>,
    jobs: JobsConfig,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn LeadStore>,
        catalog: PartitionCatalog,
        source: Arc<dyn LeadSource>,
        jobs: JobsConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            source,
            jobs,
        }
    }

    pub fn jobs(&self) -> &JobsConfig {
        &self.jobs
    }

    pub fn detector(&self) -> ScarcityDetector<'_, dyn LeadStore> {
        ScarcityDetector::new(self.store.as_ref(), &self.catalog)
    }

    pub fn timeout_for(&self, kind: JobKind) -> Duration {
        match kind {
            JobKind::LowData => self.jobs.low_data_timeout(),
            JobKind::Missing => self.jobs.missing_timeout(),
            JobKind::Stats => self.jobs.stats_timeout(),
        }
    }

    /// Runs one job with its configured parameters.
    pub async fn run_job(&self, kind: JobKind, cancel: &CancellationToken) -> Result<JobOutcome> {
        match kind {
            JobKind::LowData => self
                .populate_low_data(cancel, &self.jobs.low_data)
                .await
                .map(JobOutcome::Populated),
            JobKind::Missing => self
                .populate_missing(cancel, &self.jobs.missing)
                .await
                .map(JobOutcome::Populated),
            JobKind::Stats => self
                .report_stats(cancel, self.jobs.stats.top_n)
                .await
                .map(JobOutcome::Stats),
        }
    }

    /// Runs one job under its timeout budget. When the budget elapses the job's
    /// token is cancelled: pending store reads are abandoned, unstarted fetches are
    /// skipped, and in-flight fetches see the token before the work is awaited.
    pub async fn run_with_budget(&self, kind: JobKind) -> Result<JobOutcome> {
        self.run_with_budget_until(kind, &CancellationToken::new()).await
    }

    /// Like [`run_with_budget`](Self::run_with_budget); cancelling `parent` also stops the job.
    pub async fn run_with_budget_until(
        &self,
        kind: JobKind,
        parent: &CancellationToken,
    ) -> Result<JobOutcome> {
        let budget = self.timeout_for(kind);
        let cancel = parent.child_token();
        let work = self.run_job(kind, &cancel);
        tokio::pin!(work);
        tokio::select! {
            res = &mut work => res,
            _ = tokio::time::sleep(budget) => {
                tracing::warn!(
                    job = kind.name(),
                    budget_secs = budget.as_secs_f64(),
                    "job exceeded its timeout budget; cancelling"
                );
                cancel.cancel();
                work.await
            }
        }
    }

    /// Detect partitions below `params.threshold`, take the scarcest `top_k`,
    /// and fetch `target_count` leads for each.
    pub async fn populate_low_data(
        &self,
        cancel: &CancellationToken,
        params: &LowDataJob,
    ) -> Result<JobReport> {
        let kind = JobKind::LowData;
        let started = Instant::now();
        tracing::info!(
            job = kind.name(),
            threshold = params.threshold,
            top_k = params.top_k,
            max_concurrent = params.max_concurrent,
            target_count = params.target_count,
            "job started"
        );

        let detector = self.detector();
        let ranked = read_or_cancel(
            kind,
            "detection",
            cancel,
            detector.detect_low_data(params.threshold),
        )
        .await
        .with_context(|| {
            format!(
                "{}: detect low-data partitions (threshold={})",
                kind, params.threshold
            )
        })?;
        let selected: Vec<Partition> = select_top(&ranked, params.top_k)
            .into_iter()
            .map(|pc| pc.partition)
            .collect();

        self.populate(
            kind,
            cancel,
            ranked.len(),
            selected,
            params.target_count,
            params.max_concurrent,
            started,
        )
        .await
    }

    /// Detect catalog partitions below `params.missing_floor`, take the first
    /// `top_k` in catalog order, and fetch `target_count` leads for each.
    pub async fn populate_missing(
        &self,
        cancel: &CancellationToken,
        params: &MissingJob,
    ) -> Result<JobReport> {
        let kind = JobKind::Missing;
        let started = Instant::now();
        tracing::info!(
            job = kind.name(),
            missing_floor = params.missing_floor,
            top_k = params.top_k,
            max_concurrent = params.max_concurrent,
            target_count = params.target_count,
            catalog = self.catalog.len(),
            "job started"
        );

        let detector = self.detector();
        let ranked = read_or_cancel(
            kind,
            "detection",
            cancel,
            detector.detect_missing_below(params.missing_floor),
        )
        .await
        .with_context(|| {
            format!(
                "{}: detect missing partitions (floor={})",
                kind, params.missing_floor
            )
        })?;
        let selected = select_top(&ranked, params.top_k);

        self.populate(
            kind,
            cancel,
            ranked.len(),
            selected,
            params.target_count,
            params.max_concurrent,
            started,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn populate(
        &self,
        kind: JobKind,
        cancel: &CancellationToken,
        candidates: usize,
        selected: Vec<Partition>,
        target_count: i64,
        max_concurrent: usize,
        started: Instant,
    ) -> Result<JobReport> {
        let tasks = FetchTask::for_partitions(selected.iter().cloned(), target_count)
            .with_context(|| format!("{}: build fetch tasks", kind))?;
        tracing::debug!(
            job = kind.name(),
            candidates,
            selected = tasks.len(),
            "partitions selected"
        );

        let batch = run_batch(cancel, Arc::clone(&self.source), tasks, max_concurrent).await;
        if let Some(err) = batch.error() {
            tracing::warn!(job = kind.name(), error = %err, "batch finished with failures");
        }

        let report = JobReport {
            job: kind,
            candidates,
            selected,
            batch,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            job = kind.name(),
            candidates = report.candidates,
            selected = report.selected.len(),
            succeeded = report.batch.succeeded(),
            failed = report.batch.failed(),
            cancelled = report.batch.cancelled(),
            fetched = report.batch.total_fetched(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "job finished"
        );
        Ok(report)
    }

    /// Reads and logs a population snapshot. Abandoned if `cancel` fires first.
    pub async fn report_stats(
        &self,
        cancel: &CancellationToken,
        top_n: usize,
    ) -> Result<PopulationStats> {
        let kind = JobKind::Stats;
        tracing::info!(job = kind.name(), top_n, "job started");
        let snapshot = read_or_cancel(
            kind,
            "summary",
            cancel,
            stats::summarize(self.store.as_ref(), &self.catalog, top_n),
        )
        .await
        .with_context(|| format!("{}: summarize (top_n={})", kind, top_n))?;
        tracing::info!(
            job = kind.name(),
            total_leads = snapshot.total_leads,
            total_partitions = snapshot.total_partitions,
            covered = snapshot.covered_partitions,
            catalog = snapshot.catalog_partitions,
            coverage = snapshot.coverage(),
            top_industry = snapshot.top_industries.first().map(|e| e.key.as_str()).unwrap_or("-"),
            top_country = snapshot.top_countries.first().map(|e| e.key.as_str()).unwrap_or("-"),
            "population snapshot"
        );
        Ok(snapshot)
    }
}
