//! `leadpop populate-low` / `leadpop populate-missing` – run one population job now.

use anyhow::{bail, Context, Result};
use leadpop_core::batch::FetchStatus;
use leadpop_core::config::LeadpopConfig;
use leadpop_core::scheduler::{JobKind, JobOutcome, JobReport};
use leadpop_core::store::LeadDb;
use tokio_util::sync::CancellationToken;

use super::{build_orchestrator, cancel_on_ctrl_c};

/// Command-line values that replace the configured job parameters for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopulateOverrides {
    pub threshold: Option<i64>,
    pub top: Option<usize>,
    pub concurrency: Option<usize>,
}

pub async fn run_populate_low(
    db: LeadDb,
    cfg: &LeadpopConfig,
    overrides: PopulateOverrides,
) -> Result<()> {
    let mut cfg = cfg.clone();
    let job = &mut cfg.jobs.low_data;
    if let Some(threshold) = overrides.threshold {
        job.threshold = threshold;
    }
    if let Some(top) = overrides.top {
        job.top_k = top;
    }
    if let Some(concurrency) = overrides.concurrency {
        job.max_concurrent = concurrency;
    }
    run_once(db, cfg, JobKind::LowData).await
}

pub async fn run_populate_missing(
    db: LeadDb,
    cfg: &LeadpopConfig,
    overrides: PopulateOverrides,
) -> Result<()> {
    let mut cfg = cfg.clone();
    let job = &mut cfg.jobs.missing;
    if let Some(top) = overrides.top {
        job.top_k = top;
    }
    if let Some(concurrency) = overrides.concurrency {
        job.max_concurrent = concurrency;
    }
    run_once(db, cfg, JobKind::Missing).await
}

async fn run_once(db: LeadDb, cfg: LeadpopConfig, kind: JobKind) -> Result<()> {
    cfg.validate().context("invalid job parameters")?;
    let orchestrator = build_orchestrator(db, &cfg);

    let cancel = CancellationToken::new();
    let watcher = cancel_on_ctrl_c(cancel.clone());
    let outcome = orchestrator.run_with_budget_until(kind, &cancel).await;
    watcher.abort();

    let report = match outcome? {
        JobOutcome::Populated(report) => report,
        JobOutcome::Stats(_) => bail!("{}: unexpected stats outcome", kind),
    };
    print_report(&report);
    if let Some(err) = report.batch.error() {
        return Err(err.into());
    }
    Ok(())
}

fn print_report(report: &JobReport) {
    println!(
        "{}: {} candidate partition(s), {} selected",
        report.job,
        report.candidates,
        report.selected.len()
    );
    if report.batch.is_empty() {
        println!("Nothing to populate.");
        return;
    }

    println!("{:<28} {:<8} {}", "PARTITION", "TARGET", "RESULT");
    for outcome in &report.batch.outcomes {
        let result = match &outcome.status {
            FetchStatus::Fetched(n) if *n < outcome.target => format!("fetched {n} (short)"),
            FetchStatus::Fetched(n) => format!("fetched {n}"),
            FetchStatus::Failed(reason) => format!("failed: {reason}"),
            FetchStatus::Cancelled => "cancelled".to_string(),
        };
        println!(
            "{:<28} {:<8} {}",
            outcome.partition.to_string(),
            outcome.target,
            result
        );
    }

    let batch = &report.batch;
    println!(
        "{} succeeded ({} short), {} failed, {} cancelled; {} leads in {:.1}s",
        batch.succeeded(),
        batch.short(),
        batch.failed(),
        batch.cancelled(),
        batch.total_fetched(),
        report.elapsed.as_secs_f64()
    );
}
