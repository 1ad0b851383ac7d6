//! `leadpop serve` – run the scheduled jobs until Ctrl-C.

use anyhow::{Context, Result};
use leadpop_core::config::LeadpopConfig;
use leadpop_core::logging;
use leadpop_core::scheduler::Scheduler;
use leadpop_core::store::LeadDb;
use leadpop_core::tasks::BackgroundTasks;
use std::sync::Arc;

use super::build_orchestrator;

pub async fn run_serve(db: LeadDb, cfg: &LeadpopConfig) -> Result<()> {
    let orchestrator = Arc::new(build_orchestrator(db, cfg));
    let tasks = BackgroundTasks::new(cfg.pool.max_background_tasks);
    let mut scheduler = Scheduler::new(orchestrator, tasks).await?;
    scheduler.start().await?;

    let jobs = &cfg.jobs;
    println!("leadpop running. Ctrl-C to stop.");
    println!("  low-data population  {}", jobs.low_data.schedule);
    println!("  missing population   {}", jobs.missing.schedule);
    println!("  stats report         {}", jobs.stats.schedule);
    if let Ok(path) = logging::log_path() {
        println!("  log                  {}", path.display());
    }

    let signal = tokio::signal::ctrl_c().await;
    println!("Stopping; waiting for running jobs to finish...");
    scheduler.stop().await?;
    signal.context("wait for Ctrl-C")?;
    Ok(())
}
