//! CLI command handlers, one file per command.

mod completions;
mod detect;
mod partitions;
mod populate;
mod serve;
mod stats;

pub use completions::run_completions;
pub use detect::run_detect;
pub use partitions::run_partitions;
pub use populate::{run_populate_low, run_populate_missing, PopulateOverrides};
pub use serve::run_serve;
pub use stats::run_stats;

use leadpop_core::catalog::PartitionCatalog;
use leadpop_core::config::LeadpopConfig;
use leadpop_core::scheduler::Orchestrator;
use leadpop_core::source::HttpLeadSource;
use leadpop_core::store::LeadDb;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Wires the lead database, the HTTP source, and the configured catalog together.
fn build_orchestrator(db: LeadDb, cfg: &LeadpopConfig) -> Orchestrator {
    let source = Arc::new(HttpLeadSource::new(db.clone(), cfg.source.clone()));
    Orchestrator::new(
        Arc::new(db),
        PartitionCatalog::from_config(&cfg.catalog),
        source,
        cfg.jobs.clone(),
    )
}

/// Cancels `cancel` on the first Ctrl-C. Abort the handle once the work is done.
fn cancel_on_ctrl_c(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted; cancelling outstanding fetches...");
            cancel.cancel();
        }
    })
}
