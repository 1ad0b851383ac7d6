//! `leadpop stats` – population report.

use anyhow::Result;
use leadpop_core::catalog::PartitionCatalog;
use leadpop_core::config::LeadpopConfig;
use leadpop_core::stats;
use leadpop_core::store::{LeadDb, VolumeEntry};

pub async fn run_stats(
    db: &LeadDb,
    cfg: &LeadpopConfig,
    json: bool,
    top: Option<usize>,
) -> Result<()> {
    let catalog = PartitionCatalog::from_config(&cfg.catalog);
    let top_n = top.unwrap_or(cfg.jobs.stats.top_n);
    let snapshot = stats::summarize(db, &catalog, top_n).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Total leads:       {}", snapshot.total_leads);
    println!("Partitions:        {}", snapshot.total_partitions);
    println!(
        "Catalog coverage:  {} / {} ({:.1}%)",
        snapshot.covered_partitions,
        snapshot.catalog_partitions,
        snapshot.coverage() * 100.0
    );
    print_volume("INDUSTRY", &snapshot.top_industries);
    print_volume("COUNTRY", &snapshot.top_countries);
    Ok(())
}

fn print_volume(heading: &str, entries: &[VolumeEntry]) {
    println!();
    if entries.is_empty() {
        println!("{:<20} -", heading);
        return;
    }
    println!("{:<20} {}", heading, "LEADS");
    for e in entries {
        println!("{:<20} {}", e.key, e.leads);
    }
}
