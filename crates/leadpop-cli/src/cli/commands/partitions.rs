//! `leadpop partitions` – catalog partitions and their stored counts.

use anyhow::Result;
use leadpop_core::catalog::PartitionCatalog;
use leadpop_core::config::LeadpopConfig;
use leadpop_core::store::LeadDb;
use std::collections::HashMap;

pub async fn run_partitions(db: &LeadDb, cfg: &LeadpopConfig) -> Result<()> {
    let catalog = PartitionCatalog::from_config(&cfg.catalog);
    let counts: HashMap<_, _> = db
        .partition_counts()
        .await?
        .into_iter()
        .map(|pc| (pc.partition, pc.lead_count))
        .collect();

    println!("{:<28} {}", "PARTITION", "LEADS");
    let mut outside = counts.len();
    for partition in catalog.all_partitions() {
        let n = counts.get(&partition).copied().unwrap_or(0);
        if n > 0 {
            outside -= 1;
        }
        println!("{:<28} {}", partition.to_string(), n);
    }
    println!(
        "{} industries x {} countries = {} partitions",
        catalog.industries().len(),
        catalog.countries().len(),
        catalog.len()
    );
    if outside > 0 {
        println!("{} stored partition(s) are not in the catalog", outside);
    }
    Ok(())
}
