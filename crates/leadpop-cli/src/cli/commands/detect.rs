//! `leadpop detect low|missing` – show scarce partitions without fetching.

use anyhow::{bail, Result};
use leadpop_core::catalog::PartitionCatalog;
use leadpop_core::config::LeadpopConfig;
use leadpop_core::detect::{select_top, ScarcityDetector};
use leadpop_core::store::LeadDb;

use crate::cli::DetectKind;

pub async fn run_detect(
    db: &LeadDb,
    cfg: &LeadpopConfig,
    kind: DetectKind,
    threshold: Option<i64>,
) -> Result<()> {
    let catalog = PartitionCatalog::from_config(&cfg.catalog);
    let detector = ScarcityDetector::new(db, &catalog);

    match kind {
        DetectKind::Low => {
            let threshold = threshold.unwrap_or(cfg.jobs.low_data.threshold);
            if threshold <= 0 {
                bail!("threshold must be > 0 (got {})", threshold);
            }
            let ranked = detector.detect_low_data(threshold).await?;
            if ranked.is_empty() {
                println!("No partitions below {} leads.", threshold);
                return Ok(());
            }
            let picked = select_top(&ranked, cfg.jobs.low_data.top_k).len();
            println!("{:<28} {}", "PARTITION", "LEADS");
            for (i, pc) in ranked.iter().enumerate() {
                let mark = if i < picked { "*" } else { "" };
                println!("{:<28} {}{}", pc.partition.to_string(), pc.lead_count, mark);
            }
            println!(
                "{} partition(s) below {}; * = next {} to populate",
                ranked.len(),
                threshold,
                picked
            );
        }
        DetectKind::Missing => {
            let floor = cfg.jobs.missing.missing_floor;
            let missing = detector.detect_missing_below(floor).await?;
            if missing.is_empty() {
                println!("Every catalog partition has leads.");
                return Ok(());
            }
            let picked = select_top(&missing, cfg.jobs.missing.top_k).len();
            for (i, partition) in missing.iter().enumerate() {
                let mark = if i < picked { " *" } else { "" };
                println!("{}{}", partition, mark);
            }
            println!(
                "{} of {} catalog partition(s) missing; * = next {} to populate",
                missing.len(),
                catalog.len(),
                picked
            );
        }
    }
    Ok(())
}
