//! Population report: totals, coverage, and top industries/countries by volume.
//!
//! Read-only; used for observability, never for scheduling decisions.

use serde::Serialize;
use std::collections::HashSet;

use crate::catalog::PartitionCatalog;
use crate::store::{LeadStore, StoreError, VolumeEntry};

/// Snapshot of how well the directory is populated.
#[derive(Debug, Clone, Serialize)]
pub struct PopulationStats {
    pub total_leads: i64,
    /// Distinct partitions holding at least one lead (catalog or not).
    pub total_partitions: usize,
    pub top_industries: Vec<VolumeEntry>,
    pub top_countries: Vec<VolumeEntry>,
    /// Size of the configured partition universe.
    pub catalog_partitions: usize,
    /// Catalog partitions holding at least one lead.
    pub covered_partitions: usize,
}

impl PopulationStats {
    /// Fraction of the catalog with at least one lead (1.0 for an empty catalog).
    pub fn coverage(&self) -> f64 {
        if self.catalog_partitions == 0 {
            return 1.0;
        }
        self.covered_partitions as f64 / self.catalog_partitions as f64
    }
}

pub async fn summarize<S: LeadStore + ?Sized>(
    store: &S,
    catalog: &PartitionCatalog,
    top_n: usize,
) -> Result<PopulationStats, StoreError> {
    let counts = store.partition_counts().await?;
    let total_leads = store.total_leads().await?;
    let top_industries = store.top_industries(top_n).await?;
    let top_countries = store.top_countries(top_n).await?;

    let present: HashSet<_> = counts.iter().map(|pc| &pc.partition).collect();
    let covered_partitions = catalog
        .all_partitions()
        .iter()
        .filter(|p| present.contains(p))
        .count();

    Ok(PopulationStats {
        total_leads,
        total_partitions: counts.len(),
        top_industries,
        top_countries,
        catalog_partitions: catalog.len(),
        covered_partitions,
    })
}
