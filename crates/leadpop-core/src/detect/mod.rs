//! Scarcity detection and priority selection.
//!
//! Two read-only analyses over the lead store: partitions that exist but are
//! under-populated ("low data"), and catalog partitions the store does not hold
//! at all ("missing"). Both orders are total so top-K selection is deterministic.

use std::collections::HashMap;

use crate::catalog::{Partition, PartitionCatalog, PartitionCount};
use crate::store::{LeadStore, StoreError};


/// Ranks partitions by scarcity using fresh counts from `store`.
pub struct ScarcityDetector<'a, S: LeadStore + ?Sized> {
    store: &'a S,
    catalog: &'a PartitionCatalog,
}

impl<'a, S: LeadStore + ?Sized> ScarcityDetector<'a, S> {
    pub fn new(store: &'a S, catalog: &'a PartitionCatalog) -> Self {
        Self { store, catalog }
    }

    /// Stored partitions with fewer than `threshold` leads, ascending by count
    /// (ties by partition). Absent partitions are not reported here.
    pub async fn detect_low_data(&self, threshold: i64) -> Result<Vec<PartitionCount>, StoreError> {
        let mut low: Vec<PartitionCount> = self
            .store
            .partition_counts()
            .await?
            .into_iter()
            .filter(|pc| pc.lead_count > 0 && pc.lead_count < threshold)
            .collect();
        low.sort_by(|a, b| {
            a.lead_count
                .cmp(&b.lead_count)
                .then_with(|| a.partition.cmp(&b.partition))
        });
        tracing::debug!(threshold, found = low.len(), "low-data partitions detected");
        Ok(low)
    }

    /// Catalog partitions with no stored leads, in catalog order.
    pub async fn detect_missing(&self) -> Result<Vec<Partition>, StoreError> {
        self.detect_missing_below(1).await
    }

    /// Catalog partitions holding fewer than `floor` leads (absent counts as 0), in catalog order.
    pub async fn detect_missing_below(&self, floor: i64) -> Result<Vec<Partition>, StoreError> {
        let present: HashMap<Partition, i64> = self
            .store
            .partition_counts()
            .await?
            .into_iter()
            .map(|pc| (pc.partition, pc.lead_count))
            .collect();
        let missing: Vec<Partition> = self
            .catalog
            .all_partitions()
            .into_iter()
            .filter(|p| present.get(p).copied().unwrap_or(0) < floor)
            .collect();
        tracing::debug!(
            floor,
            catalog = self.catalog.len(),
            found = missing.len(),
            "missing partitions detected"
        );
        Ok(missing)
    }
}

/// First `k` entries of an already-ranked sequence (all of it when shorter).
pub fn select_top<T: Clone>(ranked: &[T], k: usize) -> Vec<T> {
    ranked.iter().take(k).cloned().collect()
}
