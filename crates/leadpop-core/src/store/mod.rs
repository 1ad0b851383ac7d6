//! Lead database (SQLite via sqlx).
//!
//! Holds the stored leads partitioned by (industry, country). The orchestration
//! engine only reads aggregate counts from it; lead sources write to it.

pub mod db;
mod leads;
pub mod types;


use async_trait::async_trait;

use crate::catalog::{Partition, PartitionCount};

pub use db::LeadDb;
pub use types::*;
use types::VolumeAxis;

/// Store failure. Detection and stats propagate it verbatim; no local retry.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("lead store query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("lead store returned a negative count for {0}")]
    NegativeCount(Partition),
}

/// Read shapes the orchestration engine needs from a lead store.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// All stored leads grouped by partition. Partitions with no rows are absent.
    async fn partition_counts(&self) -> Result<Vec<PartitionCount>, StoreError>;

    /// Number of stored leads for one partition (0 when absent).
    async fn count_for(&self, partition: &Partition) -> Result<i64, StoreError>;

    async fn total_leads(&self) -> Result<i64, StoreError>;

    /// Industries by stored volume, largest first, ties by name.
    async fn top_industries(&self, limit: usize) -> Result<Vec<VolumeEntry>, StoreError>;

    /// Countries by stored volume, largest first, ties by code.
    async fn top_countries(&self, limit: usize) -> Result<Vec<VolumeEntry>, StoreError>;
}

#[async_trait]
impl LeadStore for LeadDb {
    async fn partition_counts(&self) -> Result<Vec<PartitionCount>, StoreError> {
        LeadDb::partition_counts(self).await
    }

    async fn count_for(&self, partition: &Partition) -> Result<i64, StoreError> {
        LeadDb::count_for(self, partition).await
    }

    async fn total_leads(&self) -> Result<i64, StoreError> {
        LeadDb::total_leads(self).await
    }

    async fn top_industries(&self, limit: usize) -> Result<Vec<VolumeEntry>, StoreError> {
        LeadDb::top_by_column(self, VolumeAxis::Industry, limit).await
    }

    async fn top_countries(&self, limit: usize) -> Result<Vec<VolumeEntry>, StoreError> {
        LeadDb::top_by_column(self, VolumeAxis::Country, limit).await
    }
}
