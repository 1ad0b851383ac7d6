//! Aggregate reads: per-partition counts, totals, volume rankings.

use sqlx::Row;

use super::super::db::LeadDb;
use super::super::types::{VolumeAxis, VolumeEntry};
use super::super::StoreError;
use crate::catalog::{Partition, PartitionCount};

impl LeadDb {
    /// All stored leads grouped by (industry, country), smallest count first.
    pub async fn partition_counts(&self) -> Result<Vec<PartitionCount>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT industry, country, COUNT(*) AS lead_count
            FROM leads
            GROUP BY industry, country
            ORDER BY lead_count ASC, industry ASC, country ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let partition = Partition {
                industry: row.get("industry"),
                country: row.get("country"),
            };
            let lead_count: i64 = row.get("lead_count");
            if lead_count < 0 {
                return Err(StoreError::NegativeCount(partition));
            }
            out.push(PartitionCount {
                partition,
                lead_count,
            });
        }
        Ok(out)
    }

    /// Number of stored leads for one partition (0 when absent).
    pub async fn count_for(&self, partition: &Partition) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS lead_count
            FROM leads
            WHERE industry = ?1 AND country = ?2
            "#,
        )
        .bind(&partition.industry)
        .bind(&partition.country)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("lead_count"))
    }

    pub async fn total_leads(&self) -> Result<i64, StoreError> {
        let row = sqlx::query(r#"SELECT COUNT(*) AS lead_count FROM leads"#)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("lead_count"))
    }

    pub(crate) async fn top_by_column(
        &self,
        axis: VolumeAxis,
        limit: usize,
    ) -> Result<Vec<VolumeEntry>, StoreError> {
        // Column name comes from a closed enum, never from input.
        let sql = format!(
            "SELECT {col} AS volume_key, COUNT(*) AS lead_count FROM leads \
             GROUP BY {col} ORDER BY lead_count DESC, {col} ASC LIMIT ?1",
            col = axis.column()
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| VolumeEntry {
                key: row.get("volume_key"),
                leads: row.get("lead_count"),
            })
            .collect())
    }
}
