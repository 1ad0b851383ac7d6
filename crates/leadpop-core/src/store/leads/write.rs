//! Lead writes: batch insert for one partition.

use super::super::db::{unix_timestamp, LeadDb};
use super::super::types::NewLead;
use super::super::StoreError;
use crate::catalog::Partition;

impl LeadDb {
    /// Insert `leads` under `partition` in one transaction. Returns the number of rows written.
    pub async fn insert_leads(
        &self,
        partition: &Partition,
        leads: &[NewLead],
        source: &str,
    ) -> Result<u64, StoreError> {
        if leads.is_empty() {
            return Ok(0);
        }
        let now = unix_timestamp();
        let mut tx = self.pool.begin().await?;
        let mut written = 0u64;
        for lead in leads {
            written += sqlx::query(
                r#"
                INSERT INTO leads (
                    industry, country, name, address, phone, website, source, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&partition.industry)
            .bind(&partition.country)
            .bind(&lead.name)
            .bind(&lead.address)
            .bind(&lead.phone)
            .bind(&lead.website)
            .bind(source)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;
        Ok(written)
    }
}
