//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod fake_source;
pub mod lead_server;

use leadpop_core::catalog::Partition;
use leadpop_core::store::{LeadDb, NewLead};

/// In-memory lead database seeded with `n` leads per (industry, country).
pub async fn seeded_db(parts: &[(&str, &str, usize)]) -> LeadDb {
    let db = LeadDb::open_in_memory().await.expect("open in-memory db");
    for (industry, country, n) in parts {
        let leads: Vec<NewLead> = (0..*n)
            .map(|i| NewLead::named(format!("{industry} {country} #{i}")))
            .collect();
        db.insert_leads(&Partition::new(*industry, *country), &leads, "seed")
            .await
            .expect("seed leads");
    }
    db
}
