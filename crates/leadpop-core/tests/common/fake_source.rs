//! Instrumented lead source: records calls, in-flight high-water mark,
//! forced failures, and an optional per-call delay.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use leadpop_core::catalog::Partition;
use leadpop_core::source::{FetchError, LeadSource};
use leadpop_core::store::{LeadDb, NewLead};

#[derive(Default)]
pub struct FakeSource {
    delay: Duration,
    /// Partitions whose fetch always fails.
    failing: HashSet<Partition>,
    /// Leads returned per call (None = the full target).
    yield_per_call: Option<u32>,
    /// Fetched leads are written here when set.
    db: Option<LeadDb>,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    calls: Mutex<Vec<Partition>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_on(mut self, partition: Partition) -> Self {
        self.failing.insert(partition);
        self
    }

    pub fn yielding(mut self, per_call: u32) -> Self {
        self.yield_per_call = Some(per_call);
        self
    }

    pub fn storing_into(mut self, db: LeadDb) -> Self {
        self.db = Some(db);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<Partition> {
        self.calls.lock().unwrap().clone()
    }

    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeadSource for FakeSource {
    async fn fetch_and_store(
        &self,
        cancel: &CancellationToken,
        partition: &Partition,
        target: u32,
    ) -> Result<u32, FetchError> {
        self.calls.lock().unwrap().push(partition.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        let result: Result<u32, FetchError> = async {
            if !self.delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
            if self.failing.contains(partition) {
                return Err(FetchError::Http { status: 503 });
            }
            let n = self.yield_per_call.unwrap_or(target).min(target);
            if let Some(db) = &self.db {
                let leads: Vec<NewLead> = (0..n)
                    .map(|i| NewLead::named(format!("fetched {partition} #{i}")))
                    .collect();
                db.insert_leads(partition, &leads, "fake").await?;
            }
            Ok(n)
        }
        .await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
