//! Integration tests: detect-and-populate jobs over a seeded store and a fake source.

mod common;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use common::fake_source::FakeSource;
use common::seeded_db;
use leadpop_core::catalog::{Partition, PartitionCatalog, PartitionCount};
use leadpop_core::config::{JobsConfig, LowDataJob, MissingJob};
use leadpop_core::scheduler::{JobCancelled, JobKind, JobOutcome, Orchestrator};
use leadpop_core::source::LeadSource;
use leadpop_core::store::{LeadDb, LeadStore, StoreError, VolumeEntry};

fn orchestrator(
    db: LeadDb,
    catalog: PartitionCatalog,
    source: &Arc<FakeSource>,
    jobs: JobsConfig,
) -> Orchestrator {
    Orchestrator::new(
        Arc::new(db),
        catalog,
        Arc::clone(source) as Arc<dyn LeadSource>,
        jobs,
    )
}

fn low_data(threshold: i64, top_k: usize, max_concurrent: usize, target: i64) -> LowDataJob {
    LowDataJob {
        threshold,
        top_k,
        max_concurrent,
        target_count: target,
        ..LowDataJob::default()
    }
}

fn missing(top_k: usize, max_concurrent: usize, target: i64) -> MissingJob {
    MissingJob {
        top_k,
        max_concurrent,
        target_count: target,
        ..MissingJob::default()
    }
}

#[tokio::test]
async fn low_data_job_selects_sparse_partition_only() {
    let db = seeded_db(&[("tattoo", "US", 5), ("gym", "US", 250)]).await;
    let catalog = PartitionCatalog::new(["tattoo", "gym", "spa"], ["US"]);
    let source = FakeSource::new().into_arc();
    let orch = orchestrator(db, catalog, &source, JobsConfig::default());

    let report = orch
        .populate_low_data(&CancellationToken::new(), &low_data(100, 10, 3, 1000))
        .await
        .unwrap();

    assert_eq!(report.job, JobKind::LowData);
    assert_eq!(report.candidates, 1);
    assert_eq!(report.selected, vec![Partition::new("tattoo", "US")]);
    assert_eq!(source.calls(), vec![Partition::new("tattoo", "US")]);
    assert_eq!(report.batch.succeeded(), 1);
    assert_eq!(report.batch.outcomes[0].target, 1000);
}

#[tokio::test]
async fn low_data_job_takes_scarcest_top_k_under_ceiling() {
    let seeds: Vec<(String, usize)> = (0..12).map(|i| (format!("trade{i:02}"), i + 1)).collect();
    let parts: Vec<(&str, &str, usize)> = seeds
        .iter()
        .map(|(industry, n)| (industry.as_str(), "US", *n))
        .collect();
    let db = seeded_db(&parts).await;
    let catalog = PartitionCatalog::new(seeds.iter().map(|(i, _)| i.as_str()), ["US"]);
    let source = FakeSource::new()
        .with_delay(Duration::from_millis(15))
        .into_arc();
    let orch = orchestrator(db, catalog, &source, JobsConfig::default());

    let report = orch
        .populate_low_data(&CancellationToken::new(), &low_data(100, 10, 3, 1000))
        .await
        .unwrap();

    assert_eq!(report.candidates, 12);
    let expected: Vec<Partition> = (0..10)
        .map(|i| Partition::new(format!("trade{i:02}"), "US"))
        .collect();
    assert_eq!(report.selected, expected);
    assert_eq!(source.call_count(), 10);
    assert!(source.high_water() <= 3);
    assert_eq!(report.batch.succeeded(), 10);
}

#[tokio::test]
async fn top_k_zero_selects_nothing() {
    let db = seeded_db(&[("tattoo", "US", 5)]).await;
    let catalog = PartitionCatalog::new(["tattoo", "spa"], ["US"]);
    let source = FakeSource::new().into_arc();
    let orch = orchestrator(db, catalog, &source, JobsConfig::default());

    let cancel = CancellationToken::new();
    let low = orch
        .populate_low_data(&cancel, &low_data(100, 0, 3, 10))
        .await
        .unwrap();
    let miss = orch.populate_missing(&cancel, &missing(0, 3, 10)).await.unwrap();

    assert_eq!(low.candidates, 1);
    assert!(low.selected.is_empty());
    assert_eq!(miss.candidates, 1);
    assert!(miss.batch.is_empty());
    assert_eq!(source.call_count(), 0);
}

#[tokio::test]
async fn missing_job_fills_absent_partitions_and_recomputes_each_cycle() {
    let db = seeded_db(&[("tattoo", "US", 5), ("gym", "US", 250)]).await;
    let catalog = PartitionCatalog::new(["tattoo", "gym", "spa"], ["US"]);
    let source = FakeSource::new().storing_into(db.clone()).into_arc();
    let orch = orchestrator(db.clone(), catalog, &source, JobsConfig::default());
    let cancel = CancellationToken::new();

    let first = orch.populate_missing(&cancel, &missing(20, 5, 7)).await.unwrap();
    assert_eq!(first.job, JobKind::Missing);
    assert_eq!(first.selected, vec![Partition::new("spa", "US")]);
    assert_eq!(first.batch.total_fetched(), 7);
    assert_eq!(db.count_for(&Partition::new("spa", "US")).await.unwrap(), 7);

    let second = orch.populate_missing(&cancel, &missing(20, 5, 7)).await.unwrap();
    assert_eq!(second.candidates, 0);
    assert!(second.batch.is_empty());
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn missing_job_keeps_catalog_order() {
    let db = seeded_db(&[("gym", "CA", 1)]).await;
    let catalog = PartitionCatalog::new(["spa", "gym"], ["US", "CA"]);
    let source = FakeSource::new().into_arc();
    let orch = orchestrator(db, catalog, &source, JobsConfig::default());

    let report = orch
        .populate_missing(&CancellationToken::new(), &missing(2, 1, 10))
        .await
        .unwrap();

    assert_eq!(report.candidates, 3);
    assert_eq!(
        report.selected,
        vec![Partition::new("spa", "US"), Partition::new("spa", "CA")]
    );
}

#[tokio::test]
async fn failing_partition_is_reported_not_raised() {
    let db = seeded_db(&[("tattoo", "US", 5), ("spa", "US", 3)]).await;
    let catalog = PartitionCatalog::new(["tattoo", "spa"], ["US"]);
    let source = FakeSource::new()
        .failing_on(Partition::new("spa", "US"))
        .into_arc();
    let orch = orchestrator(db, catalog, &source, JobsConfig::default());

    let report = orch
        .populate_low_data(&CancellationToken::new(), &low_data(100, 10, 2, 50))
        .await
        .unwrap();

    assert_eq!(report.batch.succeeded(), 1);
    assert_eq!(report.batch.failed(), 1);
    let err = report.batch.error().unwrap();
    assert_eq!(err.failures[0].partition, Partition::new("spa", "US"));
}

#[tokio::test]
async fn stats_job_reports_volume_and_coverage() {
    let db = seeded_db(&[("tattoo", "US", 5), ("gym", "US", 250), ("gym", "CA", 10)]).await;
    let catalog = PartitionCatalog::new(["tattoo", "gym", "spa"], ["US"]);
    let source = FakeSource::new().into_arc();
    let orch = orchestrator(db, catalog, &source, JobsConfig::default());

    let stats = orch
        .report_stats(&CancellationToken::new(), 1)
        .await
        .unwrap();
    assert_eq!(stats.total_leads, 265);
    assert_eq!(stats.total_partitions, 3);
    assert_eq!(stats.catalog_partitions, 3);
    assert_eq!(stats.covered_partitions, 2);
    assert_eq!(
        stats.top_industries,
        vec![VolumeEntry {
            key: "gym".to_string(),
            leads: 260
        }]
    );
    assert_eq!(stats.top_countries[0].key, "US");
    assert_eq!(source.call_count(), 0);
}

#[tokio::test]
async fn run_job_uses_configured_parameters() {
    let db = seeded_db(&[("tattoo", "US", 5)]).await;
    let catalog = PartitionCatalog::new(["tattoo"], ["US"]);
    let source = FakeSource::new().into_arc();
    let jobs = JobsConfig {
        low_data: low_data(10, 5, 1, 42),
        ..JobsConfig::default()
    };
    let orch = orchestrator(db, catalog, &source, jobs);

    match orch
        .run_job(JobKind::LowData, &CancellationToken::new())
        .await
        .unwrap()
    {
        JobOutcome::Populated(report) => {
            assert_eq!(report.selected, vec![Partition::new("tattoo", "US")]);
            assert_eq!(report.batch.outcomes[0].target, 42);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    match orch.run_job(JobKind::Stats, &CancellationToken::new()).await.unwrap() {
        JobOutcome::Stats(stats) => assert_eq!(stats.total_leads, 5),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn budget_expiry_cancels_in_flight_fetches() {
    let db = seeded_db(&[("tattoo", "US", 5)]).await;
    let catalog = PartitionCatalog::new(["tattoo"], ["US"]);
    let source = FakeSource::new()
        .with_delay(Duration::from_secs(30))
        .into_arc();
    let jobs = JobsConfig {
        low_data: LowDataJob {
            timeout_secs: 1,
            ..low_data(100, 10, 3, 10)
        },
        ..JobsConfig::default()
    };
    let orch = orchestrator(db, catalog, &source, jobs);

    let started = Instant::now();
    let outcome = orch.run_with_budget(JobKind::LowData).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));

    let JobOutcome::Populated(report) = outcome else {
        panic!("expected a population report");
    };
    assert_eq!(source.call_count(), 1);
    assert_eq!(report.batch.cancelled(), 1);
}

struct BrokenStore;

#[async_trait]
impl LeadStore for BrokenStore {
    async fn partition_counts(&self) -> Result<Vec<PartitionCount>, StoreError> {
        Err(StoreError::Query(sqlx::Error::PoolClosed))
    }

    async fn count_for(&self, _partition: &Partition) -> Result<i64, StoreError> {
        Err(StoreError::Query(sqlx::Error::PoolClosed))
    }

    async fn total_leads(&self) -> Result<i64, StoreError> {
        Err(StoreError::Query(sqlx::Error::PoolClosed))
    }

    async fn top_industries(&self, _limit: usize) -> Result<Vec<VolumeEntry>, StoreError> {
        Err(StoreError::Query(sqlx::Error::PoolClosed))
    }

    async fn top_countries(&self, _limit: usize) -> Result<Vec<VolumeEntry>, StoreError> {
        Err(StoreError::Query(sqlx::Error::PoolClosed))
    }
}

#[tokio::test]
async fn store_failure_aborts_job_before_any_fetch() {
    let source = FakeSource::new().into_arc();
    let orch = Orchestrator::new(
        Arc::new(BrokenStore),
        PartitionCatalog::new(["tattoo"], ["US"]),
        Arc::clone(&source) as Arc<dyn LeadSource>,
        JobsConfig::default(),
    );
    let cancel = CancellationToken::new();

    let err = orch
        .populate_low_data(&cancel, &low_data(100, 10, 3, 10))
        .await
        .unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("low-data-population"), "{msg}");
    assert!(msg.contains("threshold=100"), "{msg}");
    assert!(err.downcast_ref::<StoreError>().is_some());

    assert!(orch.populate_missing(&cancel, &missing(5, 1, 10)).await.is_err());
    assert!(orch.report_stats(&cancel, 5).await.is_err());
    assert_eq!(source.call_count(), 0);
}

#[tokio::test]
async fn parent_cancellation_stops_budgeted_run() {
    let db = seeded_db(&[("tattoo", "US", 5), ("spa", "US", 2)]).await;
    let catalog = PartitionCatalog::new(["tattoo", "spa"], ["US"]);
    let source = FakeSource::new()
        .with_delay(Duration::from_secs(30))
        .into_arc();
    let jobs = JobsConfig {
        low_data: low_data(100, 10, 1, 10),
        ..JobsConfig::default()
    };
    let orch = orchestrator(db, catalog, &source, jobs);

    let parent = CancellationToken::new();
    let trigger = parent.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let outcome = orch
        .run_with_budget_until(JobKind::LowData, &parent)
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));

    let JobOutcome::Populated(report) = outcome else {
        panic!("expected a population report");
    };
    assert_eq!(source.call_count(), 1);
    assert_eq!(report.batch.cancelled(), 2);
}

/// Answers every read correctly, but only after `delay`.
struct SlowStore {
    db: LeadDb,
    delay: Duration,
}

#[async_trait]
impl LeadStore for SlowStore {
    async fn partition_counts(&self) -> Result<Vec<PartitionCount>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.db.partition_counts().await
    }

    async fn count_for(&self, partition: &Partition) -> Result<i64, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.db.count_for(partition).await
    }

    async fn total_leads(&self) -> Result<i64, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.db.total_leads().await
    }

    async fn top_industries(&self, limit: usize) -> Result<Vec<VolumeEntry>, StoreError> {
        tokio::time::sleep(self.delay).await;
        LeadStore::top_industries(&self.db, limit).await
    }

    async fn top_countries(&self, limit: usize) -> Result<Vec<VolumeEntry>, StoreError> {
        tokio::time::sleep(self.delay).await;
        LeadStore::top_countries(&self.db, limit).await
    }
}

async fn slow_orchestrator(source: &Arc<FakeSource>, jobs: JobsConfig) -> Orchestrator {
    let db = seeded_db(&[("tattoo", "US", 5)]).await;
    Orchestrator::new(
        Arc::new(SlowStore {
            db,
            delay: Duration::from_secs(30),
        }),
        PartitionCatalog::new(["tattoo", "spa"], ["US"]),
        Arc::clone(source) as Arc<dyn LeadSource>,
        jobs,
    )
}

fn cancelled_job(err: &anyhow::Error) -> JobCancelled {
    err.downcast_ref::<JobCancelled>()
        .cloned()
        .unwrap_or_else(|| panic!("expected a cancelled job, got: {err:#}"))
}

#[tokio::test]
async fn stats_budget_abandons_slow_store_reads() {
    let source = FakeSource::new().into_arc();
    let mut jobs = JobsConfig::default();
    jobs.stats.timeout_secs = 1;
    let orch = slow_orchestrator(&source, jobs).await;

    let started = Instant::now();
    let err = orch.run_with_budget(JobKind::Stats).await.unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(5));

    let cancelled = cancelled_job(&err);
    assert_eq!(cancelled.job, JobKind::Stats);
    assert!(format!("{err:#}").contains("stats-report"), "{err:#}");
}

#[tokio::test]
async fn population_budget_covers_detection() {
    let source = FakeSource::new().into_arc();
    let mut jobs = JobsConfig::default();
    jobs.low_data.timeout_secs = 1;
    jobs.missing.timeout_secs = 1;
    let orch = slow_orchestrator(&source, jobs).await;

    for kind in [JobKind::LowData, JobKind::Missing] {
        let started = Instant::now();
        let err = orch.run_with_budget(kind).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5), "{kind}");
        let cancelled = cancelled_job(&err);
        assert_eq!(cancelled.job, kind);
        assert_eq!(cancelled.step, "detection");
    }
    assert_eq!(source.call_count(), 0);
}

#[tokio::test]
async fn pre_cancelled_stats_does_not_read() {
    let source = FakeSource::new().into_arc();
    let orch = slow_orchestrator(&source, JobsConfig::default()).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let started = Instant::now();
    let err = orch.report_stats(&cancel, 5).await.unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(cancelled_job(&err).step, "summary");
}
