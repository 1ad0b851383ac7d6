use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Invalid parameters detected before the scheduler starts. Fatal to startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{job}: threshold must be > 0 (got {value})")]
    InvalidThreshold { job: &'static str, value: i64 },
    #[error("{job}: max_concurrent must be >= 1 (got {value})")]
    InvalidConcurrency { job: &'static str, value: usize },
    #[error("{job}: target_count must be > 0 (got {value})")]
    InvalidTarget { job: &'static str, value: i64 },
    #[error("{job}: missing_floor must be > 0 (got {value})")]
    InvalidFloor { job: &'static str, value: i64 },
    #[error("{job}: top_n must be > 0")]
    InvalidTopN { job: &'static str },
    #[error("{job}: timeout_secs must be > 0")]
    InvalidTimeout { job: &'static str },
    #[error("{job}: invalid schedule {expr:?}: {reason}")]
    InvalidSchedule {
        job: &'static str,
        expr: String,
        reason: String,
    },
    #[error("catalog must list at least one industry and one country")]
    EmptyCatalog,
    #[error("source.base_url must not be empty")]
    MissingBaseUrl,
    #[error("pool.max_background_tasks must be >= 1")]
    InvalidPool,
}

/// Industry and country lists whose cross product is the partition universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub industries: Vec<String>,
    /// ISO-3166 alpha-2 codes.
    pub countries: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let industries = [
            "tattoo",
            "gym",
            "spa",
            "salon",
            "barber",
            "dentist",
            "restaurant",
            "cafe",
            "bakery",
            "florist",
            "plumber",
            "electrician",
            "yoga",
            "veterinarian",
            "pharmacy",
        ];
        let countries = ["US", "CA", "GB", "AU", "DE", "FR"];
        Self {
            industries: industries.iter().map(|s| s.to_string()).collect(),
            countries: countries.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Upstream lead data source (HTTP endpoint returning JSON lead records).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    /// Sent as `Authorization: Bearer <key>` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/leads".to_string(),
            api_key: None,
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Daily job: top up partitions that exist but hold fewer than `threshold` leads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowDataJob {
    pub schedule: String,
    pub threshold: i64,
    pub top_k: usize,
    pub max_concurrent: usize,
    /// Leads requested per selected partition.
    pub target_count: i64,
    pub timeout_secs: u64,
}

impl Default for LowDataJob {
    fn default() -> Self {
        Self {
            schedule: "0 0 2 * * *".to_string(),
            threshold: 100,
            top_k: 10,
            max_concurrent: 3,
            target_count: 1000,
            timeout_secs: 6 * 60 * 60,
        }
    }
}

/// Weekly job: populate catalog partitions with no (or almost no) stored leads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingJob {
    pub schedule: String,
    pub top_k: usize,
    pub max_concurrent: usize,
    pub target_count: i64,
    /// Partitions with fewer stored leads than this count as missing. 1 = strictly absent.
    #[serde(default = "default_missing_floor")]
    pub missing_floor: i64,
    pub timeout_secs: u64,
}

fn default_missing_floor() -> i64 {
    1
}

impl Default for MissingJob {
    fn default() -> Self {
        Self {
            schedule: "0 0 3 * * Sun".to_string(),
            top_k: 20,
            max_concurrent: 5,
            target_count: 500,
            missing_floor: default_missing_floor(),
            timeout_secs: 12 * 60 * 60,
        }
    }
}

/// Daily read-only population report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsJob {
    pub schedule: String,
    pub top_n: usize,
    pub timeout_secs: u64,
}

impl Default for StatsJob {
    fn default() -> Self {
        Self {
            schedule: "0 0 8 * * *".to_string(),
            top_n: 10,
            timeout_secs: 5 * 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default)]
    pub low_data: LowDataJob,
    #[serde(default)]
    pub missing: MissingJob,
    #[serde(default)]
    pub stats: StatsJob,
}

impl JobsConfig {
    pub fn low_data_timeout(&self) -> Duration {
        Duration::from_secs(self.low_data.timeout_secs)
    }

    pub fn missing_timeout(&self) -> Duration {
        Duration::from_secs(self.missing.timeout_secs)
    }

    pub fn stats_timeout(&self) -> Duration {
        Duration::from_secs(self.stats.timeout_secs)
    }
}

/// Bounded pool for detached background work (scheduled job runs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_background_tasks: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_background_tasks: 8,
        }
    }
}

/// Global configuration loaded from `~/.config/leadpop/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadpopConfig {
    /// Lead database location (None = `~/.local/state/leadpop/leads.db`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

impl LeadpopConfig {
    /// Checks every job parameter and schedule expression. Run before anything is scheduled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.industries.is_empty() || self.catalog.countries.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        if self.source.base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        if self.pool.max_background_tasks == 0 {
            return Err(ConfigError::InvalidPool);
        }

        let low = &self.jobs.low_data;
        const LOW: &str = "low_data";
        check_schedule(LOW, &low.schedule)?;
        if low.threshold <= 0 {
            return Err(ConfigError::InvalidThreshold {
                job: LOW,
                value: low.threshold,
            });
        }
        check_batch_params(LOW, low.max_concurrent, low.target_count, low.timeout_secs)?;

        let missing = &self.jobs.missing;
        const MISSING: &str = "missing";
        check_schedule(MISSING, &missing.schedule)?;
        if missing.missing_floor <= 0 {
            return Err(ConfigError::InvalidFloor {
                job: MISSING,
                value: missing.missing_floor,
            });
        }
        check_batch_params(
            MISSING,
            missing.max_concurrent,
            missing.target_count,
            missing.timeout_secs,
        )?;

        let stats = &self.jobs.stats;
        const STATS: &str = "stats";
        check_schedule(STATS, &stats.schedule)?;
        if stats.top_n == 0 {
            return Err(ConfigError::InvalidTopN { job: STATS });
        }
        if stats.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout { job: STATS });
        }
        Ok(())
    }
}

fn check_batch_params(
    job: &'static str,
    max_concurrent: usize,
    target_count: i64,
    timeout_secs: u64,
) -> Result<(), ConfigError> {
    if max_concurrent < 1 {
        return Err(ConfigError::InvalidConcurrency {
            job,
            value: max_concurrent,
        });
    }
    if target_count <= 0 {
        return Err(ConfigError::InvalidTarget {
            job,
            value: target_count,
        });
    }
    if timeout_secs == 0 {
        return Err(ConfigError::InvalidTimeout { job });
    }
    Ok(())
}

fn check_schedule(job: &'static str, expr: &str) -> Result<(), ConfigError> {
    parse_schedule(expr)
        .map(|_| ())
        .map_err(|reason| ConfigError::InvalidSchedule {
            job,
            expr: expr.to_string(),
            reason,
        })
}

/// Returns a six/seven-field cron expression (seconds first).
///
/// Five-field expressions get a leading `0` seconds field.
pub fn normalize_schedule(expr: &str) -> std::result::Result<String, String> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    match fields.len() {
        5 => Ok(format!("0 {}", fields.join(" "))),
        6 | 7 => Ok(fields.join(" ")),
        n => Err(format!("expected 5, 6 or 7 fields, found {n}")),
    }
}

/// Normalizes `expr` and parses it with the scheduler's cron parser, so field
/// ranges (hour 25, month 13, ...) are rejected here rather than at startup.
pub fn parse_schedule(expr: &str) -> std::result::Result<String, String> {
    let normalized = normalize_schedule(expr)?;
    tokio_cron_scheduler::Job::new_async(normalized.as_str(), |_id, _scheduler| {
        Box::pin(async {})
    })
    .map_err(|e| format!("cron parse failed: {:?}", e))?;
    Ok(normalized)
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("leadpop")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LeadpopConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LeadpopConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path (no default file is written).
pub fn load_from_path(path: &Path) -> Result<LeadpopConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: LeadpopConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
