//! CLI for the leadpop population orchestrator.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use leadpop_core::config::{self, LeadpopConfig};
use leadpop_core::store::LeadDb;
use std::path::{Path, PathBuf};

use commands::{
    run_completions, run_detect, run_partitions, run_populate_low, run_populate_missing,
    run_serve, run_stats, PopulateOverrides,
};

/// Top-level CLI for leadpop.
#[derive(Debug, Parser)]
#[command(name = "leadpop")]
#[command(about = "leadpop: keeps a lead directory populated per industry and country", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/leadpop/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Lead database to use instead of the configured one.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Which scarcity report `detect` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DetectKind {
    /// Partitions with some leads, but fewer than the threshold.
    Low,
    /// Catalog partitions with no stored leads.
    Missing,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the scheduled population jobs until Ctrl-C.
    Serve,

    /// Run the low-data population job once, now.
    PopulateLow {
        /// Partitions with fewer leads than this are candidates.
        #[arg(long, value_name = "N")]
        threshold: Option<i64>,
        /// Populate at most K partitions (scarcest first).
        #[arg(long, value_name = "K")]
        top: Option<usize>,
        /// Fetch at most N partitions at a time.
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
    },

    /// Run the missing-partition population job once, now.
    PopulateMissing {
        /// Populate at most K partitions (catalog order).
        #[arg(long, value_name = "K")]
        top: Option<usize>,
        /// Fetch at most N partitions at a time.
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
    },

    /// List the partitions a population job would pick, without fetching.
    Detect {
        #[arg(value_enum)]
        kind: DetectKind,
        /// Low-data threshold (default from config).
        #[arg(long, value_name = "N")]
        threshold: Option<i64>,
    },

    /// Show the population report.
    Stats {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
        /// Number of industries/countries to list.
        #[arg(long, value_name = "N")]
        top: Option<usize>,
    },

    /// List every catalog partition with its stored lead count.
    Partitions,

    /// Print shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = cli.command {
            return run_completions(shell);
        }

        let cfg = match &cli.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        cfg.validate().context("invalid configuration")?;
        tracing::debug!(
            industries = cfg.catalog.industries.len(),
            countries = cfg.catalog.countries.len(),
            source = %cfg.source.base_url,
            "loaded config"
        );
        let db = open_db(cli.db.as_deref(), &cfg).await?;

        match cli.command {
            CliCommand::Serve => run_serve(db, &cfg).await?,
            CliCommand::PopulateLow {
                threshold,
                top,
                concurrency,
            } => {
                let overrides = PopulateOverrides {
                    threshold,
                    top,
                    concurrency,
                };
                run_populate_low(db, &cfg, overrides).await?;
            }
            CliCommand::PopulateMissing { top, concurrency } => {
                let overrides = PopulateOverrides {
                    threshold: None,
                    top,
                    concurrency,
                };
                run_populate_missing(db, &cfg, overrides).await?;
            }
            CliCommand::Detect { kind, threshold } => {
                run_detect(&db, &cfg, kind, threshold).await?
            }
            CliCommand::Stats { json, top } => run_stats(&db, &cfg, json, top).await?,
            CliCommand::Partitions => run_partitions(&db, &cfg).await?,
            CliCommand::Completions { shell } => run_completions(shell)?,
        }

        Ok(())
    }
}

/// `--db` wins over `database_path` from the config; otherwise the XDG default.
async fn open_db(flag: Option<&Path>, cfg: &LeadpopConfig) -> Result<LeadDb> {
    match flag.or(cfg.database_path.as_deref()) {
        Some(path) => LeadDb::open_at(path)
            .await
            .with_context(|| format!("open lead database: {}", path.display())),
        None => LeadDb::open_default()
            .await
            .context("open default lead database"),
    }
}

#[cfg(test)]
mod tests;
