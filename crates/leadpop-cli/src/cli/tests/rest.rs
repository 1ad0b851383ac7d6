//! Tests for detect, stats, partitions, completions and global options.

use super::parse;
use crate::cli::{Cli, CliCommand, DetectKind};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_detect_low() {
    match parse(&["leadpop", "detect", "low"]) {
        CliCommand::Detect { kind, threshold } => {
            assert_eq!(kind, DetectKind::Low);
            assert!(threshold.is_none());
        }
        _ => panic!("expected Detect"),
    }
}

#[test]
fn cli_parse_detect_missing() {
    match parse(&["leadpop", "detect", "missing"]) {
        CliCommand::Detect { kind, .. } => assert_eq!(kind, DetectKind::Missing),
        _ => panic!("expected Detect"),
    }
}

#[test]
fn cli_parse_detect_low_threshold() {
    match parse(&["leadpop", "detect", "low", "--threshold", "25"]) {
        CliCommand::Detect { kind, threshold } => {
            assert_eq!(kind, DetectKind::Low);
            assert_eq!(threshold, Some(25));
        }
        _ => panic!("expected Detect with --threshold"),
    }
}

#[test]
fn cli_parse_detect_requires_kind() {
    assert!(Cli::try_parse_from(["leadpop", "detect"]).is_err());
    assert!(Cli::try_parse_from(["leadpop", "detect", "sparse"]).is_err());
}

#[test]
fn cli_parse_stats() {
    match parse(&["leadpop", "stats"]) {
        CliCommand::Stats { json, top } => {
            assert!(!json);
            assert!(top.is_none());
        }
        _ => panic!("expected Stats"),
    }
}

#[test]
fn cli_parse_stats_json() {
    match parse(&["leadpop", "stats", "--json", "--top", "3"]) {
        CliCommand::Stats { json, top } => {
            assert!(json);
            assert_eq!(top, Some(3));
        }
        _ => panic!("expected Stats with --json"),
    }
}

#[test]
fn cli_parse_partitions() {
    match parse(&["leadpop", "partitions"]) {
        CliCommand::Partitions => {}
        _ => panic!("expected Partitions"),
    }
}

#[test]
fn cli_parse_completions() {
    match parse(&["leadpop", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, clap_complete::Shell::Bash),
        _ => panic!("expected Completions"),
    }
}

#[test]
fn cli_parse_global_options_after_subcommand() {
    let cli = Cli::try_parse_from([
        "leadpop",
        "stats",
        "--config",
        "/etc/leadpop.toml",
        "--db",
        "/tmp/leads.db",
    ])
    .unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("/etc/leadpop.toml")));
    assert_eq!(cli.db.as_deref(), Some(Path::new("/tmp/leads.db")));
    assert!(matches!(cli.command, CliCommand::Stats { .. }));
}

#[test]
fn cli_parse_global_options_default_to_none() {
    let cli = Cli::try_parse_from(["leadpop", "partitions"]).unwrap();
    assert!(cli.config.is_none());
    assert!(cli.db.is_none());
}

#[test]
fn cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["leadpop"]).is_err());
}

#[test]
fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
