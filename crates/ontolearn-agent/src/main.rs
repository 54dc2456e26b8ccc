//! Ontolearn: literature-mined ontology aggregation.
//! Entry point for the `ontolearn` binary.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use ontolearn_corpus::NormalisePolicy;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "ontolearn", version, about = "Aggregate LLM concept extractions across a paper corpus")]
struct Cli {
    /// Config file (.toml, .yaml or .json). Defaults to $ONTOLEARN_CONFIG, then ./ontolearn.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Aggregate every extraction file into the index and concept list.
    Aggregate(AggregateArgs),
    /// Split an LLM batch output file into per-paper extraction files.
    SplitBatch(SplitBatchArgs),
    /// Print corpus statistics as JSON.
    Stats(StatsArgs),
}

#[derive(Debug, Args)]
struct AggregateArgs {
    #[arg(long)]
    results_dir: Option<PathBuf>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Trim and lower-case concept names before merging.
    #[arg(long)]
    lowercase: bool,
}

#[derive(Debug, Args)]
struct SplitBatchArgs {
    /// Batch output JSONL downloaded from the LLM provider.
    #[arg(long)]
    batch_output: PathBuf,
    #[arg(long)]
    results_dir: Option<PathBuf>,
    #[arg(long)]
    overwrite: bool,
}

#[derive(Debug, Args)]
struct StatsArgs {
    #[arg(long)]
    results_dir: Option<PathBuf>,
    #[arg(long)]
    lowercase: bool,
}

fn init_tracing(config: &Config) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn override_corpus(config: &mut Config, results_dir: Option<PathBuf>, lowercase: bool) {
    if let Some(dir) = results_dir {
        config.corpus.results_dir = dir;
    }
    if lowercase {
        config.corpus.normalise = NormalisePolicy::Lowercase;
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, source) = Config::load(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(&config);

    info!("Ontolearn {}", env!("CARGO_PKG_VERSION"));
    match &source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("No config file found, using defaults. Copy ontolearn.example.toml to ontolearn.toml to change them."),
    }

    match cli.command {
        Command::Aggregate(args) => {
            override_corpus(&mut config, args.results_dir, args.lowercase);
            if let Some(dir) = args.output_dir {
                config.output.dir = dir;
            }
            let summary = commands::run_aggregate(&config)?;
            info!(
                run_id = %summary.run_id,
                loaded = summary.papers_loaded,
                skipped = summary.papers_skipped,
                concepts = summary.concepts_written,
                index = %summary.index_path.display(),
                concepts_file = %summary.concepts_path.display(),
                "Aggregation finished"
            );
        }
        Command::SplitBatch(args) => {
            override_corpus(&mut config, args.results_dir, false);
            if args.overwrite {
                config.batch.overwrite = true;
            }
            let report = commands::run_split_batch(&config, &args.batch_output)?;
            info!(
                written = report.written.len(),
                skipped_existing = report.skipped_existing,
                failed = report.failures.len(),
                "Batch split finished"
            );
        }
        Command::Stats(args) => {
            override_corpus(&mut config, args.results_dir, args.lowercase);
            let stats = commands::run_stats(&config)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "ontolearn", "--config", "ontolearn.yaml",
            "aggregate", "--results-dir", "in", "--lowercase",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ontolearn.yaml")));
        match cli.command {
            Command::Aggregate(args) => {
                assert_eq!(args.results_dir, Some(PathBuf::from("in")));
                assert!(args.lowercase);
                assert!(args.output_dir.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["ontolearn", "split-batch", "--batch-output", "b.jsonl", "--overwrite"]).unwrap();
        assert!(matches!(cli.command, Command::SplitBatch(ref a) if a.overwrite && a.batch_output == PathBuf::from("b.jsonl")));

        assert!(Cli::try_parse_from(["ontolearn", "split-batch"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_override_corpus() {
        let mut config = Config::default();
        override_corpus(&mut config, Some(PathBuf::from("elsewhere")), true);
        assert_eq!(config.corpus.results_dir, PathBuf::from("elsewhere"));
        assert_eq!(config.corpus.normalise, NormalisePolicy::Lowercase);
    }
}
