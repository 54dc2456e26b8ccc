//! Subcommand implementations. Each takes an already-merged [`Config`].

use std::path::{Path, PathBuf};

use anyhow::Context;
use ontolearn_corpus::batch::{split_batch_output, BatchSplitOptions, BatchSplitReport};
use ontolearn_corpus::export::{write_concept_list, write_index};
use ontolearn_corpus::{CorpusScan, CorpusStats, LoadReport, PaperStore};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;

/// Outcome of one `aggregate` run.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateSummary {
    pub run_id: Uuid,
    pub index_path: PathBuf,
    pub concepts_path: PathBuf,
    pub papers_loaded: usize,
    pub papers_skipped: usize,
    pub concepts_written: usize,
    pub skip_alert: bool,
    pub stats: CorpusStats,
}

fn scan_corpus(config: &Config) -> anyhow::Result<CorpusScan> {
    let dir = &config.corpus.results_dir;
    let store = PaperStore::open(dir, config.corpus.store_options())
        .with_context(|| format!("opening results directory {}", dir.display()))?;
    store
        .scan()
        .with_context(|| format!("scanning {}", dir.display()))
}

/// True when the skip rate warrants a pipeline-level alert.
pub fn skip_alert(report: &LoadReport, threshold: f64) -> bool {
    !report.skipped.is_empty() && report.skip_ratio() > threshold
}

pub fn run_aggregate(config: &Config) -> anyhow::Result<AggregateSummary> {
    let scan = scan_corpus(config)?;

    let index_path = config.output.index_path();
    let concepts_path = config.output.concepts_path();

    let run_id = write_index(&index_path, &scan.index, &scan.report, &config.corpus.results_dir)
        .with_context(|| format!("writing {}", index_path.display()))?;
    let concepts_written = write_concept_list(&concepts_path, &scan.index)
        .with_context(|| format!("writing {}", concepts_path.display()))?;

    let alert = skip_alert(&scan.report, config.corpus.alert_skip_ratio);
    if alert {
        warn!(
            skipped = scan.report.skipped.len(),
            files = scan.report.files_seen,
            threshold = config.corpus.alert_skip_ratio,
            "Skip ratio {:.1}% is above the alert threshold",
            scan.report.skip_ratio() * 100.0
        );
    }

    Ok(AggregateSummary {
        run_id,
        index_path,
        concepts_path,
        papers_loaded: scan.report.papers_loaded,
        papers_skipped: scan.report.skipped.len(),
        concepts_written,
        skip_alert: alert,
        stats: scan.index.stats(),
    })
}

pub fn run_split_batch(config: &Config, batch_output: &Path) -> anyhow::Result<BatchSplitReport> {
    let options = BatchSplitOptions { overwrite: config.batch.overwrite };
    let report = split_batch_output(batch_output, &config.corpus.results_dir, &options)
        .with_context(|| format!("splitting batch output {}", batch_output.display()))?;

    for failure in &report.failures {
        info!(line = failure.line, custom_id = ?failure.custom_id, "Unparsed batch line: {}", failure.reason);
    }
    Ok(report)
}

pub fn run_stats(config: &Config) -> anyhow::Result<CorpusStats> {
    Ok(scan_corpus(config)?.index.stats())
}
