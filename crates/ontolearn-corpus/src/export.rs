//! Flat-file outputs for downstream refinement and exploration steps.
//!
//! - the index document: one JSON object with run metadata, the load report
//!   and the full [`CorpusIndex`]
//! - the concept list: JSONL, one line per construct / task / brain region,
//!   keyed by the request id the batch-prompt generator uses

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use ontolearn_common::{concept_id, ConceptKind, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::aggregate::{CorpusIndex, CorpusStats};
use crate::store::{LoadReport, SkippedPaper};

#[derive(Debug, Serialize)]
struct IndexDocument<'a> {
    run_id: Uuid,
    generated_at: DateTime<Utc>,
    source_dir: String,
    papers_loaded: usize,
    papers_skipped: usize,
    skipped: &'a [SkippedPaper],
    stats: CorpusStats,
    index: &'a CorpusIndex,
}

/// One line of the concept list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptLine {
    pub id: String,
    pub kind: ConceptKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub papers: BTreeSet<String>,
}

/// Write the index document. Returns the run id stamped into it.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_index(
    path: &Path,
    index: &CorpusIndex,
    report: &LoadReport,
    source_dir: &Path,
) -> Result<Uuid> {
    let run_id = Uuid::new_v4();
    let doc = IndexDocument {
        run_id,
        generated_at: Utc::now(),
        source_dir: source_dir.display().to_string(),
        papers_loaded: report.papers_loaded,
        papers_skipped: report.skipped.len(),
        skipped: &report.skipped,
        stats: index.stats(),
        index,
    };

    let body = serde_json::to_vec_pretty(&doc)?;
    write_atomic(path, &body)?;
    info!(run_id = %run_id, bytes = body.len(), "Index written");
    Ok(run_id)
}

/// Concept lines in write order: constructs, tasks, then brain regions.
///
/// Names whose ids collide (e.g. differing only in case) are folded into the
/// first line seen, with their paper sets unioned.
pub fn concept_lines(index: &CorpusIndex) -> Vec<ConceptLine> {
    let mut lines: Vec<ConceptLine> = Vec::new();
    let mut by_id: BTreeMap<String, usize> = BTreeMap::new();
    let no_papers = BTreeMap::new();

    for kind in ConceptKind::ALL {
        let (names, papers) = match kind {
            ConceptKind::Construct   => (index.all_constructs(), index.construct_to_papers()),
            ConceptKind::Task        => (index.all_tasks(), index.task_to_papers()),
            ConceptKind::BrainRegion => (index.all_brain_regions(), &no_papers),
        };

        for name in names {
            let id = concept_id(kind, name);
            let paper_ids = papers.get(name).cloned().unwrap_or_default();

            if let Some(&pos) = by_id.get(&id) {
                debug!(id = %id, name = %name, "Folding duplicate concept id");
                lines[pos].papers.extend(paper_ids);
                continue;
            }

            by_id.insert(id.clone(), lines.len());
            lines.push(ConceptLine {
                id,
                kind,
                name: name.clone(),
                papers: paper_ids,
            });
        }
    }

    lines
}

/// Write the concept list as JSONL. Returns the number of lines written.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_concept_list(path: &Path, index: &CorpusIndex) -> Result<usize> {
    let lines = concept_lines(index);

    let mut body = Vec::new();
    for line in &lines {
        serde_json::to_writer(&mut body, line)?;
        body.push(b'\n');
    }

    write_atomic(path, &body)?;
    info!(n = lines.len(), "Concept list written");
    Ok(lines.len())
}

/// Mode for written outputs. Temp files start owner-only.
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// Write via a temp file in the target directory, then rename into place.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(OUTPUT_MODE))?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
