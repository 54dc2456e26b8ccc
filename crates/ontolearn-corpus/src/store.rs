//! Paper store accessor.
//!
//! A directory holding one extraction JSON file per paper, named
//! `<paper id>.<extension>`. Files are read, validated, normalised and merged
//! one at a time. A file that fails to read, parse or validate is logged with
//! its paper id and skipped; the rest of the corpus is still processed.

use std::path::PathBuf;

use ontolearn_common::{OntologyError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::aggregate::{CorpusIndex, IndexBuilder};
use crate::error::{RecordError, SkipKind};
use crate::models::{ExtractionRecord, PaperId};
use crate::normalise::NormalisePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreOptions {
    /// File extension of extraction files, without the dot.
    pub extension: String,
    pub normalise: NormalisePolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            extension: "json".to_string(),
            normalise: NormalisePolicy::Verbatim,
        }
    }
}

/// One extraction file in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperFile {
    pub paper_id: PaperId,
    pub path: PathBuf,
}

/// A paper left out of the aggregate, and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedPaper {
    pub paper_id: PaperId,
    pub kind: SkipKind,
    pub error: String,
}

impl From<&RecordError> for SkippedPaper {
    fn from(err: &RecordError) -> Self {
        Self {
            paper_id: err.paper_id().to_string(),
            kind: err.kind(),
            error: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadReport {
    pub files_seen: usize,
    pub papers_loaded: usize,
    pub skipped: Vec<SkippedPaper>,
}

impl LoadReport {
    /// Fraction of files that were skipped; 0 for an empty store.
    pub fn skip_ratio(&self) -> f64 {
        if self.files_seen == 0 {
            return 0.0;
        }
        self.skipped.len() as f64 / self.files_seen as f64
    }
}

/// Result of scanning a store: the aggregate plus what was skipped.
#[derive(Debug, Clone)]
pub struct CorpusScan {
    pub index: CorpusIndex,
    pub report: LoadReport,
}

#[derive(Debug, Clone)]
pub struct PaperStore {
    root: PathBuf,
    options: StoreOptions,
}

impl PaperStore {
    pub fn open(root: impl Into<PathBuf>, options: StoreOptions) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(OntologyError::NotADirectory(root));
        }
        Ok(Self { root, options })
    }

    /// Extraction files directly under the root, sorted by path.
    pub fn paper_files(&self) -> Result<Vec<PaperFile>> {
        let mut files = Vec::new();

        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(self.options.extension.as_str()) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if !stem.is_empty() => files.push(PaperFile {
                    paper_id: stem.to_string(),
                    path: path.clone(),
                }),
                _ => warn!(path = %path.display(), "Skipping file without a usable paper id"),
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Read, validate and normalise one paper's extraction file.
    pub fn load_paper(&self, file: &PaperFile) -> std::result::Result<ExtractionRecord, RecordError> {
        let paper_id = &file.paper_id;

        let bytes = std::fs::read(&file.path).map_err(|source| RecordError::Io {
            paper_id: paper_id.clone(),
            source,
        })?;

        let value: Value = serde_json::from_slice(&bytes).map_err(|source| RecordError::Malformed {
            paper_id: paper_id.clone(),
            source,
        })?;

        let record = ExtractionRecord::from_value(&value).map_err(|source| RecordError::UnexpectedShape {
            paper_id: paper_id.clone(),
            source,
        })?;

        Ok(self.options.normalise.apply(record))
    }

    /// Fold every extraction file into a fresh [`CorpusIndex`].
    #[instrument(skip(self), fields(root = %self.root.display(), normalise = self.options.normalise.as_str()))]
    pub fn scan(&self) -> Result<CorpusScan> {
        let files = self.paper_files()?;
        info!(n = files.len(), "Found extraction files");

        let mut builder = IndexBuilder::new();
        let mut report = LoadReport::default();

        for file in &files {
            report.files_seen += 1;
            match self.load_paper(file) {
                Ok(record) => {
                    debug!(paper_id = %file.paper_id, empty = record.is_empty(), "Merged paper");
                    builder.add(&file.paper_id, &record);
                    report.papers_loaded += 1;
                }
                Err(e) => {
                    warn!(paper_id = %file.paper_id, kind = ?e.kind(), "Skipping paper: {e}");
                    report.skipped.push(SkippedPaper::from(&e));
                }
            }
        }

        info!(
            loaded = report.papers_loaded,
            skipped = report.skipped.len(),
            indexed = builder.papers_added(),
            "Corpus scan complete"
        );

        Ok(CorpusScan {
            index: builder.finish(),
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontolearn_test_utils::CorpusFixture;
    use serde_json::json;

    #[test]
    fn test_open_rejects_missing_dir() {
        let fixture = CorpusFixture::new();
        let missing = fixture.path().join("nope");
        let err = PaperStore::open(&missing, StoreOptions::default()).unwrap_err();
        assert!(matches!(err, OntologyError::NotADirectory(p) if p == missing));
    }

    #[test]
    fn test_paper_files_filters_and_sorts() {
        let fixture = CorpusFixture::new();
        fixture.write_paper("PMC3", &json!({}));
        fixture.write_paper("PMC1", &json!({}));
        fixture.write_raw("notes.txt", "not a paper");
        fixture.subdir("nested.json");

        let store = PaperStore::open(fixture.path(), StoreOptions::default()).unwrap();
        let ids: Vec<_> = store.paper_files().unwrap().into_iter().map(|f| f.paper_id).collect();
        assert_eq!(ids, vec!["PMC1", "PMC3"]);
    }

    #[test]
    fn test_custom_extension() {
        let fixture = CorpusFixture::new();
        fixture.write_raw("PMC7.extract", r#"{"construct": ["attention"]}"#);
        fixture.write_paper("PMC8", &json!({"construct": ["memory"]}));

        let options = StoreOptions { extension: "extract".to_string(), ..Default::default() };
        let store = PaperStore::open(fixture.path(), options).unwrap();
        let files = store.paper_files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].paper_id, "PMC7");
    }

    #[test]
    fn test_load_paper_errors_carry_paper_id() {
        let fixture = CorpusFixture::new();
        fixture.write_raw("PMC9.json", "{\"construct\": [");
        fixture.write_paper("PMC10", &json!({"contrast": ["a vs. b"]}));

        let store = PaperStore::open(fixture.path(), StoreOptions::default()).unwrap();
        let files = store.paper_files().unwrap();

        let malformed = store.load_paper(&files[1]).unwrap_err();
        assert_eq!(malformed.paper_id(), "PMC9");
        assert_eq!(malformed.kind(), SkipKind::Malformed);

        let shape = store.load_paper(&files[0]).unwrap_err();
        assert_eq!(shape.paper_id(), "PMC10");
        assert_eq!(shape.kind(), SkipKind::UnexpectedShape);
    }

    #[test]
    fn test_unreadable_file_is_an_io_skip() {
        let fixture = CorpusFixture::new();
        let path = fixture.write_paper("PMC11", &json!({"construct": ["attention"]}));

        let store = PaperStore::open(fixture.path(), StoreOptions::default()).unwrap();
        let files = store.paper_files().unwrap();
        std::fs::remove_file(&path).unwrap();

        let err = store.load_paper(&files[0]).unwrap_err();
        assert_eq!(err.paper_id(), "PMC11");
        assert_eq!(err.kind(), SkipKind::Io);

        let skipped = SkippedPaper::from(&err);
        assert_eq!(skipped.kind, SkipKind::Io);
        assert_eq!(skipped.paper_id, "PMC11");
    }

    #[test]
    fn test_load_applies_policy() {
        let fixture = CorpusFixture::new();
        fixture.write_paper("PMC1", &json!({"task": ["Go/No-Go Task"]}));
        let options = StoreOptions { normalise: NormalisePolicy::Lowercase, ..Default::default() };
        let store = PaperStore::open(fixture.path(), options).unwrap();
        let files = store.paper_files().unwrap();
        let record = store.load_paper(&files[0]).unwrap();
        assert!(record.tasks.contains("go/no-go task"));
    }

    #[test]
    fn test_skip_ratio() {
        let mut report = LoadReport::default();
        assert_eq!(report.skip_ratio(), 0.0);
        report.files_seen = 4;
        report.skipped.push(SkippedPaper {
            paper_id: "PMC1".to_string(),
            kind: SkipKind::Malformed,
            error: "bad".to_string(),
        });
        assert!((report.skip_ratio() - 0.25).abs() < 1e-9);
    }
}
