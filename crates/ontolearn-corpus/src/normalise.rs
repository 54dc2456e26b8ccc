//! Term normalisation applied at the paper store boundary.
//!
//! The aggregator never normalises. Whether "Working Memory" and
//! "working memory" are the same concept is decided here, once, by the
//! caller's choice of [`NormalisePolicy`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{ExtractionRecord, LabelMap};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalisePolicy {
    /// Keep every value byte-for-byte.
    #[default]
    Verbatim,
    /// Trim and lower-case constructs, tasks, brain regions and the task keys
    /// of condition / contrast maps. Labels are only trimmed.
    Lowercase,
}

impl NormalisePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalisePolicy::Verbatim  => "verbatim",
            NormalisePolicy::Lowercase => "lowercase",
        }
    }

    pub fn apply(&self, record: ExtractionRecord) -> ExtractionRecord {
        match self {
            NormalisePolicy::Verbatim => record,
            NormalisePolicy::Lowercase => ExtractionRecord {
                constructs:    lower_set(record.constructs),
                tasks:         lower_set(record.tasks),
                conditions:    lower_keys(record.conditions),
                contrasts:     lower_keys(record.contrasts),
                brain_regions: lower_set(record.brain_regions),
            },
        }
    }
}

fn lower_term(term: &str) -> Option<String> {
    let term = term.trim();
    (!term.is_empty()).then(|| term.to_lowercase())
}

fn lower_set(terms: BTreeSet<String>) -> BTreeSet<String> {
    terms.iter().filter_map(|t| lower_term(t)).collect()
}

// Keys that collide after lower-casing have their labels unioned.
fn lower_keys(map: LabelMap) -> LabelMap {
    let mut out = LabelMap::new();
    for (task, labels) in map {
        let Some(task) = lower_term(&task) else { continue };
        let labels = labels
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        out.entry(task).or_default().extend(labels);
    }
    out
}
