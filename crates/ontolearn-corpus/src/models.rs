//! Data models for per-paper extraction records.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ShapeError;

/// Identifier of one paper, taken from its extraction file stem (e.g. `PMC1234567`).
pub type PaperId = String;

/// Task name → labels (conditions or contrasts) used within that task.
pub type LabelMap = BTreeMap<String, BTreeSet<String>>;

/// Concepts the LLM extracted from one paper.
///
/// Serialized with the same keys the extraction files use, so a record
/// written back out is readable by [`ExtractionRecord::from_value`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    #[serde(rename = "construct", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub constructs: BTreeSet<String>,

    #[serde(rename = "task", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tasks: BTreeSet<String>,

    #[serde(rename = "condition", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub conditions: LabelMap,

    #[serde(rename = "contrast", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contrasts: LabelMap,

    #[serde(rename = "brain_region", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub brain_regions: BTreeSet<String>,
}

impl ExtractionRecord {
    /// Validate a parsed extraction file.
    ///
    /// Missing keys are empty; a key that is present must hold the right shape,
    /// so `null` is rejected. Unknown keys are ignored.
    pub fn from_value(value: &Value) -> Result<Self, ShapeError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ShapeError::new("<root>", "mapping", value))?;

        Ok(Self {
            constructs:    string_set(obj, "construct")?,
            tasks:         string_set(obj, "task")?,
            conditions:    label_map(obj, "condition")?,
            contrasts:     label_map(obj, "contrast")?,
            brain_regions: string_set(obj, "brain_region")?,
        })
    }

    /// True when the record contributes nothing to an aggregate.
    pub fn is_empty(&self) -> bool {
        self.constructs.is_empty()
            && self.tasks.is_empty()
            && self.brain_regions.is_empty()
            && self.conditions.values().all(BTreeSet::is_empty)
            && self.contrasts.values().all(BTreeSet::is_empty)
    }
}

fn string_set(obj: &Map<String, Value>, key: &str) -> Result<BTreeSet<String>, ShapeError> {
    match obj.get(key) {
        None => Ok(BTreeSet::new()),
        Some(Value::Array(items)) => strings(items, key),
        Some(other) => Err(ShapeError::new(key, "list of strings", other)),
    }
}

fn label_map(obj: &Map<String, Value>, key: &str) -> Result<LabelMap, ShapeError> {
    let entries = match obj.get(key) {
        None => return Ok(LabelMap::new()),
        Some(Value::Object(entries)) => entries,
        Some(other) => return Err(ShapeError::new(key, "mapping of string lists", other)),
    };

    let mut map = LabelMap::new();
    for (task, labels) in entries {
        let field = format!("{key}.{task}");
        let labels = match labels {
            Value::Array(items) => strings(items, &field)?,
            other => return Err(ShapeError::new(field, "list of strings", other)),
        };
        map.insert(task.clone(), labels);
    }
    Ok(map)
}

fn strings(items: &[Value], field: &str) -> Result<BTreeSet<String>, ShapeError> {
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ShapeError::new(format!("{field}[]"), "string", item))
        })
        .collect()
}
