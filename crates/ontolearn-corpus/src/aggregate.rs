//! Corpus-wide aggregation of per-paper extraction records.
//!
//! A pure set-theoretic union plus reverse indices. Every collection is a
//! set, so merging the same paper twice, or merging papers in a different
//! order, yields an identical [`CorpusIndex`]. Empty label lists never
//! create or overwrite a task entry.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::{ExtractionRecord, LabelMap, PaperId};

/// Aggregate of every extraction record in a corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusIndex {
    all_constructs: BTreeSet<String>,
    all_tasks: BTreeSet<String>,
    conditions_by_task: LabelMap,
    contrasts_by_task: LabelMap,
    all_brain_regions: BTreeSet<String>,
    /// Construct or task → papers that mention it.
    concept_to_papers: BTreeMap<String, BTreeSet<PaperId>>,
    construct_to_papers: BTreeMap<String, BTreeSet<PaperId>>,
    task_to_papers: BTreeMap<String, BTreeSet<PaperId>>,
    /// Paper → its constructs and tasks. Papers with neither are absent.
    paper_to_concepts: BTreeMap<PaperId, BTreeSet<String>>,
    /// Every paper merged, including those with empty records.
    papers: BTreeSet<PaperId>,
}

impl CorpusIndex {
    pub fn all_constructs(&self) -> &BTreeSet<String> {
        &self.all_constructs
    }

    pub fn all_tasks(&self) -> &BTreeSet<String> {
        &self.all_tasks
    }

    pub fn conditions_by_task(&self) -> &LabelMap {
        &self.conditions_by_task
    }

    pub fn contrasts_by_task(&self) -> &LabelMap {
        &self.contrasts_by_task
    }

    pub fn all_brain_regions(&self) -> &BTreeSet<String> {
        &self.all_brain_regions
    }

    pub fn concept_to_papers(&self) -> &BTreeMap<String, BTreeSet<PaperId>> {
        &self.concept_to_papers
    }

    pub fn construct_to_papers(&self) -> &BTreeMap<String, BTreeSet<PaperId>> {
        &self.construct_to_papers
    }

    pub fn task_to_papers(&self) -> &BTreeMap<String, BTreeSet<PaperId>> {
        &self.task_to_papers
    }

    pub fn paper_to_concepts(&self) -> &BTreeMap<PaperId, BTreeSet<String>> {
        &self.paper_to_concepts
    }

    pub fn papers(&self) -> &BTreeSet<PaperId> {
        &self.papers
    }

    /// Papers that mention `concept` as a construct or a task.
    pub fn papers_for(&self, concept: &str) -> Option<&BTreeSet<PaperId>> {
        self.concept_to_papers.get(concept)
    }

    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            papers: self.papers.len(),
            constructs: self.all_constructs.len(),
            tasks: self.all_tasks.len(),
            brain_regions: self.all_brain_regions.len(),
            tasks_with_conditions: self.conditions_by_task.len(),
            condition_labels: self.conditions_by_task.values().map(BTreeSet::len).sum(),
            tasks_with_contrasts: self.contrasts_by_task.len(),
            contrast_labels: self.contrasts_by_task.values().map(BTreeSet::len).sum(),
            indexed_concepts: self.concept_to_papers.len(),
        }
    }
}

/// Collection sizes of a [`CorpusIndex`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub papers: usize,
    pub constructs: usize,
    pub tasks: usize,
    pub brain_regions: usize,
    pub tasks_with_conditions: usize,
    pub condition_labels: usize,
    pub tasks_with_contrasts: usize,
    pub contrast_labels: usize,
    pub indexed_concepts: usize,
}

/// Incremental form of [`aggregate`], used when records are streamed from disk.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    index: CorpusIndex,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one paper's record into the index.
    pub fn add(&mut self, paper_id: &str, record: &ExtractionRecord) -> &mut Self {
        let index = &mut self.index;
        index.papers.insert(paper_id.to_string());

        for construct in &record.constructs {
            index.all_constructs.insert(construct.clone());
            link(&mut index.construct_to_papers, construct, paper_id);
            link(&mut index.concept_to_papers, construct, paper_id);
            link(&mut index.paper_to_concepts, paper_id, construct);
        }

        for task in &record.tasks {
            index.all_tasks.insert(task.clone());
            link(&mut index.task_to_papers, task, paper_id);
            link(&mut index.concept_to_papers, task, paper_id);
            link(&mut index.paper_to_concepts, paper_id, task);
        }

        merge_labels(&mut index.conditions_by_task, &record.conditions);
        merge_labels(&mut index.contrasts_by_task, &record.contrasts);

        index
            .all_brain_regions
            .extend(record.brain_regions.iter().cloned());

        self
    }

    pub fn papers_added(&self) -> usize {
        self.index.papers.len()
    }

    pub fn finish(self) -> CorpusIndex {
        self.index
    }
}

/// Aggregate `(paper id, record)` pairs into a fresh [`CorpusIndex`].
pub fn aggregate<I>(records: I) -> CorpusIndex
where
    I: IntoIterator<Item = (PaperId, ExtractionRecord)>,
{
    let mut builder = IndexBuilder::new();
    for (paper_id, record) in records {
        builder.add(&paper_id, &record);
    }
    builder.finish()
}

fn link(map: &mut BTreeMap<String, BTreeSet<String>>, key: &str, value: &str) {
    map.entry(key.to_string())
        .or_default()
        .insert(value.to_string());
}

fn merge_labels(target: &mut LabelMap, incoming: &LabelMap) {
    for (task, labels) in incoming {
        if labels.is_empty() {
            continue;
        }
        target
            .entry(task.clone())
            .or_default()
            .extend(labels.iter().cloned());
    }
}
