//! Scanning real directories of extraction files.

use std::collections::BTreeSet;

use ontolearn_corpus::batch::{split_batch_output, BatchSplitOptions};
use ontolearn_corpus::export::{concept_lines, write_concept_list, write_index};
use ontolearn_corpus::{NormalisePolicy, PaperStore, SkipKind, StoreOptions};
use ontolearn_test_utils::{batch_line, paper_a, paper_b, CorpusFixture};
use pretty_assertions::assert_eq;
use serde_json::json;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_scenario_from_disk() {
    let fixture = CorpusFixture::new();
    fixture.write_paper("A", &paper_a());
    fixture.write_paper("B", &paper_b());

    let store = PaperStore::open(fixture.path(), StoreOptions::default()).unwrap();
    let scan = store.scan().unwrap();
    let index = &scan.index;

    assert_eq!(index.all_constructs(), &set(&["Working Memory", "Attention"]));
    assert_eq!(index.all_tasks(), &set(&["N-back"]));
    assert_eq!(index.conditions_by_task()["N-back"], set(&["2-back", "3-back"]));
    assert_eq!(index.concept_to_papers()["Working Memory"], set(&["A", "B"]));
    assert_eq!(index.concept_to_papers()["Attention"], set(&["B"]));
    assert_eq!(scan.report.papers_loaded, 2);
    assert!(scan.report.skipped.is_empty());
}

#[test]
fn test_one_malformed_file_is_skipped() {
    let fixture = CorpusFixture::new();
    fixture.write_paper("A", &paper_a());
    fixture.write_raw("BROKEN.json", "{\"construct\": [\"Attention\"");
    fixture.write_paper("B", &paper_b());

    let store = PaperStore::open(fixture.path(), StoreOptions::default()).unwrap();
    let scan = store.scan().unwrap();

    assert_eq!(scan.report.files_seen, 3);
    assert_eq!(scan.report.papers_loaded, 2);
    assert_eq!(scan.report.skipped.len(), 1);
    assert_eq!(scan.report.skipped[0].paper_id, "BROKEN");
    assert_eq!(scan.report.skipped[0].kind, SkipKind::Malformed);
    assert_eq!(scan.index.papers(), &set(&["A", "B"]));
}

#[test]
fn test_wrong_shape_is_skipped_individually() {
    let fixture = CorpusFixture::new();
    fixture.write_paper("A", &paper_a());
    fixture.write_paper("C", &json!({"construct": ["Inhibition"], "contrast": "incongruent vs. congruent"}));
    fixture.write_paper("D", &json!({"brain_region": "ACC"}));

    let store = PaperStore::open(fixture.path(), StoreOptions::default()).unwrap();
    let scan = store.scan().unwrap();

    let skipped: Vec<_> = scan.report.skipped.iter().map(|s| (s.paper_id.as_str(), s.kind)).collect();
    assert_eq!(skipped, vec![("C", SkipKind::UnexpectedShape), ("D", SkipKind::UnexpectedShape)]);
    assert!(!scan.index.all_constructs().contains("Inhibition"));
    assert_eq!(scan.index.papers(), &set(&["A"]));
}

#[test]
fn test_null_fields_are_skipped_not_merged() {
    let fixture = CorpusFixture::new();
    fixture.write_paper("A", &paper_a());
    fixture.write_paper("E", &json!({"construct": null, "condition": {"N-back": null}}));
    fixture.write_paper("F", &json!({"task": ["Stroop"], "condition": {"Stroop": null}}));

    let store = PaperStore::open(fixture.path(), StoreOptions::default()).unwrap();
    let scan = store.scan().unwrap();

    assert_eq!(scan.report.papers_loaded, 1);
    let skipped: Vec<_> = scan.report.skipped.iter().map(|s| (s.paper_id.as_str(), s.kind)).collect();
    assert_eq!(skipped, vec![("E", SkipKind::UnexpectedShape), ("F", SkipKind::UnexpectedShape)]);
    assert!(!scan.index.all_tasks().contains("Stroop"));
    assert_eq!(scan.index.papers(), &set(&["A"]));
}

#[test]
fn test_rescanning_is_stable() {
    let fixture = CorpusFixture::new();
    fixture.write_paper("A", &paper_a());
    fixture.write_paper("B", &paper_b());

    let store = PaperStore::open(fixture.path(), StoreOptions::default()).unwrap();
    let first = store.scan().unwrap().index;

    // Same content under another id only adds that id to the reverse index.
    fixture.write_paper("A2", &paper_a());
    let second = store.scan().unwrap().index;
    assert_eq!(first.all_constructs(), second.all_constructs());
    assert_eq!(first.conditions_by_task(), second.conditions_by_task());
    assert_eq!(second.concept_to_papers()["Working Memory"], set(&["A", "A2", "B"]));
}

#[test]
fn test_lowercase_policy_end_to_end() {
    let fixture = CorpusFixture::new();
    fixture.write_paper("A", &paper_a());
    fixture.write_paper("B", &json!({"construct": ["working memory"], "condition": {"n-back": ["4-back"]}}));

    let options = StoreOptions { normalise: NormalisePolicy::Lowercase, ..Default::default() };
    let scan = PaperStore::open(fixture.path(), options).unwrap().scan().unwrap();

    assert_eq!(scan.index.all_constructs(), &set(&["working memory"]));
    assert_eq!(scan.index.conditions_by_task()["n-back"], set(&["2-back", "3-back", "4-back"]));
    assert_eq!(scan.index.concept_to_papers()["working memory"], set(&["A", "B"]));
}

#[test]
fn test_batch_split_then_scan_then_export() {
    let fixture = CorpusFixture::new();
    let batch = [
        batch_line("A", &format!("```json\n{}\n```", paper_a())),
        batch_line("B", &paper_b().to_string()),
        batch_line("C", "I could not find any constructs."),
    ]
    .join("\n");
    let batch_file = fixture.write_raw("batch_0.jsonl", &batch);
    let results = fixture.path().join("results_fulltext");

    let split = split_batch_output(&batch_file, &results, &BatchSplitOptions::default()).unwrap();
    assert_eq!(split.written.len(), 2);
    assert_eq!(split.failures.len(), 1);

    let store = PaperStore::open(&results, StoreOptions::default()).unwrap();
    let scan = store.scan().unwrap();
    assert_eq!(scan.index.papers(), &set(&["A", "B"]));

    let out = fixture.path().join("aggregate");
    write_index(&out.join("corpus_index.json"), &scan.index, &scan.report, &results).unwrap();
    let n = write_concept_list(&out.join("concepts.jsonl"), &scan.index).unwrap();
    assert_eq!(n, concept_lines(&scan.index).len());
    assert_eq!(n, 3);

    let doc = fixture.read_json("aggregate/corpus_index.json");
    assert_eq!(doc["stats"]["papers"], json!(2));
    assert_eq!(doc["index"]["concept_to_papers"]["N-back"], json!(["A", "B"]));
}
