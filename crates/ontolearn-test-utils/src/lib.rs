//! Shared testing utilities: throwaway corpus directories and canned
//! extraction / batch-output payloads.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;

/// A temporary directory populated with extraction files. Removed on drop.
pub struct CorpusFixture {
    dir: TempDir,
}

impl CorpusFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp corpus dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `<paper_id>.json` containing `value`.
    pub fn write_paper(&self, paper_id: &str, value: &Value) -> PathBuf {
        let body = serde_json::to_string_pretty(value).expect("serialize fixture");
        self.write_raw(&format!("{paper_id}.json"), &body)
    }

    /// Write a file verbatim, e.g. deliberately broken JSON.
    pub fn write_raw(&self, file_name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(file_name);
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    pub fn subdir(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::create_dir_all(&path).expect("create fixture subdir");
        path
    }

    pub fn read_json(&self, file_name: &str) -> Value {
        let body = fs::read_to_string(self.dir.path().join(file_name)).expect("read fixture output");
        serde_json::from_str(&body).expect("fixture output is JSON")
    }
}

impl Default for CorpusFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Paper A of the two-paper working-memory scenario.
pub fn paper_a() -> Value {
    json!({
        "construct": ["Working Memory"],
        "task": ["N-back"],
        "condition": {"N-back": ["2-back", "3-back"]}
    })
}

/// Paper B: overlaps A and contributes an empty condition list.
pub fn paper_b() -> Value {
    json!({
        "construct": ["Working Memory", "Attention"],
        "task": ["N-back"],
        "condition": {"N-back": []}
    })
}

/// One line of an LLM batch output file carrying `content` as the reply.
pub fn batch_line(custom_id: &str, content: &str) -> String {
    json!({
        "id": format!("batch_req_{custom_id}"),
        "custom_id": custom_id,
        "response": {
            "status_code": 200,
            "body": {
                "model": "gpt-4o-2024-08-06",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": content}}
                ]
            }
        }
    })
    .to_string()
}
