//! Splits a downloaded LLM batch output file into per-paper extraction files.
//!
//! Each line of the batch output is one chat-completion response:
//! `{"custom_id": "PMC123", "response": {"body": {"choices": [{"message": {"content": "..."}}]}}}`.
//! The reply content is usually a JSON object wrapped in a Markdown code fence.
//! Bad lines are recorded and skipped; the rest of the file is still written.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ontolearn_common::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::export::write_atomic;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSplitOptions {
    /// Replace extraction files that already exist.
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLineFailure {
    /// 1-based line number in the batch output.
    pub line: usize,
    pub custom_id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSplitReport {
    pub written: Vec<PathBuf>,
    pub skipped_existing: usize,
    pub failures: Vec<BatchLineFailure>,
}

// ── Wire shape of one batch output line ──────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BatchLine {
    custom_id: String,
    #[serde(default)]
    response: Option<BatchResponse>,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    body: Option<ResponseBody>,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

impl BatchLine {
    fn content(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .body
            .as_ref()?
            .choices
            .first()?
            .message
            .content
            .as_deref()
    }
}

// ── Splitting ────────────────────────────────────────────────────────────────

/// Write one `<custom_id>.json` per successful response into `results_dir`.
#[instrument(skip_all, fields(batch = %batch_file.display(), out = %results_dir.display()))]
pub fn split_batch_output(
    batch_file: &Path,
    results_dir: &Path,
    options: &BatchSplitOptions,
) -> Result<BatchSplitReport> {
    std::fs::create_dir_all(results_dir)?;
    let reader = BufReader::new(std::fs::File::open(batch_file)?);

    let mut report = BatchSplitReport::default();

    for (idx, raw) in reader.split(b'\n').enumerate() {
        let line_no = idx + 1;
        let raw = raw?;

        let parsed = std::str::from_utf8(&raw)
            .map_err(|e| LineFailure::new(None, format!("line is not valid UTF-8: {e}")))
            .and_then(|line| {
                let line = line.trim();
                if line.is_empty() { Ok(None) } else { parse_line(line).map(Some) }
            });

        let (custom_id, extraction) = match parsed {
            Ok(Some(parsed)) => parsed,
            Ok(None) => continue,
            Err(failure) => {
                let failure = failure.at(line_no);
                warn!(line = line_no, custom_id = ?failure.custom_id, "Skipping batch line: {}", failure.reason);
                report.failures.push(failure);
                continue;
            }
        };

        let path = results_dir.join(format!("{}.json", file_stem_for(&custom_id)));
        if path.exists() && !options.overwrite {
            debug!(custom_id = %custom_id, "Extraction already present");
            report.skipped_existing += 1;
            continue;
        }

        write_atomic(&path, &serde_json::to_vec_pretty(&extraction)?)?;
        report.written.push(path);
    }

    info!(
        written = report.written.len(),
        skipped_existing = report.skipped_existing,
        failed = report.failures.len(),
        "Batch output split"
    );
    Ok(report)
}

struct LineFailure {
    custom_id: Option<String>,
    reason: String,
}

impl LineFailure {
    fn new(custom_id: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            custom_id: custom_id.map(str::to_string),
            reason: reason.into(),
        }
    }

    fn at(self, line: usize) -> BatchLineFailure {
        BatchLineFailure {
            line,
            custom_id: self.custom_id,
            reason: self.reason,
        }
    }
}

fn parse_line(line: &str) -> std::result::Result<(String, Value), LineFailure> {
    let raw: Value = serde_json::from_str(line)
        .map_err(|e| LineFailure::new(None, format!("invalid JSON line: {e}")))?;
    let id_hint = raw.get("custom_id").and_then(Value::as_str);

    let parsed: BatchLine = serde_json::from_value(raw.clone())
        .map_err(|e| LineFailure::new(id_hint, format!("unexpected batch line shape: {e}")))?;
    let id = Some(parsed.custom_id.as_str());

    if parsed.custom_id.trim().is_empty() {
        return Err(LineFailure::new(id, "empty custom_id"));
    }

    let content = parsed
        .content()
        .ok_or_else(|| LineFailure::new(id, "response has no message content"))?;

    let extraction: Value = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| LineFailure::new(id, format!("reply is not JSON: {e}")))?;
    if !extraction.is_object() {
        return Err(LineFailure::new(id, "reply is not a JSON object"));
    }

    Ok((parsed.custom_id.clone(), extraction))
}

/// Remove a surrounding Markdown code fence (```` ```json ... ``` ````), if any.
pub fn strip_code_fence(content: &str) -> &str {
    match fence_regex().captures(content).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => content.trim(),
    }
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*[ \t]*\r?\n?(.*?)\s*```\s*$")
            .expect("fence pattern is valid")
    })
}

fn file_stem_for(custom_id: &str) -> String {
    custom_id.trim().replace(['/', '\\'], "_")
}
