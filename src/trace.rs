//! Per-run execution traces, flushed to one JSON file at run completion.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use serde::Serialize;
use uuid::Uuid;

/// One step in a pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEvent {
    /// An LLM call is about to be issued.
    LlmStart { prompts: Vec<String> },
    /// An LLM call returned.
    LlmEnd { response: String },
}

/// Narrow tracing seam: record steps during a run, write the record once at
/// the end. One handler per run; handlers are never shared across runs.
pub trait TraceHandler: Send + Sync {
    fn record_step(&self, event: StepEvent);

    /// Flush the run record. Failures must not fail the run; implementations
    /// log and swallow them.
    fn finalize(&self, final_output: serde_json::Value);
}

/// Trace handler that discards everything. Used in tests.
#[derive(Debug, Default)]
pub struct NoopTraceHandler;

impl TraceHandler for NoopTraceHandler {
    fn record_step(&self, _event: StepEvent) {}
    fn finalize(&self, _final_output: serde_json::Value) {}
}

#[derive(Serialize)]
struct RunRecord<'a> {
    initial_query: &'a str,
    steps: &'a [StepEvent],
    final_output: serde_json::Value,
}

/// File-backed trace handler: accumulates steps in memory and writes
/// `{timestamp}_{sanitized query prefix}_{random suffix}.json` on finalize.
pub struct FileTraceHandler {
    path: PathBuf,
    initial_query: String,
    steps: Mutex<Vec<StepEvent>>,
}

impl FileTraceHandler {
    pub fn new(trace_dir: impl AsRef<Path>, query: &str) -> Self {
        let trace_dir = trace_dir.as_ref();
        if let Err(e) = std::fs::create_dir_all(trace_dir) {
            tracing::warn!(dir = %trace_dir.display(), error = %e, "could not create trace directory");
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let query_part = sanitize_for_filename(query);
        let unique = Uuid::new_v4().simple().to_string();
        let suffix = &unique[..8];
        let path = trace_dir.join(format!("{timestamp}_{query_part}_{suffix}.json"));

        Self {
            path,
            initial_query: query.to_string(),
            steps: Mutex::new(Vec::new()),
        }
    }

    /// Path the run record will be written to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TraceHandler for FileTraceHandler {
    fn record_step(&self, event: StepEvent) {
        if let Ok(mut steps) = self.steps.lock() {
            steps.push(event);
        }
    }

    fn finalize(&self, final_output: serde_json::Value) {
        let steps = match self.steps.lock() {
            Ok(steps) => steps,
            Err(poisoned) => poisoned.into_inner(),
        };

        let record = RunRecord {
            initial_query: &self.initial_query,
            steps: &steps,
            final_output,
        };

        let json = match serde_json::to_vec_pretty(&record) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "could not serialize run record");
                return;
            }
        };

        if let Err(e) = std::fs::write(&self.path, json) {
            tracing::warn!(path = %self.path.display(), error = %e, "could not write run record");
        }
    }
}

/// Strip filesystem-hostile characters, cap at 50 characters, spaces to
/// underscores.
fn sanitize_for_filename(query: &str) -> String {
    query
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .take(50)
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_hostile_characters() {
        assert_eq!(
            sanitize_for_filename(r#"what is a/b? "c:d""#),
            "what_is_ab_cd"
        );
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "x".repeat(200);
        assert_eq!(sanitize_for_filename(&long).chars().count(), 50);
    }

    #[test]
    fn sanitize_handles_multibyte_input() {
        let query = "π".repeat(120);
        assert_eq!(sanitize_for_filename(&query).chars().count(), 50);
    }
}
