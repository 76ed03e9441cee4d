//! Run-record file format and naming.

use serde_json::json;
use tempfile::tempdir;

use expert_qa::trace::{FileTraceHandler, StepEvent, TraceHandler};

#[test]
fn finalize_writes_one_record_with_steps_in_order() {
    let dir = tempdir().unwrap();

    let trace = FileTraceHandler::new(dir.path(), "how do I file this?");
    trace.record_step(StepEvent::LlmStart {
        prompts: vec!["CLASSIFY: how do I file this?".to_string()],
    });
    trace.record_step(StepEvent::LlmEnd {
        response: "3".to_string(),
    });
    trace.finalize(json!({ "final_answer": "the answer" }));

    let raw = std::fs::read_to_string(trace.path()).unwrap();
    let record: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(record["initial_query"], "how do I file this?");
    assert_eq!(record["final_output"]["final_answer"], "the answer");

    let steps = record["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["type"], "llm_start");
    assert_eq!(steps[0]["prompts"][0], "CLASSIFY: how do I file this?");
    assert_eq!(steps[1]["type"], "llm_end");
    assert_eq!(steps[1]["response"], "3");
}

#[test]
fn filename_is_sanitized_and_suffixed() {
    let dir = tempdir().unwrap();

    let trace = FileTraceHandler::new(dir.path(), r#"a/b?:"c" <d>|e"#);
    trace.finalize(json!(null));

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(entries.len(), 1);

    let name = entries[0].file_name().into_string().unwrap();
    assert!(name.ends_with(".json"));
    assert!(name.contains("abc_de"));
    for hostile in ['/', '?', ':', '"', '<', '>', '|'] {
        assert!(!name.contains(hostile), "filename contains {hostile:?}: {name}");
    }
}

#[test]
fn two_runs_for_the_same_query_get_distinct_files() {
    let dir = tempdir().unwrap();

    let first = FileTraceHandler::new(dir.path(), "same query");
    let second = FileTraceHandler::new(dir.path(), "same query");

    assert_ne!(first.path(), second.path());
}

#[test]
fn write_failure_is_swallowed() {
    let dir = tempdir().unwrap();

    let trace = FileTraceHandler::new(dir.path(), "query");
    drop(dir);

    // The target directory is gone; finalize must not panic.
    trace.finalize(json!({ "final_answer": "x" }));
}
