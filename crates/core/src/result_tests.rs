// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn completed_result_has_no_failure() {
    let result = PipelineExecutionResult::completed(vec![json!(1)], vec![]);

    assert_eq!(result.state(), TerminalState::Completed);
    assert!(result.failure().is_none());
    assert!(result.is_success());
    assert_eq!(result.first_output(), Some(&json!(1)));
}

#[test]
fn failed_result_keeps_partial_output() {
    let result = PipelineExecutionResult::failed(
        vec![json!("before")],
        vec![ErrorRecord::new("warn")],
        PipelineFailure::script("boom"),
    );

    assert_eq!(result.state(), TerminalState::Failed);
    assert_eq!(result.output(), &[json!("before")]);
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.failure(), Some(&PipelineFailure::script("boom")));
    assert!(!result.is_success());
}

#[test]
fn stopped_result_is_not_success() {
    let result = PipelineExecutionResult::stopped(vec![], vec![]);
    assert_eq!(result.state(), TerminalState::Stopped);
    assert!(result.failure().is_none());
    assert!(!result.is_success());
}

#[test]
fn not_started_is_failed_without_output() {
    let result = PipelineExecutionResult::not_started(PipelineFailure::build("bad"));

    assert_eq!(result.state(), TerminalState::Failed);
    assert!(result.output().is_empty());
    assert!(result.pipeline_id().is_none());
}

#[test]
fn cancelled_is_stopped_with_shutdown_failure() {
    let result = PipelineExecutionResult::cancelled();
    assert_eq!(result.state(), TerminalState::Stopped);
    assert_eq!(result.failure(), Some(&PipelineFailure::Shutdown));
}

#[test]
fn clone_is_independent_of_original() {
    let original = PipelineExecutionResult::completed(vec![json!(1), json!(2)], vec![]);
    let copy = original.clone();
    let output = original.into_output();

    assert_eq!(output, vec![json!(1), json!(2)]);
    assert_eq!(copy.output(), &[json!(1), json!(2)]);
}

#[test]
fn serializes_for_json_rendering() {
    let result = PipelineExecutionResult::failed(
        vec![json!("x")],
        vec![],
        PipelineFailure::script("nope"),
    )
    .with_pipeline_id(PipelineId::from_string("pip-1"))
    .with_elapsed(Duration::from_millis(12));

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value,
        json!({
            "pipeline_id": "pip-1",
            "output": ["x"],
            "errors": [],
            "failure": { "kind": "script", "message": "nope" },
            "state": "failed",
            "elapsed_ms": 12,
        })
    );
}

#[test]
fn failure_display_messages() {
    assert_eq!(PipelineFailure::script("boom").to_string(), "boom");
    assert_eq!(
        PipelineFailure::build("unknown command").to_string(),
        "failed to build pipeline: unknown command"
    );
    assert_eq!(
        PipelineFailure::SessionUnavailable { state: "closed".into() }.to_string(),
        "interpreter session is closed"
    );
}
