// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use std::sync::{Arc, Mutex};

#[test]
fn builder_rejects_empty_command_list() {
    let err = CommandBatch::builder().input([json!(1)]).build().unwrap_err();
    assert_eq!(err, BatchError::NoCommands);
}

#[test]
fn builder_keeps_command_order_and_input() {
    let batch = CommandBatch::builder()
        .script("echo a")
        .command(CommandSpec::command("count"))
        .input([json!(1), json!(2)])
        .use_local_scope(true)
        .build()
        .unwrap();

    let texts: Vec<_> = batch.commands().iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["echo a", "count"]);
    assert!(batch.commands()[0].is_script);
    assert!(!batch.commands()[1].is_script);
    assert_eq!(batch.input(), &[json!(1), json!(2)]);
    assert!(batch.flags().use_local_scope);
    assert!(!batch.flags().add_to_history);
}

#[test]
fn interactive_batch_flags() {
    let batch = CommandBatch::interactive("echo 1");
    let flags = batch.flags();

    assert!(flags.add_to_history);
    assert!(flags.append_default_output);
    assert!(!flags.run_as_script);
    assert!(!flags.use_local_scope);
    assert!(!batch.has_callback());
}

#[test]
fn every_batch_gets_a_fresh_id() {
    let a = CommandBatch::script("echo a");
    let b = CommandBatch::script("echo a");
    assert_ne!(a.id(), b.id());
}

#[test]
fn into_parts_hands_back_callback() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let batch = CommandBatch::script("echo 1")
        .on_complete(move |r| *sink.lock().unwrap() = Some(r.state()));

    let (parts, callback) = batch.into_parts();
    assert_eq!(parts.commands.len(), 1);

    callback.unwrap()(PipelineExecutionResult::stopped(vec![], vec![]));
    assert_eq!(*seen.lock().unwrap(), Some(crate::TerminalState::Stopped));
}

#[test]
fn chain_completion_runs_both_in_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::clone(&order);
    let second = Arc::clone(&order);

    let batch = CommandBatch::script("echo 1")
        .on_complete(move |_| first.lock().unwrap().push("original"))
        .chain_completion(move |_| second.lock().unwrap().push("chained"));

    let (_, callback) = batch.into_parts();
    callback.unwrap()(PipelineExecutionResult::completed(vec![], vec![]));

    assert_eq!(*order.lock().unwrap(), vec!["original", "chained"]);
}

#[test]
fn chain_completion_without_existing_callback() {
    let hit = Arc::new(Mutex::new(false));
    let sink = Arc::clone(&hit);
    let (_, callback) = CommandBatch::script("x")
        .chain_completion(move |_| *sink.lock().unwrap() = true)
        .into_parts();

    callback.unwrap()(PipelineExecutionResult::completed(vec![], vec![]));
    assert!(*hit.lock().unwrap());
}

#[test]
fn debug_reports_callback_presence() {
    let batch = CommandBatch::script("echo 1").on_complete(|_| {});
    let debug = format!("{:?}", batch);
    assert!(debug.contains("on_complete: true"));
}

#[test]
fn default_output_spec_merges_errors() {
    let spec = CommandSpec::default_output();
    assert!(spec.merge_errors);
    assert!(spec.is_default_output());
    assert!(!CommandSpec::script("out-default").is_default_output());
}
