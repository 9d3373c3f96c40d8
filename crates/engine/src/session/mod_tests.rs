// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn texts(spec: &PipelineSpec) -> Vec<&str> {
    spec.commands.iter().map(|c| c.text.as_str()).collect()
}

#[test]
fn from_batch_keeps_commands_in_order() {
    let commands = vec![CommandSpec::command("echo 1"), CommandSpec::script("count")];
    let spec = PipelineSpec::from_batch(&commands, BatchFlags::default());

    assert_eq!(texts(&spec), vec!["echo 1", "count"]);
    assert!(!spec.commands[0].is_script);
    assert!(spec.commands[1].is_script);
}

#[test]
fn from_batch_appends_default_output() {
    let commands = vec![CommandSpec::script("echo 1")];
    let flags = BatchFlags { append_default_output: true, ..BatchFlags::default() };
    let spec = PipelineSpec::from_batch(&commands, flags);

    assert_eq!(texts(&spec), vec!["echo 1", "out-default"]);
    let last = spec.commands.last().unwrap();
    assert!(last.merge_errors);
    assert!(last.is_default_output());
}

#[test]
fn from_batch_run_as_script_promotes_commands() {
    let commands = vec![CommandSpec::command("echo a; echo b")];
    let flags = BatchFlags { run_as_script: true, ..BatchFlags::default() };
    let spec = PipelineSpec::from_batch(&commands, flags);

    assert!(spec.commands[0].is_script);
}

#[yare::parameterized(
    not_opened = { SessionState::NotOpened, false },
    opened     = { SessionState::Opened,    false },
    closing    = { SessionState::Closing,   true },
    closed     = { SessionState::Closed,    true },
    broken     = { SessionState::Broken,    true },
)]
fn finished_states(state: SessionState, expected: bool) {
    assert_eq!(state.is_finished(), expected);
}

#[test]
fn context_input_is_closed_after_reading() {
    let stop = CancellationToken::new();
    let mut output = Vec::new();
    let mut errors = Vec::new();
    let mut ctx = InvocationContext::new(vec![json!(1), json!(2)], &mut output, &mut errors, &stop);

    assert_eq!(ctx.read_input(), Some(json!(1)));
    assert_eq!(ctx.take_input(), vec![json!(2)]);
    assert_eq!(ctx.read_input(), None);
}

#[test]
fn context_writes_reach_streams() {
    let stop = CancellationToken::new();
    let mut output = Vec::new();
    let mut errors = Vec::new();
    {
        let mut ctx = InvocationContext::new(vec![], &mut output, &mut errors, &stop);
        ctx.write_output(json!("a"));
        ctx.write_error(ErrorRecord::new("bad"));
        assert!(!ctx.is_stopping());
        stop.cancel();
        assert!(ctx.is_stopping());
    }

    assert_eq!(output, vec![json!("a")]);
    assert_eq!(errors, vec![ErrorRecord::new("bad")]);
}
