//! Specs for running commands, scripts and the line REPL.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
fn command_prints_output() {
    cli().args(&["-c", "echo 1"]).passes().stdout_eq("1\n");
}

#[test]
fn command_prints_strings_raw() {
    cli().args(&["-c", "echo hello world"]).passes().stdout_eq("hello\nworld\n");
}

#[test]
fn terminating_error_exits_one() {
    cli().args(&["-c", "throw-error boom"]).exits(1).stderr_has("error: boom");
}

#[test]
fn unknown_command_is_a_build_failure() {
    cli()
        .args(&["-c", "frobnicate"])
        .exits(1)
        .stderr_has("failed to build pipeline")
        .stderr_has("frobnicate");
}

/// Console lines end in the default-output step, which routes the error
/// stream into output.
#[test]
fn default_output_merges_errors_into_output() {
    cli().args(&["-c", "write-error disk full"]).passes().stdout_has("disk full");
}

#[test]
fn json_format_prints_the_result() {
    let run = cli().args(&["--format", "json", "-c", "echo 1 2"]).passes();
    let value: serde_json::Value = serde_json::from_str(run.stdout.trim()).unwrap();
    assert_eq!(value["output"], serde_json::json!([1, 2]));
    assert_eq!(value["state"], serde_json::json!("completed"));
}

#[test]
fn script_file_runs_as_one_batch() {
    let project = Project::empty();
    let script =
        project.file("count.porch", "#!/usr/bin/env porch\necho a b c | count\necho done\n");

    cli().arg(&script).passes().stdout_eq("3\ndone\n");
}

#[test]
fn missing_script_file_fails() {
    cli().arg("/nonexistent/script.porch").exits(2).stderr_has("failed to read script");
}

#[test]
fn repl_runs_each_line_in_order() {
    cli().stdin("echo hi\nset x 5\nget x\n").passes().stdout_eq("hi\n5\n");
}

#[test]
fn repl_keeps_going_after_a_failure() {
    cli()
        .stdin("throw-error nope\necho still here\n")
        .passes()
        .stdout_has("still")
        .stderr_has("error: nope");
}

#[test]
fn repl_history_records_lines() {
    cli().stdin("echo 1\nhistory\n").passes().stdout_eq("1\necho 1\nhistory\n");
}

#[test]
fn startup_lines_run_before_commands() {
    cli()
        .args(&["--startup", "set greeting hey", "-c", "get greeting"])
        .passes()
        .stdout_eq("hey\n");
}
