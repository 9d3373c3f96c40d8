//! CLI help output specs

use crate::prelude::*;

#[test]
fn porch_help_shows_usage() {
    cli().args(&["--help"]).passes().stdout_has("Usage:").stdout_has("--command");
}

#[test]
fn porch_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}

#[test]
fn command_and_file_conflict() {
    let project = Project::empty();
    let script = project.file("a.porch", "echo 1\n");
    cli().args(&["-c", "echo 1"]).arg(&script).exits(2).stderr_has("cannot be used with");
}
