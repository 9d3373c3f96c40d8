//! Specs for config file loading and logging.

use crate::prelude::*;

#[test]
fn explicit_config_file_is_loaded() {
    let project = Project::empty();
    let config = project.file("porch.toml", "[engine]\nsync_routing = \"direct\"\n");

    cli().arg("--config").arg(&config).args(&["-c", "echo 1"]).passes().stdout_eq("1\n");
}

#[test]
fn config_from_env_var() {
    let project = Project::empty();
    let config = project.file("porch.toml", "[engine]\nshutdown = \"cancel\"\n");

    cli().env("PORCH_CONFIG", &config).args(&["-c", "echo 1"]).passes();
}

#[test]
fn invalid_config_is_reported() {
    let project = Project::empty();
    let config = project.file("porch.toml", "[engine]\nbogus = 1\n");

    cli()
        .arg("--config")
        .arg(&config)
        .args(&["-c", "echo 1"])
        .exits(2)
        .stderr_has("invalid config");
}

#[test]
fn log_file_receives_engine_logs() {
    let project = Project::empty();
    let log = project.path().join("logs").join("porch.log");

    cli()
        .env("PORCH_LOG", "porch_engine=debug")
        .arg("--log-file")
        .arg(&log)
        .args(&["-c", "echo 1"])
        .passes();

    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.contains("batch queued"), "log:\n{}", text);
}
