// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use porch_engine::{ShutdownPolicy, SyncRouting};
use serial_test::serial;
use std::io::Write;

#[test]
fn empty_file_gives_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.log.level, "warn");
}

#[test]
fn parses_engine_and_log_sections() {
    let config = Config::parse(
        r#"
[engine]
sync_routing = "direct"
shutdown = "cancel"

[log]
level = "debug"
file = "/tmp/porch.log"
"#,
    )
    .unwrap();

    assert_eq!(config.engine.sync_routing, SyncRouting::Direct);
    assert_eq!(config.engine.shutdown, ShutdownPolicy::Cancel);
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.log.file, Some(PathBuf::from("/tmp/porch.log")));
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(Config::parse("[log]\ncolour = true\n").is_err());
}

#[test]
fn explicit_path_wins() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[log]\nlevel = \"info\"").unwrap();

    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.log.level, "info");
}

#[test]
fn missing_explicit_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
}

#[test]
#[serial]
fn env_var_names_the_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[engine]\nthread_name = \"from-env\"").unwrap();
    std::env::set_var(CONFIG_ENV, file.path());

    let config = Config::load(None);
    std::env::remove_var(CONFIG_ENV);

    assert_eq!(config.unwrap().engine.thread_name, "from-env");
}

#[test]
#[serial]
fn explicit_path_beats_env_var() {
    std::env::set_var(CONFIG_ENV, "/definitely/not/here.toml");
    let explicit = PathBuf::from("/explicit.toml");

    let resolved = resolve_path(Some(&explicit));
    std::env::remove_var(CONFIG_ENV);

    assert_eq!(resolved, Some(explicit));
}
