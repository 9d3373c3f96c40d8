// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers for driving the `porch` binary.

#![allow(dead_code)]

use assert_cmd::Command;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub use similar_asserts::assert_eq;

/// A `porch` invocation under construction.
pub struct Cli {
    cmd: Command,
}

/// Start a `porch` invocation with a clean environment.
pub fn cli() -> Cli {
    let mut cmd = Command::cargo_bin("porch").unwrap();
    cmd.env_remove("PORCH_CONFIG")
        .env_remove("PORCH_LOG")
        .env("NO_COLOR", "1")
        // Keep the user's config file out of the way.
        .env("XDG_CONFIG_HOME", "/nonexistent-porch-config")
        .env("HOME", "/nonexistent-porch-home");
    Cli { cmd }
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.cmd.arg(arg);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.cmd.write_stdin(input.to_string());
        self
    }

    /// Run and expect exit status 0.
    pub fn passes(self) -> Run {
        self.exits(0)
    }

    /// Run and expect exactly `code`.
    pub fn exits(mut self, code: i32) -> Run {
        let output = self.cmd.output().unwrap();
        let run = Run {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        assert_eq!(
            output.status.code(),
            Some(code),
            "unexpected exit status\nstdout:\n{}\nstderr:\n{}",
            run.stdout,
            run.stderr
        );
        run
    }
}

/// Captured output of a finished invocation.
pub struct Run {
    pub stdout: String,
    pub stderr: String,
}

impl Run {
    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout missing {:?}:\n{}", needle, self.stdout);
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        assert_eq!(self.stdout, expected);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr missing {:?}:\n{}", needle, self.stderr);
        self
    }
}

/// A scratch directory for scripts and config files.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `rel`, creating parents.
    pub fn file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }
}
