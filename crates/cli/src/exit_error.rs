// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error carrying a process exit code.
//!
//! Modes return `ExitError` instead of calling `std::process::exit()`
//! directly, so `main()` owns process termination and the engine is shut
//! down on every path.

use porch_core::{PipelineExecutionResult, TerminalState};
use std::fmt;

/// Exit code for a batch that ended Failed.
pub const FAILED: i32 = 1;
/// Exit code for a batch that was stopped (as for SIGINT).
pub const STOPPED: i32 = 130;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// The exit status a finished batch maps to, if it is not success.
    pub fn from_result(result: &PipelineExecutionResult) -> Option<Self> {
        match result.state() {
            TerminalState::Completed => None,
            TerminalState::Failed => Some(Self::new(FAILED, "")),
            TerminalState::Stopped => Some(Self::new(STOPPED, "")),
        }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
