// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command specifications.

use serde::{Deserialize, Serialize};

/// Name of the terminal step appended for batches that render default output.
pub const DEFAULT_OUTPUT_COMMAND: &str = "out-default";

/// One command in a batch: its text and how the interpreter should treat it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub text: String,
    /// Script text (statements, pipes) rather than a single command invocation.
    pub is_script: bool,
    /// Route this command's error stream into its output stream.
    #[serde(default)]
    pub merge_errors: bool,
}

impl CommandSpec {
    pub fn script(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_script: true, merge_errors: false }
    }

    pub fn command(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_script: false, merge_errors: false }
    }

    /// The terminal "default output" step, merging errors into output.
    pub fn default_output() -> Self {
        Self { text: DEFAULT_OUTPUT_COMMAND.to_string(), is_script: false, merge_errors: true }
    }

    pub fn merging_errors(mut self) -> Self {
        self.merge_errors = true;
        self
    }

    pub fn is_default_output(&self) -> bool {
        !self.is_script && self.text == DEFAULT_OUTPUT_COMMAND
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
