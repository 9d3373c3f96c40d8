// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Objects flowing through pipeline streams.

use serde::{Deserialize, Serialize};

/// An object produced or consumed by the interpreter.
pub type Value = serde_json::Value;

/// Non-terminating error written to a pipeline's error stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub message: String,
    /// Command that wrote the record, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl ErrorRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), command: None }
    }

    pub fn from_command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self { message: message.into(), command: Some(command.into()) }
    }

    /// Object form used when the error stream is merged into output.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::String(self.to_string()))
    }
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.command {
            Some(command) => write!(f, "{}: {}", command, self.message),
            None => f.write_str(&self.message),
        }
    }
}
