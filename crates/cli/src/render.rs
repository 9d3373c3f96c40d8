// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering pipeline results to the console.

use crate::color;
use clap::ValueEnum;
use porch_core::{PipelineExecutionResult, PipelineFailure, TerminalState, Value};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Text form of one output object: strings print raw, everything else as
/// compact JSON.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Print a result. Output goes to `out`; in text mode errors and the
/// failure go to `err`.
pub fn write_result(
    out: &mut impl Write,
    err: &mut impl Write,
    result: &PipelineExecutionResult,
    format: OutputFormat,
    colorize: bool,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string(result).map_err(io::Error::other)?;
            writeln!(out, "{}", json)
        }
        OutputFormat::Text => {
            for value in result.output() {
                writeln!(out, "{}", format_value(value))?;
            }
            for record in result.errors() {
                writeln!(err, "{}", color::warn(&record.to_string(), colorize))?;
            }
            match (result.state(), result.failure()) {
                (TerminalState::Stopped, Some(PipelineFailure::Shutdown)) => {
                    writeln!(err, "{}", color::warn("cancelled: engine shut down", colorize))
                }
                (TerminalState::Stopped, _) => writeln!(err, "{}", color::warn("stopped", colorize)),
                (_, Some(failure)) => {
                    writeln!(err, "{}", color::error(&format!("error: {}", failure), colorize))
                }
                (_, None) => Ok(()),
            }
        }
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
