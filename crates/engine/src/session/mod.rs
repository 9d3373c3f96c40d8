// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interpreter session interface.
//!
//! The engine treats the interpreter as an opaque execution context: it asks
//! the session for a pipeline built from a [`PipelineSpec`], hands the
//! pipeline an [`InvocationContext`] holding its streams, and reads the
//! streams back once the pipeline has stopped.

pub mod builtin;

pub use builtin::BuiltinSession;

use porch_core::{BatchFlags, CommandSpec, ErrorRecord, Value};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Lifecycle of an interpreter session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotOpened,
    Opened,
    Closing,
    Closed,
    Broken,
}

impl SessionState {
    /// Closing, closed or broken: no further pipelines can run.
    pub fn is_finished(self) -> bool {
        matches!(self, SessionState::Closing | SessionState::Closed | SessionState::Broken)
    }
}

porch_core::simple_display! {
    SessionState {
        NotOpened => "not opened",
        Opened => "opened",
        Closing => "closing",
        Closed => "closed",
        Broken => "broken",
    }
}

/// Errors raised by a session outside of script execution.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is {0}")]
    NotOpen(SessionState),

    #[error("parse error in `{text}`: {message}")]
    Parse { text: String, message: String },

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("failed to open session: {0}")]
    Open(String),
}

/// How a pipeline invocation ended abnormally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// Execution halted because a stop was requested.
    #[error("pipeline stopped")]
    Stopped,

    /// A terminating error.
    #[error("{message}")]
    Failed { message: String },
}

impl ScriptError {
    pub fn failed(message: impl Into<String>) -> Self {
        ScriptError::Failed { message: message.into() }
    }
}

/// Commands and flags for one pipeline, as handed to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    pub commands: Vec<CommandSpec>,
    pub flags: BatchFlags,
}

impl PipelineSpec {
    /// Chain a batch's commands into one pipeline description.
    ///
    /// `run_as_script` promotes every command to script text;
    /// `append_default_output` adds the terminal default-output step.
    pub fn from_batch(commands: &[CommandSpec], flags: BatchFlags) -> Self {
        let mut chained: Vec<CommandSpec> = commands
            .iter()
            .cloned()
            .map(|mut spec| {
                spec.is_script |= flags.run_as_script;
                spec
            })
            .collect();
        if flags.append_default_output {
            chained.push(CommandSpec::default_output());
        }
        Self { commands: chained, flags }
    }
}

/// Streams of one running pipeline.
///
/// The input stream is already closed: every input value was written before
/// the pipeline started, so exhausting it signals end-of-input.
pub struct InvocationContext<'a> {
    input: std::vec::IntoIter<Value>,
    output: &'a mut Vec<Value>,
    errors: &'a mut Vec<ErrorRecord>,
    stop: &'a CancellationToken,
}

impl<'a> InvocationContext<'a> {
    pub fn new(
        input: Vec<Value>,
        output: &'a mut Vec<Value>,
        errors: &'a mut Vec<ErrorRecord>,
        stop: &'a CancellationToken,
    ) -> Self {
        Self { input: input.into_iter(), output, errors, stop }
    }

    pub fn read_input(&mut self) -> Option<Value> {
        self.input.next()
    }

    /// Read the rest of the input stream.
    pub fn take_input(&mut self) -> Vec<Value> {
        self.input.by_ref().collect()
    }

    pub fn write_output(&mut self, value: Value) {
        self.output.push(value);
    }

    pub fn write_error(&mut self, record: ErrorRecord) {
        self.errors.push(record);
    }

    /// A stop has been requested; the interpreter should halt and return
    /// [`ScriptError::Stopped`].
    pub fn is_stopping(&self) -> bool {
        self.stop.is_cancelled()
    }

    pub fn stop_token(&self) -> &CancellationToken {
        self.stop
    }
}

/// One executable pipeline created by a session. Dropping it disposes it.
pub trait SessionPipeline: Send + 'static {
    /// Run to completion on the calling thread.
    fn invoke(&mut self, ctx: &mut InvocationContext<'_>) -> Result<(), ScriptError>;
}

/// The shared, single-threaded execution context all batches run against.
///
/// Implementations need no internal locking for pipeline execution: the
/// engine never runs two pipelines at once.
pub trait InterpreterSession: Send + Sync + 'static {
    type Pipeline: SessionPipeline;

    /// Open the session, running any configuration steps.
    fn open(&self) -> Result<(), SessionError>;

    fn close(&self) -> Result<(), SessionError>;

    fn state(&self) -> SessionState;

    fn create_pipeline(&self, spec: &PipelineSpec) -> Result<Self::Pipeline, SessionError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
