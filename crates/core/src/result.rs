// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The outcome of running one batch.

use crate::{ErrorRecord, PipelineFailure, PipelineId, TerminalState, Value};
use serde::Serialize;
use std::time::Duration;

/// Output, errors and terminal state of one pipeline.
///
/// Built once when the pipeline reaches a terminal state and never mutated
/// afterwards. `output` and `errors` keep emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineExecutionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pipeline_id: Option<PipelineId>,
    output: Vec<Value>,
    errors: Vec<ErrorRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<PipelineFailure>,
    state: TerminalState,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_ms")]
    elapsed: Duration,
}

fn serialize_ms<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl PipelineExecutionResult {
    fn new(
        output: Vec<Value>,
        errors: Vec<ErrorRecord>,
        failure: Option<PipelineFailure>,
        state: TerminalState,
    ) -> Self {
        Self { pipeline_id: None, output, errors, failure, state, elapsed: Duration::ZERO }
    }

    pub fn completed(output: Vec<Value>, errors: Vec<ErrorRecord>) -> Self {
        Self::new(output, errors, None, TerminalState::Completed)
    }

    pub fn failed(output: Vec<Value>, errors: Vec<ErrorRecord>, failure: PipelineFailure) -> Self {
        Self::new(output, errors, Some(failure), TerminalState::Failed)
    }

    pub fn stopped(output: Vec<Value>, errors: Vec<ErrorRecord>) -> Self {
        Self::new(output, errors, None, TerminalState::Stopped)
    }

    /// A batch whose pipeline could not be built or started.
    pub fn not_started(failure: PipelineFailure) -> Self {
        Self::failed(Vec::new(), Vec::new(), failure)
    }

    /// A queued batch cancelled by engine shutdown.
    pub fn cancelled() -> Self {
        Self::new(Vec::new(), Vec::new(), Some(PipelineFailure::Shutdown), TerminalState::Stopped)
    }

    pub fn with_pipeline_id(mut self, id: PipelineId) -> Self {
        self.pipeline_id = Some(id);
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Pipeline that produced this result; absent when none was built.
    pub fn pipeline_id(&self) -> Option<&PipelineId> {
        self.pipeline_id.as_ref()
    }

    pub fn output(&self) -> &[Value] {
        &self.output
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    pub fn failure(&self) -> Option<&PipelineFailure> {
        self.failure.as_ref()
    }

    pub fn state(&self) -> TerminalState {
        self.state
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Completed without a terminating failure.
    pub fn is_success(&self) -> bool {
        self.state == TerminalState::Completed && self.failure.is_none()
    }

    pub fn first_output(&self) -> Option<&Value> {
        self.output.first()
    }

    /// Take ownership of the output stream.
    pub fn into_output(self) -> Vec<Value> {
        self.output
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
