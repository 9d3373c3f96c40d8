// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One pipeline invocation and its state machine.
//!
//! A [`Pipeline`] wraps a session pipeline with the streams it reads and
//! writes. Invoking it moves `NotStarted → Running → terminal`, classifies
//! the outcome, disposes the session pipeline and returns the result.

use crate::session::{InvocationContext, ScriptError, SessionPipeline};
use porch_core::{
    PipelineExecutionResult, PipelineFailure, PipelineId, PipelineState, TerminalState, Value,
};
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

thread_local! {
    static ON_PIPELINE_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// The calling thread is currently running a pipeline.
pub fn on_pipeline_thread() -> bool {
    ON_PIPELINE_THREAD.with(Cell::get)
}

struct PipelineThreadGuard(bool);

impl PipelineThreadGuard {
    fn enter() -> Self {
        Self(ON_PIPELINE_THREAD.with(|flag| flag.replace(true)))
    }
}

impl Drop for PipelineThreadGuard {
    fn drop(&mut self) {
        let previous = self.0;
        ON_PIPELINE_THREAD.with(|flag| flag.set(previous));
    }
}

/// Observer of pipeline state transitions.
pub type StateListener = Arc<dyn Fn(&PipelineId, PipelineState) + Send + Sync>;

pub struct Pipeline<P> {
    id: PipelineId,
    raw: P,
    input: Vec<Value>,
    state: PipelineState,
    stop: CancellationToken,
    listener: Option<StateListener>,
}

impl<P: SessionPipeline> Pipeline<P> {
    pub fn new(raw: P, input: Vec<Value>) -> Self {
        Self {
            id: PipelineId::new(),
            raw,
            input,
            state: PipelineState::NotStarted,
            stop: CancellationToken::new(),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Option<StateListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn id(&self) -> &PipelineId {
        &self.id
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Token that requests a stop when cancelled. Cancelling after the
    /// pipeline finished has no effect.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Apply a transition. Illegal transitions are logged and ignored; a
    /// panicking listener is logged and does not affect the pipeline.
    fn transition(&mut self, next: PipelineState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                pipeline_id = %self.id,
                from = %self.state,
                to = %next,
                "ignoring illegal pipeline transition"
            );
            return;
        }
        tracing::debug!(
            pipeline_id = %self.id,
            from = %self.state,
            to = %next,
            "pipeline transition"
        );
        self.state = next;
        let Some(listener) = &self.listener else {
            return;
        };
        let id = &self.id;
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(id, next))) {
            tracing::error!(
                pipeline_id = %self.id,
                state = %next,
                panic = %panic_message(payload.as_ref()),
                "state listener panicked"
            );
        }
    }

    /// Run to completion on the calling thread.
    ///
    /// The session pipeline is dropped before the result is returned, so a
    /// completion callback never observes a live pipeline.
    pub fn invoke(mut self) -> PipelineExecutionResult {
        let started = Instant::now();
        self.transition(PipelineState::Running);

        let mut output = Vec::new();
        let mut errors = Vec::new();
        let outcome = {
            let input = std::mem::take(&mut self.input);
            let mut ctx = InvocationContext::new(input, &mut output, &mut errors, &self.stop);
            let raw = &mut self.raw;
            let _lane = PipelineThreadGuard::enter();
            catch_unwind(AssertUnwindSafe(|| raw.invoke(&mut ctx)))
        };

        let (terminal, failure) = match outcome {
            Ok(Ok(())) => (TerminalState::Completed, None),
            Ok(Err(ScriptError::Stopped)) => (TerminalState::Stopped, None),
            Ok(Err(ScriptError::Failed { message })) => {
                (TerminalState::Failed, Some(PipelineFailure::script(message)))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(pipeline_id = %self.id, %message, "interpreter panicked");
                (TerminalState::Failed, Some(PipelineFailure::Panicked { message }))
            }
        };
        self.transition(terminal.into());

        let Pipeline { id, raw, .. } = self;
        drop(raw);

        let result = match (terminal, failure) {
            (TerminalState::Completed, _) => PipelineExecutionResult::completed(output, errors),
            (TerminalState::Stopped, _) => PipelineExecutionResult::stopped(output, errors),
            (TerminalState::Failed, failure) => PipelineExecutionResult::failed(
                output,
                errors,
                failure.unwrap_or_else(|| PipelineFailure::script("pipeline failed")),
            ),
        };
        result.with_pipeline_id(id).with_elapsed(started.elapsed())
    }

    /// Run on a freshly spawned thread, handing the result to `on_done`.
    ///
    /// An error means the thread could not be started; `on_done` is dropped
    /// without being called.
    pub fn invoke_async<F>(self, on_done: F) -> std::io::Result<()>
    where
        F: FnOnce(PipelineExecutionResult) + Send + 'static,
    {
        let name = format!("porch-pipe-{}", self.id.short(8));
        std::thread::Builder::new().name(name).spawn(move || on_done(self.invoke()))?;
        Ok(())
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
