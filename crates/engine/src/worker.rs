// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker loop: the single lane that drains the execution queue.

use crate::config::{EngineConfig, ShutdownPolicy};
use crate::gate::InvocationGate;
use crate::pipeline::{panic_message, Pipeline, StateListener};
use crate::queue::ExecutionQueue;
use crate::session::{InterpreterSession, PipelineSpec, SessionError};
use crate::signals::{SyncSet, Wake};
use porch_core::{
    BatchId, BatchParts, CommandBatch, CompletionCallback, PipelineExecutionResult,
    PipelineFailure,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// State shared by the engine façade and the worker thread.
pub(crate) struct Shared<S> {
    pub session: S,
    pub queue: ExecutionQueue,
    pub signals: Arc<SyncSet>,
    pub gate: Arc<InvocationGate>,
    pub listener: Option<StateListener>,
    pub config: EngineConfig,
}

impl<S: InterpreterSession> Shared<S> {
    pub fn new(session: S, config: EngineConfig, listener: Option<StateListener>) -> Self {
        let signals = Arc::new(SyncSet::new());
        Self {
            session,
            queue: ExecutionQueue::new(Arc::clone(&signals)),
            gate: Arc::new(InvocationGate::new(config.overlap, Arc::clone(&signals))),
            signals,
            listener,
            config,
        }
    }

    /// Build the pipeline for a batch.
    pub fn build(&self, parts: BatchParts) -> Result<Pipeline<S::Pipeline>, PipelineFailure> {
        let spec = PipelineSpec::from_batch(&parts.commands, parts.flags);
        let raw = self.session.create_pipeline(&spec).map_err(|e| match e {
            SessionError::NotOpen(state) => {
                PipelineFailure::SessionUnavailable { state: state.to_string() }
            }
            other => PipelineFailure::build(other.to_string()),
        })?;
        Ok(Pipeline::new(raw, parts.input).with_listener(self.listener.clone()))
    }

    /// Run one batch on the calling thread and deliver its result.
    pub fn execute(&self, batch: CommandBatch) {
        let (parts, callback) = batch.into_parts();
        let batch_id = parts.id.clone();
        debug!(%batch_id, commands = parts.commands.len(), "executing batch");

        let result = match self.build(parts) {
            Ok(pipeline) => {
                let pipeline_id = pipeline.id().clone();
                match self.gate.run(pipeline) {
                    Ok(result) => result,
                    Err(e) => {
                        error!(%batch_id, %pipeline_id, error = %e, "gate refused worker pipeline");
                        PipelineExecutionResult::not_started(PipelineFailure::Start {
                            message: e.to_string(),
                        })
                    }
                }
            }
            Err(failure) => {
                warn!(%batch_id, %failure, "failed to build pipeline");
                PipelineExecutionResult::not_started(failure)
            }
        };

        debug!(
            %batch_id,
            pipeline_id = result.pipeline_id().map(|id| id.as_str()).unwrap_or("-"),
            state = ?result.state(),
            elapsed_ms = result.elapsed().as_millis() as u64,
            "batch finished"
        );
        deliver(&batch_id, callback, result);
    }

    /// Close the queue and dispose of what is left per the shutdown policy.
    /// Idempotent.
    pub fn dispose_queued(&self) {
        let remaining = self.queue.close();
        if remaining.is_empty() {
            return;
        }
        match self.config.shutdown {
            ShutdownPolicy::Abandon => {
                for batch in &remaining {
                    warn!(batch_id = %batch.id(), "abandoning queued batch");
                }
            }
            ShutdownPolicy::Cancel => {
                for batch in remaining {
                    let (parts, callback) = batch.into_parts();
                    debug!(batch_id = %parts.id, "cancelling queued batch");
                    deliver(&parts.id, callback, PipelineExecutionResult::cancelled());
                }
            }
        }
    }

    /// Drain pass: execute queued batches until the queue is empty or the
    /// engine is halting.
    fn drain(&self) {
        while !self.signals.is_halted() {
            let Some(batch) = self.queue.dequeue() else {
                break;
            };
            self.execute(batch);
        }
    }
}

/// Hand a result to a batch callback. A panicking callback is logged and
/// otherwise ignored.
pub(crate) fn deliver(
    batch_id: &BatchId,
    callback: Option<CompletionCallback>,
    result: PipelineExecutionResult,
) {
    let Some(callback) = callback else {
        return;
    };
    if let Err(payload) = catch_unwind(AssertUnwindSafe(move || callback(result))) {
        error!(%batch_id, panic = %panic_message(payload.as_ref()), "completion callback panicked");
    }
}

/// Start the worker thread and wait until it has opened the session.
///
/// A session that fails to open aborts the engine; the thread still starts
/// and exits straight away.
pub(crate) fn spawn<S: InterpreterSession>(
    shared: Arc<Shared<S>>,
) -> std::io::Result<JoinHandle<()>> {
    let (ready_tx, ready_rx) = mpsc::sync_channel(1);
    let name = shared.config.thread_name.clone();
    let handle = std::thread::Builder::new().name(name).spawn(move || run(&shared, ready_tx))?;
    let _ = ready_rx.recv();
    Ok(handle)
}

fn run<S: InterpreterSession>(shared: &Shared<S>, ready: mpsc::SyncSender<()>) {
    if let Err(e) = shared.session.open() {
        error!(error = %e, "failed to open interpreter session");
        shared.signals.signal_abort();
    }
    let _ = ready.send(());

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build worker runtime");
            shared.signals.signal_abort();
            shared.dispose_queued();
            close_session(shared);
            return;
        }
    };

    info!(thread = %shared.config.thread_name, "worker started");
    runtime.block_on(async {
        loop {
            match shared.signals.wait_wake().await {
                Wake::Exit => {
                    debug!("worker woke for exit");
                    break;
                }
                Wake::Abort => {
                    warn!("worker woke for abort");
                    shared.dispose_queued();
                    break;
                }
                Wake::NewItem => shared.drain(),
            }
        }
    });

    close_session(shared);
    info!("worker stopped");
}

fn close_session<S: InterpreterSession>(shared: &Shared<S>) {
    if shared.session.state().is_finished() {
        return;
    }
    if let Err(e) = shared.session.close() {
        warn!(error = %e, "failed to close interpreter session");
    }
}
