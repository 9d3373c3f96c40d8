// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine façade: submission, cancellation and shutdown.

use crate::config::{EngineConfig, SyncRouting};
use crate::error::EngineError;
use crate::pipeline::{self, StateListener};
use crate::session::InterpreterSession;
use crate::signals::Drain;
use crate::worker::{self, deliver, Shared};
use parking_lot::Mutex;
use porch_core::{BatchId, CommandBatch, PipelineExecutionResult, PipelineId, PipelineState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Builder for [`Engine`].
pub struct EngineBuilder<S> {
    session: S,
    config: EngineConfig,
    listener: Option<StateListener>,
}

impl<S: InterpreterSession> EngineBuilder<S> {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Observe every pipeline state transition, on whichever thread runs
    /// the pipeline.
    pub fn on_state_change(
        mut self,
        f: impl Fn(&PipelineId, PipelineState) + Send + Sync + 'static,
    ) -> Self {
        self.listener = Some(Arc::new(f));
        self
    }

    /// Spawn the worker loop. Returns once the session has been opened (or
    /// failed to open, in which case the engine is already aborted).
    pub fn build(self) -> Result<Engine<S>, EngineError> {
        let shared = Arc::new(Shared::new(self.session, self.config, self.listener));
        let handle = worker::spawn(Arc::clone(&shared)).map_err(EngineError::Spawn)?;
        let worker_thread = handle.thread().id();
        Ok(Engine {
            shared,
            worker: Mutex::new(Some(handle)),
            worker_thread,
            shut_down: AtomicBool::new(false),
        })
    }
}

/// Asynchronous command execution engine over one interpreter session.
///
/// Queued batches run one at a time, in submission order, on a dedicated
/// worker thread. Synchronous submissions block the caller and never
/// overlap with another pipeline.
pub struct Engine<S: InterpreterSession> {
    shared: Arc<Shared<S>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_thread: ThreadId,
    shut_down: AtomicBool,
}

impl<S: InterpreterSession> Engine<S> {
    pub fn builder(session: S) -> EngineBuilder<S> {
        EngineBuilder { session, config: EngineConfig::default(), listener: None }
    }

    /// An engine with default configuration.
    pub fn new(session: S) -> Result<Self, EngineError> {
        Self::builder(session).build()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    pub fn session(&self) -> &S {
        &self.shared.session
    }

    /// Batches waiting in the queue (not counting one being executed).
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    /// A pipeline is currently registered with the gate.
    pub fn is_busy(&self) -> bool {
        !self.shared.gate.is_ready()
    }

    /// The calling thread is the worker or is running a pipeline; blocking
    /// here on engine work would never return.
    fn on_lane(&self) -> bool {
        std::thread::current().id() == self.worker_thread || pipeline::on_pipeline_thread()
    }

    fn check_accepting(&self) -> Result<(), EngineError> {
        if self.shut_down.load(Ordering::SeqCst) || self.shared.signals.is_exiting() {
            return Err(EngineError::ShutDown);
        }
        if self.shared.signals.is_aborted() {
            return Err(EngineError::Aborted);
        }
        Ok(())
    }

    /// Queue a batch for FIFO execution. Its callback receives the result on
    /// the worker thread.
    pub fn submit(&self, batch: CommandBatch) -> Result<BatchId, EngineError> {
        self.check_accepting()?;
        let batch_id = batch.id().clone();
        if let Err(closed) = self.shared.queue.enqueue(batch) {
            debug!(batch_id = %closed.0.id(), "queue closed; batch rejected");
            return Err(match self.shared.signals.is_aborted() {
                true => EngineError::Aborted,
                false => EngineError::ShutDown,
            });
        }
        debug!(%batch_id, pending = self.pending(), "batch queued");
        Ok(batch_id)
    }

    /// Run a batch and block until it finishes.
    ///
    /// Routing follows [`EngineConfig::sync_routing`]. Blocks the calling
    /// thread, so it must not be called from an async context; use
    /// [`Engine::execute`] there.
    pub fn submit_sync(&self, batch: CommandBatch) -> Result<PipelineExecutionResult, EngineError> {
        if self.on_lane() {
            return Err(EngineError::Reentrant);
        }
        self.check_accepting()?;

        match self.shared.config.sync_routing {
            SyncRouting::Queued => {
                let (tx, rx) = oneshot::channel();
                let batch = batch.chain_completion(move |result| {
                    let _ = tx.send(result);
                });
                self.submit(batch)?;
                rx.blocking_recv().map_err(|_| EngineError::Abandoned)
            }
            SyncRouting::Direct => {
                let (parts, callback) = batch.into_parts();
                let batch_id = parts.id.clone();
                debug!(%batch_id, "running batch through the gate");
                let result = match self.shared.build(parts) {
                    Ok(pipeline) => self.shared.gate.execute_sync(pipeline)?,
                    Err(failure) => {
                        warn!(%batch_id, %failure, "failed to build pipeline");
                        PipelineExecutionResult::not_started(failure)
                    }
                };
                deliver(&batch_id, callback, result.clone());
                Ok(result)
            }
        }
    }

    /// Queue a batch and wait for its result without blocking the runtime.
    pub async fn execute(
        &self,
        batch: CommandBatch,
    ) -> Result<PipelineExecutionResult, EngineError> {
        let (tx, rx) = oneshot::channel();
        let batch = batch.chain_completion(move |result| {
            let _ = tx.send(result);
        });
        self.submit(batch)?;
        rx.await.map_err(|_| EngineError::Abandoned)
    }

    /// Request a stop of whatever pipeline is running. Returns false when
    /// nothing is.
    pub fn stop(&self) -> bool {
        self.shared.gate.stop()
    }

    /// Wait until the queue has drained, or the engine exits or aborts.
    pub async fn wait_idle(&self) -> Drain {
        self.shared.signals.wait_drained().await
    }

    /// Permanently stop accepting and executing queued work.
    ///
    /// A running pipeline finishes. Queued batches are disposed of right
    /// away according to [`EngineConfig::shutdown`].
    pub fn abort(&self) {
        warn!(pending = self.pending(), "engine aborted");
        self.shared.signals.signal_abort();
        self.shared.dispose_queued();
    }

    /// Stop the worker loop, join it and dispose of queued batches.
    ///
    /// Idempotent. The in-flight pipeline runs to completion. Called from
    /// the worker or a running pipeline, the worker is signalled but not
    /// joined.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(pending = self.pending(), "shutting down engine");
        self.shared.signals.signal_exit();

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if self.on_lane() {
                debug!("shutdown requested from the execution lane; not joining worker");
            } else if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }

        self.shared.dispose_queued();
    }
}

impl<S: InterpreterSession> Drop for Engine<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "engine_tests/mod.rs"]
mod tests;
