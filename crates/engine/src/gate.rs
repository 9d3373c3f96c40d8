// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutual exclusion around the interpreter session.
//!
//! Every pipeline, whether dequeued by the worker loop or run synchronously
//! by a caller, passes through the [`InvocationGate`]. At most one pipeline
//! is registered as current at any time; the gate is "ready" exactly when
//! none is.

use crate::config::OverlapPolicy;
use crate::pipeline::{self, Pipeline};
use crate::session::SessionPipeline;
use crate::signals::SyncSet;
use parking_lot::{Condvar, Mutex, MutexGuard};
use porch_core::{PipelineExecutionResult, PipelineFailure, PipelineId};
use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("another pipeline is running")]
    Busy,

    #[error("synchronous invocation from inside a running pipeline would deadlock")]
    Reentrant,

    #[error("pipeline completion was never delivered")]
    Abandoned,
}

struct Current {
    id: PipelineId,
    stop: CancellationToken,
}

#[derive(Default)]
struct GateState {
    current: Option<Current>,
}

/// Releases a registered pipeline when dropped, including during unwinding.
struct Release<G: Deref<Target = InvocationGate>> {
    gate: G,
    id: PipelineId,
}

impl<G: Deref<Target = InvocationGate>> Drop for Release<G> {
    fn drop(&mut self) {
        self.gate.release(&self.id);
    }
}

/// Completion of a synchronous pipeline. Fields drop in declaration order,
/// so the gate is free before the waiter hears anything, even when the
/// pipeline thread unwinds.
struct Completion {
    release: Release<Arc<InvocationGate>>,
    tx: oneshot::Sender<PipelineExecutionResult>,
}

impl Completion {
    fn send(self, result: PipelineExecutionResult) {
        let Completion { release, tx } = self;
        drop(release);
        let _ = tx.send(result);
    }
}

pub struct InvocationGate {
    state: Mutex<GateState>,
    ready: Condvar,
    policy: OverlapPolicy,
    signals: Arc<SyncSet>,
}

impl InvocationGate {
    pub fn new(policy: OverlapPolicy, signals: Arc<SyncSet>) -> Self {
        Self { state: Mutex::new(GateState::default()), ready: Condvar::new(), policy, signals }
    }

    /// No pipeline is registered.
    pub fn is_ready(&self) -> bool {
        self.state.lock().current.is_none()
    }

    pub fn current(&self) -> Option<PipelineId> {
        self.state.lock().current.as_ref().map(|c| c.id.clone())
    }

    /// Block until the gate is ready and return the held lock.
    fn acquire(&self, policy: OverlapPolicy) -> Result<MutexGuard<'_, GateState>, GateError> {
        if pipeline::on_pipeline_thread() {
            return Err(GateError::Reentrant);
        }
        let mut state = self.state.lock();
        while state.current.is_some() {
            if policy == OverlapPolicy::Reject {
                return Err(GateError::Busy);
            }
            self.ready.wait(&mut state);
        }
        Ok(state)
    }

    fn register<P: SessionPipeline>(state: &mut GateState, pipeline: &Pipeline<P>) {
        state.current = Some(Current { id: pipeline.id().clone(), stop: pipeline.stop_token() });
    }

    /// Clear `id` as current and wake waiters. Returns false when `id` is no
    /// longer current, so a completion is only ever applied once.
    pub(crate) fn release(&self, id: &PipelineId) -> bool {
        {
            let mut state = self.state.lock();
            match &state.current {
                Some(current) if current.id == *id => state.current = None,
                _ => return false,
            }
        }
        self.ready.notify_all();
        self.signals.pulse_pipeline_finished();
        true
    }

    /// Run `pipeline` on the calling thread once the gate is free.
    ///
    /// Used by the worker loop, which always waits regardless of the overlap
    /// policy.
    pub fn run<P: SessionPipeline>(
        &self,
        pipeline: Pipeline<P>,
    ) -> Result<PipelineExecutionResult, GateError> {
        let id = pipeline.id().clone();
        {
            let mut state = self.acquire(OverlapPolicy::Wait)?;
            Self::register(&mut state, &pipeline);
        }
        let _release = Release { gate: self, id };
        Ok(pipeline.invoke())
    }

    /// Run `pipeline` on its own thread and block the caller until it
    /// finishes.
    ///
    /// Must not be called from inside a running pipeline or from an async
    /// context.
    pub fn execute_sync<P: SessionPipeline>(
        self: &Arc<Self>,
        pipeline: Pipeline<P>,
    ) -> Result<PipelineExecutionResult, GateError> {
        let id = pipeline.id().clone();
        {
            let mut state = self.acquire(self.policy)?;
            Self::register(&mut state, &pipeline);
        }

        let (tx, rx) = oneshot::channel();
        let release = Release { gate: Arc::clone(self), id: id.clone() };
        let done = Completion { release, tx };
        let spawned = pipeline.invoke_async(move |result| done.send(result));

        if let Err(e) = spawned {
            tracing::error!(pipeline_id = %id, error = %e, "failed to start pipeline thread");
            self.release(&id);
            return Ok(PipelineExecutionResult::not_started(PipelineFailure::Start {
                message: e.to_string(),
            })
            .with_pipeline_id(id));
        }

        rx.blocking_recv().map_err(|_| GateError::Abandoned)
    }

    /// Request a stop of the current pipeline. Returns false when idle.
    pub fn stop(&self) -> bool {
        let state = self.state.lock();
        match &state.current {
            Some(current) => {
                tracing::info!(pipeline_id = %current.id, "stop requested");
                current.stop.cancel();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
