// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types

use crate::gate::GateError;
use crate::session::SessionError;
use thiserror::Error;

/// Errors returned by the [`Engine`](crate::Engine) submission surface.
///
/// Failures of individual batches are not engine errors: they are reported
/// through the batch's result.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine is shut down")]
    ShutDown,

    #[error("engine aborted; no further batches are accepted")]
    Aborted,

    #[error("batch was abandoned before it started")]
    Abandoned,

    #[error("cannot wait on the engine from its own execution lane")]
    Reentrant,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    Gate(GateError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

impl From<GateError> for EngineError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::Reentrant => EngineError::Reentrant,
            GateError::Abandoned => EngineError::Abandoned,
            other => EngineError::Gate(other),
        }
    }
}
