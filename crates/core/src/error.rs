// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure taxonomy reported through pipeline results.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a pipeline stopped abnormally.
///
/// Every failure, whether raised while building the pipeline or by the
/// interpreter at run time, is delivered through
/// [`PipelineExecutionResult::failure`](crate::PipelineExecutionResult::failure).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineFailure {
    /// The session could not construct a pipeline from the batch.
    #[error("failed to build pipeline: {message}")]
    Build { message: String },

    /// The pipeline could not be started.
    #[error("failed to start pipeline: {message}")]
    Start { message: String },

    /// The interpreter reached the Failed state.
    #[error("{message}")]
    Script { message: String },

    /// The interpreter implementation panicked while running the pipeline.
    #[error("interpreter panicked: {message}")]
    Panicked { message: String },

    /// The batch was still queued when the engine shut down.
    #[error("engine shut down before the batch started")]
    Shutdown,

    /// The interpreter session is not open.
    #[error("interpreter session is {state}")]
    SessionUnavailable { state: String },
}

impl PipelineFailure {
    pub fn script(message: impl Into<String>) -> Self {
        PipelineFailure::Script { message: message.into() }
    }

    pub fn build(message: impl Into<String>) -> Self {
        PipelineFailure::Build { message: message.into() }
    }
}

/// Errors constructing a [`CommandBatch`](crate::CommandBatch).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("a command batch needs at least one command")]
    NoCommands,
}
