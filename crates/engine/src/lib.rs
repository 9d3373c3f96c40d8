// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! porch-engine: asynchronous command execution over a single interpreter session

pub mod config;
mod engine;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod queue;
pub mod session;
pub mod signals;
mod worker;

pub use config::{ConfigError, EngineConfig, OverlapPolicy, ShutdownPolicy, SyncRouting};
pub use engine::{Engine, EngineBuilder};
pub use error::EngineError;
pub use gate::{GateError, InvocationGate};
pub use pipeline::{Pipeline, StateListener};
pub use queue::{ExecutionQueue, QueueClosed};
pub use session::{
    BuiltinSession, InterpreterSession, InvocationContext, PipelineSpec, ScriptError,
    SessionError, SessionPipeline, SessionState,
};
pub use signals::{Drain, SyncSet, Wake};
