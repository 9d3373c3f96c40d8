// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! porch-core: data model shared by the porch execution engine and its front ends

pub mod macros;

pub mod batch;
pub mod command;
pub mod error;
pub mod id;
pub mod result;
pub mod state;
pub mod value;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use batch::{BatchFlags, BatchParts, CommandBatch, CommandBatchBuilder, CompletionCallback};
pub use command::CommandSpec;
pub use error::{BatchError, PipelineFailure};
pub use id::{short, BatchId, PipelineId};
pub use result::PipelineExecutionResult;
pub use state::{PipelineState, TerminalState};
pub use value::{ErrorRecord, Value};
