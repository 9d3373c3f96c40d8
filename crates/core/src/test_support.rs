// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

/// Proptest strategies for core types.
pub mod strategies {
    use crate::{CommandSpec, PipelineState};
    use proptest::prelude::*;

    pub fn arb_pipeline_state() -> impl Strategy<Value = PipelineState> {
        prop_oneof![
            Just(PipelineState::NotStarted),
            Just(PipelineState::Running),
            Just(PipelineState::Completed),
            Just(PipelineState::Failed),
            Just(PipelineState::Stopped),
        ]
    }

    /// `echo` commands with short alphanumeric payloads.
    pub fn arb_echo_command() -> impl Strategy<Value = CommandSpec> {
        "[a-z][a-z0-9]{0,7}".prop_map(|word| CommandSpec::script(format!("echo {}", word)))
    }
}
