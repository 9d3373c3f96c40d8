// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::strategies::*;
use proptest::prelude::*;

#[yare::parameterized(
    not_started = { PipelineState::NotStarted, false },
    running     = { PipelineState::Running,    false },
    completed   = { PipelineState::Completed,  true },
    failed      = { PipelineState::Failed,     true },
    stopped     = { PipelineState::Stopped,    true },
)]
fn terminal_iff_final_variant(state: PipelineState, expected: bool) {
    assert_eq!(state.is_terminal(), expected);
}

#[yare::parameterized(
    start            = { PipelineState::NotStarted, PipelineState::Running,   true },
    skip_running     = { PipelineState::NotStarted, PipelineState::Completed, false },
    complete         = { PipelineState::Running,    PipelineState::Completed, true },
    fail             = { PipelineState::Running,    PipelineState::Failed,    true },
    stop             = { PipelineState::Running,    PipelineState::Stopped,   true },
    restart          = { PipelineState::Running,    PipelineState::Running,   false },
    back_to_start    = { PipelineState::Running,    PipelineState::NotStarted, false },
    completed_again  = { PipelineState::Completed,  PipelineState::Running,   false },
    failed_to_stop   = { PipelineState::Failed,     PipelineState::Stopped,   false },
    stopped_complete = { PipelineState::Stopped,    PipelineState::Completed, false },
)]
fn transition_table(from: PipelineState, to: PipelineState, allowed: bool) {
    assert_eq!(from.can_transition_to(to), allowed);
}

#[yare::parameterized(
    not_started = { PipelineState::NotStarted, "not-started" },
    running     = { PipelineState::Running,    "running" },
    completed   = { PipelineState::Completed,  "completed" },
    failed      = { PipelineState::Failed,     "failed" },
    stopped     = { PipelineState::Stopped,    "stopped" },
)]
fn display_names(state: PipelineState, expected: &str) {
    assert_eq!(state.to_string(), expected);
}

#[test]
fn terminal_state_serializes_snake_case() {
    let json = serde_json::to_string(&TerminalState::Stopped).unwrap();
    assert_eq!(json, "\"stopped\"");
}

proptest! {
    #[test]
    fn terminal_states_have_no_exit(from in arb_pipeline_state(), to in arb_pipeline_state()) {
        if from.is_terminal() {
            prop_assert!(!from.can_transition_to(to));
        }
    }

    #[test]
    fn narrowing_round_trips(state in arb_pipeline_state()) {
        if let Some(terminal) = state.terminal() {
            prop_assert_eq!(PipelineState::from(terminal), state);
        }
    }
}
