// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline state machine.
//!
//! ```text
//! NotStarted ──► Running ──┬──► Completed
//!                          ├──► Failed
//!                          └──► Stopped
//! ```
//!
//! Terminal states are final.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    NotStarted,
    Running,
    Completed,
    Failed,
    Stopped,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        self.terminal().is_some()
    }

    /// Narrow to a terminal state, if this is one.
    pub fn terminal(self) -> Option<TerminalState> {
        match self {
            PipelineState::Completed => Some(TerminalState::Completed),
            PipelineState::Failed => Some(TerminalState::Failed),
            PipelineState::Stopped => Some(TerminalState::Stopped),
            PipelineState::NotStarted | PipelineState::Running => None,
        }
    }

    /// Whether `next` is a legal transition from this state.
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        match self {
            PipelineState::NotStarted => next == PipelineState::Running,
            PipelineState::Running => next.is_terminal(),
            PipelineState::Completed | PipelineState::Failed | PipelineState::Stopped => false,
        }
    }
}

crate::simple_display! {
    PipelineState {
        NotStarted => "not-started",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Stopped => "stopped",
    }
}

/// The state a pipeline ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Completed,
    Failed,
    Stopped,
}

impl From<TerminalState> for PipelineState {
    fn from(state: TerminalState) -> Self {
        match state {
            TerminalState::Completed => PipelineState::Completed,
            TerminalState::Failed => PipelineState::Failed,
            TerminalState::Stopped => PipelineState::Stopped,
        }
    }
}

crate::simple_display! {
    TerminalState {
        Completed => "completed",
        Failed => "failed",
        Stopped => "stopped",
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
