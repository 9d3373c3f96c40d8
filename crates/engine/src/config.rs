// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default name of the worker loop thread.
pub const DEFAULT_THREAD_NAME: &str = "porch-worker";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How [`Engine::submit_sync`](crate::Engine::submit_sync) reaches the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRouting {
    /// Enqueue behind queued batches and block until this batch completes.
    /// All submissions share one FIFO order.
    #[default]
    Queued,
    /// Run through the invocation gate directly. Excluded in time from queued
    /// batches but not ordered relative to them.
    Direct,
}

/// What the gate does with a call that arrives while a pipeline is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Block until the active pipeline finishes.
    #[default]
    Wait,
    /// Fail immediately with `GateError::Busy`.
    Reject,
}

/// What happens to batches still queued at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownPolicy {
    /// Drop them without invoking their callbacks.
    #[default]
    Abandon,
    /// Deliver a Stopped result carrying `PipelineFailure::Shutdown`.
    Cancel,
}

/// Engine settings, usually the `[engine]` table of the console config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub thread_name: String,
    pub sync_routing: SyncRouting,
    pub overlap: OverlapPolicy,
    pub shutdown: ShutdownPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            sync_routing: SyncRouting::default(),
            overlap: OverlapPolicy::default(),
            shutdown: ShutdownPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        Self::from_toml(&text)
    }

    pub fn sync_routing(mut self, routing: SyncRouting) -> Self {
        self.sync_routing = routing;
        self
    }

    pub fn overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn shutdown(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown = policy;
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
