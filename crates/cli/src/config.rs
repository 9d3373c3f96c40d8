// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console configuration file.
//!
//! ```toml
//! [engine]
//! sync_routing = "queued"
//! shutdown = "abandon"
//!
//! [log]
//! level = "info"
//! file = "/tmp/porch.log"
//! ```

use anyhow::{Context, Result};
use porch_engine::EngineConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "PORCH_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub engine: EngineConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Filter directive, e.g. `warn` or `porch_engine=debug`.
    pub level: String,
    /// Write logs here instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), file: None }
    }
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid config")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Load from `explicit`, else `$PORCH_CONFIG`, else the user config
    /// file if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match resolve_path(explicit) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Which config file to read, if any. Explicit and environment paths are
/// returned even when missing so that the read reports the error.
pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    default_path().filter(|path| path.is_file())
}

/// `<config_dir>/porch/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("porch").join("config.toml"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
