// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup.

use crate::config::LogConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable overriding the configured filter.
pub const LOG_ENV: &str = "PORCH_LOG";

/// Filter directives: `$PORCH_LOG` if set, else the configured level.
pub fn filter_directives(config: &LogConfig) -> String {
    match std::env::var(LOG_ENV) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => config.level.clone(),
    }
}

/// Install the global subscriber. Logs go to stderr, or to `file` when set.
///
/// Keep the returned guard alive until exit so buffered file output is
/// flushed.
pub fn init(config: &LogConfig, file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(filter_directives(config))
        .with_context(|| format!("invalid log filter `{}`", config.level))?;

    match file.or(config.file.as_deref()) {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path.file_name().context("log file path has no file name")?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .try_init()
                .context("failed to install log subscriber")?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .context("failed to install log subscriber")?;
            Ok(None)
        }
    }
}
