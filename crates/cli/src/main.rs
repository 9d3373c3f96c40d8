// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! porch: interactive console over the porch execution engine

mod color;
mod config;
mod exit_error;
mod logging;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use exit_error::ExitError;
use porch_core::{CommandBatch, PipelineExecutionResult};
use porch_engine::{BuiltinSession, Engine};
use render::OutputFormat;
use std::future::Future;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

type ConsoleEngine = Engine<BuiltinSession>;

#[derive(Parser)]
#[command(name = "porch", version, about = "Interactive console over the porch execution engine")]
#[command(styles = color::styles())]
struct Cli {
    /// Run one command line and exit
    #[arg(short = 'c', long = "command", conflicts_with = "file")]
    command: Option<String>,

    /// Script file to run as a single batch
    file: Option<PathBuf>,

    /// Config file (default: $PORCH_CONFIG, then the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Script line to run when the session opens (repeatable)
    #[arg(long = "startup", value_name = "LINE")]
    startup: Vec<String>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        if let Some(exit) = e.downcast_ref::<ExitError>() {
            if !exit.message.is_empty() {
                eprintln!("{}", exit.message);
            }
            std::process::exit(exit.code);
        }
        let colorize = color::should_colorize_stderr();
        eprintln!("{}", color::error(&format!("error: {:#}", e), colorize));
        std::process::exit(2);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let _log_guard = logging::init(&config.log, cli.log_file.as_deref())?;

    let session = BuiltinSession::with_startup(cli.startup);
    let engine = Arc::new(
        Engine::builder(session)
            .config(config.engine)
            .build()
            .context("failed to start engine")?,
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;
    let format = cli.format;
    let outcome = runtime.block_on(async {
        match (cli.command, cli.file) {
            (Some(line), _) => run_line(&engine, line, format).await,
            (None, Some(path)) => run_file(&engine, &path, format).await,
            (None, None) => run_repl(&engine, format).await,
        }
    });

    engine.shutdown();
    outcome
}

/// Await `work`, turning Ctrl-C into a stop request for the running pipeline.
async fn interruptible<T>(engine: &ConsoleEngine, work: impl Future<Output = T>) -> T {
    tokio::pin!(work);
    loop {
        tokio::select! {
            value = &mut work => return value,
            signal = tokio::signal::ctrl_c() => {
                if signal.is_err() {
                    return work.await;
                }
                if !engine.stop() {
                    tracing::debug!("interrupt with nothing running");
                }
            }
        }
    }
}

fn print_result(result: &PipelineExecutionResult, format: OutputFormat) -> Result<()> {
    let colorize = color::should_colorize_stderr();
    let mut out = std::io::stdout().lock();
    let mut err = std::io::stderr().lock();
    render::write_result(&mut out, &mut err, result, format, colorize)?;
    out.flush()?;
    Ok(())
}

fn finish(result: &PipelineExecutionResult, format: OutputFormat) -> Result<()> {
    print_result(result, format)?;
    match ExitError::from_result(result) {
        Some(exit) => Err(exit.into()),
        None => Ok(()),
    }
}

/// `porch -c <line>`: one interactive batch through the synchronous path.
async fn run_line(engine: &Arc<ConsoleEngine>, line: String, format: OutputFormat) -> Result<()> {
    let lane = Arc::clone(engine);
    let task =
        tokio::task::spawn_blocking(move || lane.submit_sync(CommandBatch::interactive(line)));
    let result = interruptible(engine, task).await.context("command task failed")??;
    finish(&result, format)
}

/// `porch <file>`: the whole file as one script batch.
async fn run_file(engine: &ConsoleEngine, path: &Path, format: OutputFormat) -> Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    let source = match source.strip_prefix("#!") {
        Some(rest) => rest.split_once('\n').map(|(_, body)| body.to_string()).unwrap_or_default(),
        None => source,
    };

    let batch = CommandBatch::builder().script(source).append_default_output(true).build()?;
    let result = interruptible(engine, engine.execute(batch)).await?;
    finish(&result, format)
}

/// Line REPL over stdin. Failures are printed and the loop carries on.
async fn run_repl(engine: &ConsoleEngine, format: OutputFormat) -> Result<()> {
    let interactive = std::io::stdin().is_terminal();
    let colorize = color::should_colorize();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if interactive {
            print!("{}", color::prompt("porch> ", colorize));
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        let result = interruptible(engine, engine.execute(CommandBatch::interactive(line))).await?;
        print_result(&result, format)?;
    }
    Ok(())
}
