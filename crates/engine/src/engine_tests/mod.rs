// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::{OverlapPolicy, ShutdownPolicy};
use crate::gate::GateError;
use crate::session::{BuiltinSession, SessionState};
use crate::signals::Drain;
use porch_core::{PipelineFailure, TerminalState};
use serde_json::json;
use std::sync::atomic::AtomicUsize;
use std::sync::mpsc;
use std::time::{Duration, Instant};

mod cancel;
mod queued;
mod shutdown;
mod sync;

const TIMEOUT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn engine() -> Engine<BuiltinSession> {
    engine_with(EngineConfig::default())
}

fn engine_with(config: EngineConfig) -> Engine<BuiltinSession> {
    init_tracing();
    Engine::builder(BuiltinSession::new()).config(config).build().unwrap()
}

/// Attach a callback that forwards the result to the returned receiver.
fn collecting(batch: CommandBatch) -> (CommandBatch, mpsc::Receiver<PipelineExecutionResult>) {
    let (tx, rx) = mpsc::channel();
    let batch = batch.on_complete(move |result| {
        let _ = tx.send(result);
    });
    (batch, rx)
}

fn submit_collect(
    engine: &Engine<BuiltinSession>,
    batch: CommandBatch,
) -> mpsc::Receiver<PipelineExecutionResult> {
    let (batch, rx) = collecting(batch);
    engine.submit(batch).unwrap();
    rx
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + TIMEOUT;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(2));
    }
}
