// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::mpsc::TryRecvError;

#[test]
fn shutdown_abandons_queued_batches_by_default() {
    let engine = engine();
    let running = submit_collect(&engine, CommandBatch::script("sleep 200; echo 1"));
    let queued = submit_collect(&engine, CommandBatch::script("echo 2"));
    wait_until(|| engine.is_busy());

    engine.shutdown();

    // The in-flight pipeline ran to completion.
    let result = running.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(result.state(), TerminalState::Completed);
    assert_eq!(result.output(), &[json!(1)]);
    // The queued batch was dropped without its callback.
    assert_eq!(queued.try_recv(), Err(TryRecvError::Disconnected));
}

#[test]
fn cancel_policy_delivers_stopped_results() {
    let engine = engine_with(EngineConfig::default().shutdown(ShutdownPolicy::Cancel));
    let running = submit_collect(&engine, CommandBatch::script("sleep 200"));
    let queued = submit_collect(&engine, CommandBatch::script("echo 2"));
    wait_until(|| engine.is_busy());

    engine.shutdown();

    assert!(running.recv_timeout(TIMEOUT).unwrap().is_success());
    let cancelled = queued.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(cancelled.state(), TerminalState::Stopped);
    assert_eq!(cancelled.failure(), Some(&PipelineFailure::Shutdown));
}

#[test]
fn shutdown_is_idempotent_and_rejects_new_work() {
    let engine = engine();
    engine.shutdown();
    engine.shutdown();

    assert!(matches!(engine.submit(CommandBatch::script("echo 1")), Err(EngineError::ShutDown)));
    assert!(matches!(
        engine.submit_sync(CommandBatch::script("echo 1")),
        Err(EngineError::ShutDown)
    ));
}

#[test]
fn shutdown_closes_the_session() {
    let engine = engine();
    assert_eq!(engine.session().state(), SessionState::Opened);

    engine.shutdown();

    assert_eq!(engine.session().state(), SessionState::Closed);
}

#[test]
fn sync_waiter_is_told_when_its_batch_is_abandoned() {
    let engine = Arc::new(engine());
    let running = submit_collect(&engine, CommandBatch::script("sleep 500"));
    wait_until(|| engine.is_busy());

    let waiter = {
        let engine = Arc::clone(&engine);
        std::thread::spawn(move || engine.submit_sync(CommandBatch::script("echo 1")))
    };
    wait_until(|| engine.pending() == 1);
    engine.shutdown();

    assert!(matches!(waiter.join().unwrap(), Err(EngineError::Abandoned)));
    running.recv_timeout(TIMEOUT).unwrap();
}

#[test]
fn shutdown_from_a_callback_does_not_deadlock() {
    let engine = Arc::new(engine());
    let (tx, rx) = mpsc::channel();
    let handle = Arc::clone(&engine);
    engine
        .submit(CommandBatch::script("echo 1").on_complete(move |_| {
            handle.shutdown();
            let _ = tx.send(());
        }))
        .unwrap();

    rx.recv_timeout(TIMEOUT).unwrap();
    assert!(matches!(engine.submit(CommandBatch::script("echo 2")), Err(EngineError::ShutDown)));
}

#[tokio::test]
async fn wait_idle_returns_exit_after_shutdown() {
    let engine = engine();
    engine.submit(CommandBatch::script("sleep 200")).unwrap();
    engine.shutdown();

    assert_eq!(engine.wait_idle().await, Drain::Exit);
}
