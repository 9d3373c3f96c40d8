// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn stop_when_idle_is_a_noop() {
    let engine = engine();
    assert!(!engine.stop());

    let rx = submit_collect(&engine, CommandBatch::script("echo 1"));
    assert!(rx.recv_timeout(TIMEOUT).unwrap().is_success());
}

#[test]
fn stop_halts_the_running_pipeline() {
    let engine = engine();
    let rx = submit_collect(&engine, CommandBatch::interactive("sleep 10000"));
    wait_until(|| engine.is_busy());

    assert!(engine.stop());

    let result = rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(result.state(), TerminalState::Stopped);
    assert!(result.failure().is_none());
}

#[test]
fn stop_only_affects_the_current_pipeline() {
    let engine = engine();
    let first = submit_collect(&engine, CommandBatch::script("sleep 10000"));
    let second = submit_collect(&engine, CommandBatch::script("echo after"));
    wait_until(|| engine.is_busy());

    engine.stop();

    assert_eq!(first.recv_timeout(TIMEOUT).unwrap().state(), TerminalState::Stopped);
    let next = second.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(next.state(), TerminalState::Completed);
    assert_eq!(next.output(), &[json!("after")]);
}

#[test]
fn abort_rejects_new_work() {
    let engine = engine();
    engine.abort();

    assert!(matches!(engine.submit(CommandBatch::script("echo 1")), Err(EngineError::Aborted)));
}

/// Runs `submit_sync` on a helper thread and hands its outcome back.
fn submit_sync_in_background(
    engine: &Arc<Engine<BuiltinSession>>,
    script: &str,
) -> mpsc::Receiver<Result<PipelineExecutionResult, EngineError>> {
    let (tx, rx) = mpsc::channel();
    let engine = Arc::clone(engine);
    let batch = CommandBatch::script(script);
    std::thread::spawn(move || {
        let _ = tx.send(engine.submit_sync(batch));
    });
    rx
}

#[test]
fn abort_releases_waiting_sync_callers() {
    let engine = Arc::new(engine());
    let running = submit_collect(&engine, CommandBatch::script("sleep 300; echo 1"));
    wait_until(|| engine.is_busy());
    let waiter = submit_sync_in_background(&engine, "echo 2");
    wait_until(|| engine.pending() == 1);

    engine.abort();

    assert!(matches!(waiter.recv_timeout(TIMEOUT).unwrap(), Err(EngineError::Abandoned)));
    assert_eq!(engine.pending(), 0);
    // The in-flight pipeline still finishes.
    assert_eq!(running.recv_timeout(TIMEOUT).unwrap().output(), &[json!(1)]);
}

#[test]
fn abort_with_cancel_policy_delivers_cancelled_results() {
    let engine = engine_with(EngineConfig::default().shutdown(ShutdownPolicy::Cancel));
    let running = submit_collect(&engine, CommandBatch::script("sleep 300"));
    wait_until(|| engine.is_busy());
    let queued = submit_collect(&engine, CommandBatch::script("echo 2"));

    engine.abort();

    let cancelled = queued.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(cancelled.state(), TerminalState::Stopped);
    assert_eq!(cancelled.failure(), Some(&PipelineFailure::Shutdown));
    assert!(running.recv_timeout(TIMEOUT).unwrap().is_success());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn abort_wakes_execute_callers() {
    let engine = Arc::new(engine());
    engine.submit(CommandBatch::script("sleep 300")).unwrap();
    wait_until(|| engine.is_busy());

    let pending = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.execute(CommandBatch::script("echo 2")).await })
    };
    wait_until(|| engine.pending() == 1);
    engine.abort();

    let outcome = tokio::time::timeout(TIMEOUT, pending).await.unwrap().unwrap();
    assert!(matches!(outcome, Err(EngineError::Abandoned)));
}

#[test]
fn submit_racing_a_closed_queue_is_rejected() {
    let engine = engine();
    // Shutdown has drained and closed the queue, but this caller already
    // passed the accepting check.
    engine.shared.queue.close();

    let (batch, rx) = collecting(CommandBatch::script("echo 1"));
    assert!(matches!(engine.submit(batch), Err(EngineError::ShutDown)));
    assert!(matches!(
        engine.submit_sync(CommandBatch::script("echo 2")),
        Err(EngineError::ShutDown)
    ));
    // The rejected batch was dropped, so its callback can never fire.
    assert_eq!(rx.try_recv(), Err(mpsc::TryRecvError::Disconnected));
}
