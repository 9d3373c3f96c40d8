// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn interactive_echo_completes_with_output() {
    let engine = engine();
    let rx = submit_collect(&engine, CommandBatch::interactive("echo 1"));

    let result = rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(result.state(), TerminalState::Completed);
    assert_eq!(result.output(), &[json!(1)]);
    assert!(result.errors().is_empty());
    assert!(result.failure().is_none());
    assert!(result.pipeline_id().is_some());
}

#[test]
fn terminating_error_fails_the_batch() {
    let engine = engine();
    let rx = submit_collect(&engine, CommandBatch::interactive("throw-error"));

    let result = rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(result.state(), TerminalState::Failed);
    assert!(matches!(result.failure(), Some(PipelineFailure::Script { .. })));
}

#[test]
fn batches_run_in_submission_order() {
    let engine = engine();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, done_rx) = mpsc::channel();

    for i in 0..10 {
        let seen = Arc::clone(&seen);
        let done_tx = done_tx.clone();
        let batch = CommandBatch::script(format!("echo {}", i)).on_complete(move |result| {
            seen.lock().push(result.first_output().cloned());
            let _ = done_tx.send(());
        });
        engine.submit(batch).unwrap();
    }
    for _ in 0..10 {
        done_rx.recv_timeout(TIMEOUT).unwrap();
    }

    let expected: Vec<_> = (0..10).map(|i| Some(json!(i))).collect();
    assert_eq!(*seen.lock(), expected);
}

#[test]
fn every_callback_fires_exactly_once() {
    let engine = engine();
    let calls = Arc::new(AtomicUsize::new(0));
    let (done_tx, done_rx) = mpsc::channel();

    for i in 0..20 {
        let calls = Arc::clone(&calls);
        let done_tx = done_tx.clone();
        let script = if i % 3 == 0 { "throw-error".to_string() } else { format!("echo {}", i) };
        let batch = CommandBatch::script(script).on_complete(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            let _ = done_tx.send(());
        });
        engine.submit(batch).unwrap();
    }
    for _ in 0..20 {
        done_rx.recv_timeout(TIMEOUT).unwrap();
    }
    engine.shutdown();

    assert_eq!(calls.load(Ordering::SeqCst), 20);
}

#[test]
fn build_failure_is_reported_through_callback() {
    let engine = engine();
    let rx = submit_collect(&engine, CommandBatch::script("frobnicate"));

    let result = rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(result.state(), TerminalState::Failed);
    assert!(matches!(result.failure(), Some(PipelineFailure::Build { .. })));
    assert!(result.pipeline_id().is_none());

    // The worker carries on with the next batch.
    let rx = submit_collect(&engine, CommandBatch::script("echo ok"));
    assert!(rx.recv_timeout(TIMEOUT).unwrap().is_success());
}

#[test]
fn closed_session_makes_batches_unavailable() {
    let engine = engine();
    engine.session().close().unwrap();

    let rx = submit_collect(&engine, CommandBatch::script("echo 1"));

    let result = rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(
        result.failure(),
        Some(&PipelineFailure::SessionUnavailable { state: SessionState::Closed.to_string() })
    );
}

#[test]
fn panicking_callback_does_not_stop_the_worker() {
    let engine = engine();
    engine
        .submit(CommandBatch::script("echo 1").on_complete(|_| panic!("callback bug")))
        .unwrap();

    let rx = submit_collect(&engine, CommandBatch::script("echo 2"));
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().output(), &[json!(2)]);
}

#[test]
fn batch_input_feeds_the_first_command() {
    let engine = engine();
    let batch = CommandBatch::builder()
        .command(porch_core::CommandSpec::command("count"))
        .input(vec![json!("a"), json!("b")])
        .build()
        .unwrap();
    let rx = submit_collect(&engine, batch);

    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().output(), &[json!(2)]);
}

#[test]
fn state_listener_sees_running_then_terminal() {
    init_tracing();
    let states = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&states);
    let engine = Engine::builder(BuiltinSession::new())
        .on_state_change(move |_, state| sink.lock().push(state))
        .build()
        .unwrap();

    let rx = submit_collect(&engine, CommandBatch::script("echo 1"));
    rx.recv_timeout(TIMEOUT).unwrap();

    assert_eq!(*states.lock(), vec![PipelineState::Running, PipelineState::Completed]);
}

#[test]
fn panicking_state_listener_does_not_stop_the_worker() {
    init_tracing();
    let engine = Engine::builder(BuiltinSession::new())
        .on_state_change(|_, state| {
            if state == PipelineState::Running {
                panic!("listener failed");
            }
        })
        .build()
        .unwrap();

    let first = submit_collect(&engine, CommandBatch::script("echo 1"));
    let second = submit_collect(&engine, CommandBatch::script("echo 2"));

    let first = first.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(first.state(), TerminalState::Completed);
    assert_eq!(first.output(), &[json!(1)]);
    assert_eq!(second.recv_timeout(TIMEOUT).unwrap().output(), &[json!(2)]);
    assert!(!engine.is_busy());
}

#[test]
fn failed_session_open_aborts_engine() {
    init_tracing();
    let session = BuiltinSession::with_startup(vec!["throw-error no profile".to_string()]);
    let engine = Engine::new(session).unwrap();

    let err = engine.submit(CommandBatch::script("echo 1")).unwrap_err();
    assert!(matches!(err, EngineError::Aborted));
    assert_eq!(engine.session().state(), SessionState::Broken);
}

#[tokio::test]
async fn execute_awaits_the_result() {
    let engine = engine();

    let result = engine.execute(CommandBatch::script("echo 5")).await.unwrap();

    assert_eq!(result.output(), &[json!(5)]);
}

#[tokio::test]
async fn wait_idle_returns_once_queue_drains() {
    let engine = engine();
    let calls = Arc::new(AtomicUsize::new(0));
    for i in 0..3 {
        let calls = Arc::clone(&calls);
        let batch = CommandBatch::script(format!("sleep 5; echo {}", i)).on_complete(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        engine.submit(batch).unwrap();
    }

    let drained = tokio::time::timeout(TIMEOUT, engine.wait_idle()).await.unwrap();

    assert_eq!(drained, Drain::Empty);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(engine.pending(), 0);
}
