// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn direct() -> EngineConfig {
    EngineConfig::default().sync_routing(SyncRouting::Direct)
}

#[test]
fn submit_sync_returns_the_result() {
    let engine = engine();

    let result = engine.submit_sync(CommandBatch::interactive("echo hi")).unwrap();

    assert_eq!(result.output(), &[json!("hi")]);
    assert!(result.is_success());
}

#[test]
fn queued_submit_sync_waits_behind_queued_batches() {
    let engine = engine();
    let order = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::clone(&order);
    engine
        .submit(CommandBatch::script("sleep 50").on_complete(move |_| first.lock().push("queued")))
        .unwrap();

    engine.submit_sync(CommandBatch::script("echo 1")).unwrap();
    order.lock().push("sync");

    assert_eq!(*order.lock(), vec!["queued", "sync"]);
}

#[test]
fn queued_submit_sync_still_fires_the_batch_callback() {
    let engine = engine();
    let (batch, rx) = collecting(CommandBatch::script("echo 3"));

    let result = engine.submit_sync(batch).unwrap();

    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), result);
}

#[test]
fn direct_submit_sync_runs_through_the_gate() {
    let engine = engine_with(direct());
    let (batch, rx) = collecting(CommandBatch::script("echo 1 2"));

    let result = engine.submit_sync(batch).unwrap();

    assert_eq!(result.output(), &[json!(1), json!(2)]);
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), result);
}

#[test]
fn direct_submit_sync_survives_a_panicking_state_listener() {
    init_tracing();
    let engine = Engine::builder(BuiltinSession::new())
        .config(direct())
        .on_state_change(|_, state| {
            if state == PipelineState::Completed {
                panic!("listener failed");
            }
        })
        .build()
        .unwrap();

    let first = engine.submit_sync(CommandBatch::script("echo 1")).unwrap();
    assert_eq!(first.output(), &[json!(1)]);
    assert!(!engine.is_busy());

    let (tx, rx) = mpsc::channel();
    std::thread::scope(|scope| {
        scope.spawn(|| {
            let _ = tx.send(engine.submit_sync(CommandBatch::script("echo 2")));
        });
        let second = rx.recv_timeout(TIMEOUT).unwrap().unwrap();
        assert_eq!(second.output(), &[json!(2)]);
    });
}

#[test]
fn direct_submit_sync_reports_build_failures() {
    let engine = engine_with(direct());

    let result = engine.submit_sync(CommandBatch::script("frobnicate")).unwrap();

    assert!(matches!(result.failure(), Some(PipelineFailure::Build { .. })));
}

#[test]
fn direct_reject_policy_fails_while_busy() {
    let engine = engine_with(direct().overlap(OverlapPolicy::Reject));
    let running = submit_collect(&engine, CommandBatch::script("sleep 10000"));
    wait_until(|| engine.is_busy());

    let err = engine.submit_sync(CommandBatch::script("echo 1")).unwrap_err();
    assert!(matches!(err, EngineError::Gate(GateError::Busy)));

    engine.stop();
    running.recv_timeout(TIMEOUT).unwrap();
}

#[test]
fn submit_sync_from_a_callback_is_rejected() {
    let engine = Arc::new(engine());
    let (tx, rx) = mpsc::channel();
    let handle = Arc::clone(&engine);
    engine
        .submit(CommandBatch::script("echo 1").on_complete(move |_| {
            let nested = handle.submit_sync(CommandBatch::script("echo 2"));
            let _ = tx.send(matches!(nested, Err(EngineError::Reentrant)));
        }))
        .unwrap();

    assert!(rx.recv_timeout(TIMEOUT).unwrap());
}

/// Queued and direct submissions from many threads never overlap.
#[yare::parameterized(
    queued = { SyncRouting::Queued },
    direct = { SyncRouting::Direct },
)]
fn pipelines_never_overlap(routing: SyncRouting) {
    init_tracing();
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (a, p) = (Arc::clone(&active), Arc::clone(&peak));
    let engine = Arc::new(
        Engine::builder(BuiltinSession::new())
            .config(EngineConfig::default().sync_routing(routing))
            .on_state_change(move |_, state| {
                if state == PipelineState::Running {
                    let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                    p.fetch_max(now, Ordering::SeqCst);
                } else if state.is_terminal() {
                    a.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .build()
            .unwrap(),
    );

    let (done_tx, done_rx) = mpsc::channel();
    for i in 0..8 {
        let done_tx = done_tx.clone();
        engine
            .submit(CommandBatch::script(format!("sleep 2; echo {}", i)).on_complete(move |_| {
                let _ = done_tx.send(());
            }))
            .unwrap();
    }
    let callers: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                engine.submit_sync(CommandBatch::script(format!("sleep 2; echo {}", i))).unwrap()
            })
        })
        .collect();

    for caller in callers {
        assert!(caller.join().unwrap().is_success());
    }
    for _ in 0..8 {
        done_rx.recv_timeout(TIMEOUT).unwrap();
    }

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(engine.session().peak_concurrency(), 1);
    assert_eq!(engine.session().invocations(), 12);
}
