// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Arc;
use std::time::Duration;

const SHORT: Duration = Duration::from_millis(50);

#[tokio::test]
async fn pulse_before_wait_is_remembered_once() {
    let signals = SyncSet::new();
    signals.pulse_new_item();
    signals.pulse_new_item();

    assert_eq!(signals.wait_wake().await, Wake::NewItem);

    // Auto-reset: the second pulse did not stack a second permit.
    let second = tokio::time::timeout(SHORT, signals.wait_wake()).await;
    assert!(second.is_err());
}

#[tokio::test]
async fn exit_is_permanent() {
    let signals = SyncSet::new();
    signals.signal_exit();

    assert_eq!(signals.wait_wake().await, Wake::Exit);
    assert_eq!(signals.wait_wake().await, Wake::Exit);
    assert!(signals.is_exiting());
    assert!(signals.is_halted());
}

#[tokio::test]
async fn exit_wins_over_pending_item() {
    let signals = SyncSet::new();
    signals.pulse_new_item();
    signals.signal_exit();

    assert_eq!(signals.wait_wake().await, Wake::Exit);
}

#[tokio::test]
async fn abort_wakes_both_groups() {
    let signals = SyncSet::new();
    signals.reset_empty();
    signals.signal_abort();

    assert_eq!(signals.wait_wake().await, Wake::Abort);
    assert_eq!(signals.wait_drained().await, Drain::Abort);
    assert!(signals.is_aborted());
    assert!(!signals.is_exiting());
}

#[tokio::test]
async fn drained_returns_immediately_when_empty() {
    let signals = SyncSet::new();
    assert!(signals.is_empty());
    assert_eq!(signals.wait_drained().await, Drain::Empty);
}

#[tokio::test]
async fn drained_waits_for_set_empty() {
    let signals = Arc::new(SyncSet::new());
    signals.reset_empty();

    let waiter = {
        let signals = Arc::clone(&signals);
        tokio::spawn(async move { signals.wait_drained().await })
    };

    tokio::time::sleep(SHORT).await;
    assert!(!waiter.is_finished());

    signals.set_empty();
    assert_eq!(waiter.await.unwrap(), Drain::Empty);
}

#[tokio::test]
async fn blocked_waiter_wakes_on_new_item() {
    let signals = Arc::new(SyncSet::new());
    let waiter = {
        let signals = Arc::clone(&signals);
        tokio::spawn(async move { signals.wait_wake().await })
    };

    tokio::time::sleep(SHORT).await;
    signals.pulse_new_item();
    assert_eq!(waiter.await.unwrap(), Wake::NewItem);
}

#[tokio::test]
async fn pipeline_finished_pulse() {
    let signals = SyncSet::new();
    signals.pulse_pipeline_finished();
    tokio::time::timeout(SHORT, signals.pipeline_finished()).await.unwrap();
}
