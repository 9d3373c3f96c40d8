// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::signals::Wake;
use porch_core::test_support::strategies::arb_echo_command;
use porch_core::BatchId;
use proptest::prelude::*;
use std::time::Duration;

fn queue() -> (ExecutionQueue, Arc<SyncSet>) {
    let signals = Arc::new(SyncSet::new());
    (ExecutionQueue::new(Arc::clone(&signals)), signals)
}

#[test]
fn dequeue_on_empty_returns_none_and_marks_empty() {
    let (queue, signals) = queue();
    signals.reset_empty();

    assert!(queue.dequeue().is_none());
    assert!(signals.is_empty());
}

#[test]
fn enqueue_clears_empty_flag() {
    let (queue, signals) = queue();
    assert!(signals.is_empty());

    queue.enqueue(CommandBatch::script("echo 1")).unwrap();

    assert!(!signals.is_empty());
    assert_eq!(queue.len(), 1);
    assert!(!queue.is_empty());
}

#[test]
fn empty_flag_stays_clear_until_dequeue_finds_nothing() {
    let (queue, signals) = queue();
    queue.enqueue(CommandBatch::script("a")).unwrap();
    queue.enqueue(CommandBatch::script("b")).unwrap();

    assert!(queue.dequeue().is_some());
    assert!(!signals.is_empty());
    assert!(queue.dequeue().is_some());
    assert!(!signals.is_empty());
    assert!(queue.dequeue().is_none());
    assert!(signals.is_empty());
}

#[tokio::test]
async fn enqueue_pulses_new_item() {
    let (queue, signals) = queue();
    queue.enqueue(CommandBatch::script("echo 1")).unwrap();

    let wake = tokio::time::timeout(Duration::from_secs(1), signals.wait_wake()).await.unwrap();
    assert_eq!(wake, Wake::NewItem);
}

#[test]
fn close_drains_in_order() {
    let (queue, signals) = queue();
    let ids: Vec<BatchId> = (0..3)
        .map(|i| {
            let batch = CommandBatch::script(format!("echo {}", i));
            let id = batch.id().clone();
            queue.enqueue(batch).unwrap();
            id
        })
        .collect();

    let drained: Vec<BatchId> = queue.close().into_iter().map(|b| b.id().clone()).collect();
    assert_eq!(drained, ids);
    assert!(queue.is_empty());
    assert!(signals.is_empty());
}

#[test]
fn closed_queue_rejects_and_returns_the_batch() {
    let (queue, signals) = queue();
    queue.enqueue(CommandBatch::script("echo 1")).unwrap();
    assert_eq!(queue.close().len(), 1);

    let batch = CommandBatch::script("echo 2");
    let id = batch.id().clone();
    let QueueClosed(rejected) = queue.enqueue(batch).unwrap_err();

    assert_eq!(rejected.id(), &id);
    assert!(queue.is_closed());
    assert!(queue.is_empty());
    assert!(signals.is_empty());
    assert!(queue.close().is_empty());
}

#[test]
fn concurrent_producers_lose_nothing() {
    let (queue, _signals) = queue();
    let queue = Arc::new(queue);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || {
                for i in 0..50 {
                    queue.enqueue(CommandBatch::script(format!("echo {}", i))).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(queue.len(), 200);
}

proptest! {
    #[test]
    fn dequeue_order_matches_enqueue_order(commands in prop::collection::vec(arb_echo_command(), 1..20)) {
        let (queue, _signals) = queue();
        let mut expected = Vec::new();
        for command in commands {
            let batch = CommandBatch::builder().command(command).build().unwrap();
            expected.push(batch.id().clone());
            queue.enqueue(batch).unwrap();
        }

        let mut seen = Vec::new();
        while let Some(batch) = queue.dequeue() {
            seen.push(batch.id().clone());
        }
        prop_assert_eq!(seen, expected);
    }
}
