// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FIFO of batches waiting for the worker loop.

use crate::signals::SyncSet;
use parking_lot::Mutex;
use porch_core::CommandBatch;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

/// The queue was closed by shutdown or abort. Carries the rejected batch.
#[derive(Error)]
#[error("execution queue is closed")]
pub struct QueueClosed(pub CommandBatch);

impl std::fmt::Debug for QueueClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("QueueClosed").field(self.0.id()).finish()
    }
}

#[derive(Default)]
struct Items {
    batches: VecDeque<CommandBatch>,
    closed: bool,
}

/// Thread-safe FIFO of [`CommandBatch`]es.
///
/// `empty_queue` is only ever changed while the queue lock is held, so it
/// always agrees with the queue contents as seen by the worker. Once
/// closed, the queue stays empty.
pub struct ExecutionQueue {
    items: Mutex<Items>,
    signals: Arc<SyncSet>,
}

impl ExecutionQueue {
    pub fn new(signals: Arc<SyncSet>) -> Self {
        Self { items: Mutex::new(Items::default()), signals }
    }

    /// Append to the tail and pulse `new_item`. Fails once the queue is
    /// closed.
    pub fn enqueue(&self, batch: CommandBatch) -> Result<(), QueueClosed> {
        {
            let mut items = self.items.lock();
            if items.closed {
                return Err(QueueClosed(batch));
            }
            items.batches.push_back(batch);
            self.signals.reset_empty();
        }
        self.signals.pulse_new_item();
        Ok(())
    }

    /// Remove the head. Marks the queue empty when there is nothing left.
    pub fn dequeue(&self) -> Option<CommandBatch> {
        let mut items = self.items.lock();
        let batch = items.batches.pop_front();
        if batch.is_none() {
            self.signals.set_empty();
        }
        batch
    }

    /// Close the queue and return everything still in it, in order.
    ///
    /// Closing twice is fine; the second call returns nothing.
    pub fn close(&self) -> Vec<CommandBatch> {
        let mut items = self.items.lock();
        items.closed = true;
        let drained = items.batches.drain(..).collect();
        self.signals.set_empty();
        drained
    }

    pub fn is_closed(&self) -> bool {
        self.items.lock().closed
    }

    pub fn len(&self) -> usize {
        self.items.lock().batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().batches.is_empty()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
