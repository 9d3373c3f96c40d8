// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronization set coordinating producers, the worker loop and shutdown.
//!
//! | Signal              | Reset  | Primitive           |
//! |---------------------|--------|---------------------|
//! | `exit_thread`       | manual | `CancellationToken` |
//! | `abort_queue`       | manual | `CancellationToken` |
//! | `new_item`          | auto   | `Notify`            |
//! | `empty_queue`       | manual | `watch<bool>`       |
//! | `pipeline_finished` | auto   | `Notify`            |
//!
//! `Notify` holds at most one permit, so a pulse with no waiter is consumed
//! by exactly one later wait.

use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;

/// Why the worker loop woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Exit,
    Abort,
    NewItem,
}

/// Why a drain waiter returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    Exit,
    Abort,
    Empty,
}

pub struct SyncSet {
    exit_thread: CancellationToken,
    abort_queue: CancellationToken,
    new_item: Notify,
    empty_queue: watch::Sender<bool>,
    pipeline_finished: Notify,
}

impl Default for SyncSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncSet {
    /// A fresh set. The queue starts out empty, so `empty_queue` starts set.
    pub fn new() -> Self {
        let (empty_queue, _) = watch::channel(true);
        Self {
            exit_thread: CancellationToken::new(),
            abort_queue: CancellationToken::new(),
            new_item: Notify::new(),
            empty_queue,
            pipeline_finished: Notify::new(),
        }
    }

    pub fn signal_exit(&self) {
        self.exit_thread.cancel();
    }

    pub fn signal_abort(&self) {
        self.abort_queue.cancel();
    }

    pub fn is_exiting(&self) -> bool {
        self.exit_thread.is_cancelled()
    }

    pub fn is_aborted(&self) -> bool {
        self.abort_queue.is_cancelled()
    }

    /// Exit or abort has been signalled.
    pub fn is_halted(&self) -> bool {
        self.is_exiting() || self.is_aborted()
    }

    pub fn pulse_new_item(&self) {
        self.new_item.notify_one();
    }

    pub fn set_empty(&self) {
        self.empty_queue.send_replace(true);
    }

    pub fn reset_empty(&self) {
        self.empty_queue.send_replace(false);
    }

    pub fn is_empty(&self) -> bool {
        *self.empty_queue.borrow()
    }

    pub fn pulse_pipeline_finished(&self) {
        self.pipeline_finished.notify_one();
    }

    /// Wait on `{exit_thread, abort_queue, new_item}`.
    ///
    /// Exit and abort win over a pending new item.
    pub async fn wait_wake(&self) -> Wake {
        tokio::select! {
            biased;
            _ = self.exit_thread.cancelled() => Wake::Exit,
            _ = self.abort_queue.cancelled() => Wake::Abort,
            _ = self.new_item.notified() => Wake::NewItem,
        }
    }

    /// Wait on `{exit_thread, abort_queue, empty_queue}`.
    pub async fn wait_drained(&self) -> Drain {
        let mut empty = self.empty_queue.subscribe();
        tokio::select! {
            biased;
            _ = self.exit_thread.cancelled() => Drain::Exit,
            _ = self.abort_queue.cancelled() => Drain::Abort,
            _ = empty.wait_for(|is_empty| *is_empty) => Drain::Empty,
        }
    }

    /// Wait for the next `pipeline_finished` pulse.
    pub async fn pipeline_finished(&self) {
        self.pipeline_finished.notified().await;
    }
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
