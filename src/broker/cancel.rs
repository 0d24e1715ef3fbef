// ABOUTME: A lightweight cancellation token backed by tokio::sync::watch
// ABOUTME: Used instead of tokio-util's CancellationToken to keep the core broker dependency-light
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

use tokio::sync::watch;

/// The subscriber side of a cancellation signal. Cloneable; every clone
/// observes the same cancellation.
#[derive(Debug, Clone)]
pub struct CancelToken(watch::Receiver<bool>);

impl CancelToken {
    /// A token that is never cancelled (its handle was dropped, or never
    /// existed). Useful when a caller has no cancellation source of its
    /// own but must still supply a token to [`crate::broker::Broker::subscribe`].
    #[must_use]
    pub fn pending() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self(rx)
    }

    /// True if cancellation has already been signaled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancellation is signaled. Never resolves if the
    /// owning [`CancelHandle`] is dropped without cancelling — callers
    /// should race this against their own exit conditions.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.0.borrow() {
                return;
            }
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// The publisher side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    /// A fresh handle/token pair, initially uncancelled.
    #[must_use]
    pub fn new() -> (Self, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (Self(tx), CancelToken(rx))
    }

    /// Signal cancellation to every clone of the paired token.
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}
