// ABOUTME: Per-event-type callback registry for the client connection
// ABOUTME: Reader-writer locked: dispatch takes the read lock, register/unregister the write lock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::codec::AssembledEvent;

type Callback = Box<dyn Fn(&AssembledEvent) + Send + Sync>;

struct Entry {
    event_type: Option<String>,
    callback: Callback,
}

/// Holds callbacks registered against a [`super::ClientConnection`],
/// keyed by event type (`None` matches every event). Safe to register
/// and unregister from any thread concurrently with dispatch; dispatch
/// itself always runs on the connection's reader task.
#[derive(Default)]
pub struct CallbackRegistry {
    entries: RwLock<HashMap<u64, Entry>>,
    next_id: AtomicU64,
}

impl CallbackRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `callback` for `event_type` (`None` for every event).
    /// Returns a token that unregisters it when [`RemovalToken::remove`]
    /// is called.
    pub async fn register(
        self: &Arc<Self>,
        event_type: Option<String>,
        callback: impl Fn(&AssembledEvent) + Send + Sync + 'static,
    ) -> RemovalToken {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.write().await.insert(
            id,
            Entry {
                event_type,
                callback: Box::new(callback),
            },
        );
        RemovalToken {
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Invoke every callback whose event type matches `assembled`'s.
    /// Runs under the registry's read lock: safe to call concurrently
    /// with dispatch from another connection, unsafe to call
    /// recursively from within a callback (would deadlock against a
    /// concurrent `register`/`remove`, per the crate's concurrency
    /// model).
    pub async fn dispatch(&self, assembled: &AssembledEvent) {
        let entries = self.entries.read().await;
        for entry in entries.values() {
            let matches = match &entry.event_type {
                None => true,
                Some(t) => Some(t.as_str()) == assembled.event.event_type(),
            };
            if matches {
                (entry.callback)(assembled);
            }
        }
    }
}

/// A handle returned by [`CallbackRegistry::register`] that removes the
/// callback when invoked. May be dropped without calling `remove` to
/// leave the callback registered indefinitely.
pub struct RemovalToken {
    id: u64,
    registry: std::sync::Weak<CallbackRegistry>,
}

impl RemovalToken {
    /// Unregister the callback. A no-op if the registry has already
    /// been dropped.
    pub async fn remove(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.entries.write().await.remove(&self.id);
        }
    }
}
