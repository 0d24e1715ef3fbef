// ABOUTME: The subscriber-facing Sink trait and the Subscription type bound to it
// ABOUTME: Shared between the broker and the replay stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! A [`Subscription`] binds a [`Sink`], an optional resume cursor, and a
//! topic filter together. The broker owns subscriptions for as long as
//! they're active; replay stores read from them (the cursor, the topics)
//! and write to them (`send`/`flush`) during history replay.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::errors::Result;
use crate::event::Event;

/// A destination for events. The broker never calls into a single `Sink`
/// concurrently from multiple tasks, so implementations need not be
/// internally synchronized.
#[async_trait]
pub trait Sink: Send {
    /// Deliver one event.
    async fn send(&mut self, event: &Event) -> Result<()>;

    /// Flush any buffering between the sink and its ultimate destination.
    async fn flush(&mut self) -> Result<()>;
}

/// Topics are opaque strings; the empty string is the default topic.
pub type Topic = String;

/// A subscriber bound to a sink, a resume cursor, and a topic filter.
pub struct Subscription {
    client: Box<dyn Sink>,
    last_event_id: Option<String>,
    topics: HashSet<Topic>,
}

impl Subscription {
    /// Build a subscription. `topics` must be non-empty; the broker
    /// enforces this at `publish` time for the topic set of a
    /// publication, but a subscription itself may legitimately only ever
    /// watch a single topic such as the empty/default one.
    #[must_use]
    pub fn new(client: Box<dyn Sink>, topics: HashSet<Topic>) -> Self {
        Self {
            client,
            last_event_id: None,
            topics,
        }
    }

    /// Attach a `Last-Event-ID` resumption cursor.
    #[must_use]
    pub fn with_last_event_id(mut self, id: impl Into<String>) -> Self {
        self.last_event_id = Some(id.into());
        self
    }

    /// The resumption cursor, if any.
    #[must_use]
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// The topics this subscription watches.
    #[must_use]
    pub fn topics(&self) -> &HashSet<Topic> {
        &self.topics
    }

    /// Whether this subscription's topic set intersects `other`.
    #[must_use]
    pub fn matches(&self, other: &[Topic]) -> bool {
        other.iter().any(|t| self.topics.contains(t))
    }

    /// Deliver one event to the underlying sink.
    pub(crate) async fn send(&mut self, event: &Event) -> Result<()> {
        self.client.send(event).await
    }

    /// Flush the underlying sink.
    pub(crate) async fn flush(&mut self) -> Result<()> {
        self.client.flush().await
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("last_event_id", &self.last_event_id)
            .field("topics", &self.topics)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct VecSinkState {
    received: Vec<Event>,
    flushes: usize,
    fail_next_send: Option<crate::errors::EventlineError>,
}

/// A `Sink` backed by an in-memory buffer, used by tests and the demo.
/// Cheaply cloneable; clones share the same underlying buffer, so a test
/// can keep a handle after handing a boxed clone to a [`Subscription`].
#[derive(Debug, Default, Clone)]
pub struct VecSink(std::sync::Arc<std::sync::Mutex<VecSinkState>>);

impl VecSink {
    /// A fresh, empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arrange for the next `send` to fail with `err` instead of recording
    /// the event.
    pub fn fail_next_send(&self, err: crate::errors::EventlineError) {
        self.0.lock().expect("sink mutex poisoned").fail_next_send = Some(err);
    }

    /// Events received so far, in delivery order.
    #[must_use]
    pub fn received(&self) -> Vec<Event> {
        self.0.lock().expect("sink mutex poisoned").received.clone()
    }

    /// Number of times `flush` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.0.lock().expect("sink mutex poisoned").flushes
    }
}

#[async_trait]
impl Sink for VecSink {
    async fn send(&mut self, event: &Event) -> Result<()> {
        let mut state = self.0.lock().expect("sink mutex poisoned");
        if let Some(err) = state.fail_next_send.take() {
            return Err(err);
        }
        state.received.push(event.clone());
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.0.lock().expect("sink mutex poisoned").flushes += 1;
        Ok(())
    }
}
