// ABOUTME: Replay stores: the broker's history buffer for resuming subscribers
// ABOUTME: Two implementations trade off count-bounded vs time-bounded retention
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! Replay stores hold recently published events so a reconnecting
//! subscriber presenting a `Last-Event-ID` can catch up on what it missed.
//!
//! [`finite::FiniteReplayer`] bounds retention by count; [`valid::ValidReplayer`]
//! bounds it by age. Both implement [`Replayer`].

pub mod clock;
pub mod finite;
pub mod valid;

pub use clock::{Clock, ManualClock, SystemClock};
pub use finite::FiniteReplayer;
pub use valid::ValidReplayer;

use async_trait::async_trait;

use crate::errors::Result;
use crate::event::Event;
use crate::subscription::{Subscription, Topic};

/// A store of recently published events, consulted by the broker on every
/// publish (to record the event) and on every new/resuming subscription
/// (to replay history).
#[async_trait]
pub trait Replayer: Send {
    /// Record `event` as published to `topics`, returning the event with
    /// its store-assigned `id` if this store auto-assigns ids.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::EventlineError::IdRequired`] if this store
    /// does not auto-assign ids and `event` has none, or
    /// [`crate::errors::EventlineError::IdNotAllowed`] if it does
    /// auto-assign and the caller supplied one anyway.
    fn put(&mut self, event: Event, topics: &[Topic]) -> Result<Event>;

    /// Replay history to `subscription`, filtered by its topic set and
    /// positioned after its `last_event_id` cursor (or from the oldest
    /// retained event if it has none). Flushes the subscription's sink
    /// once replay completes.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by the subscription's sink.
    async fn replay(&mut self, subscription: &mut Subscription) -> Result<()>;

    /// Opportunistically reclaim expired or excess storage. A no-op for
    /// stores with nothing to reclaim.
    fn gc(&mut self) {}
}

fn topics_match(event_topics: &[Topic], subscription: &Subscription) -> bool {
    if event_topics.is_empty() {
        subscription.topics().is_empty() || subscription.topics().contains("")
    } else {
        subscription.matches(event_topics)
    }
}

#[cfg(test)]
pub(crate) fn topics(names: &[&str]) -> Vec<Topic> {
    names.iter().map(|s| (*s).to_owned()).collect()
}
