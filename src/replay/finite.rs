// ABOUTME: Count-bounded replay store: a fixed-capacity ring of the last N events
// ABOUTME: Cursor resolution differs for auto-assigned vs caller-supplied ids
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! [`FiniteReplayer`]: retains exactly the last `capacity` published events.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::constants::replay::MIN_FINITE_CAPACITY;
use crate::errors::{EventlineError, Result};
use crate::event::Event;
use crate::subscription::{Subscription, Topic};

use super::{topics_match, Replayer};

struct Entry {
    event: Event,
    topics: Vec<Topic>,
}

/// A replay store bounded by event count. When full, the oldest event is
/// evicted to make room for the newest.
pub struct FiniteReplayer {
    capacity: usize,
    auto_ids: bool,
    ring: VecDeque<Entry>,
    next_id: u64,
}

impl FiniteReplayer {
    /// A new store holding at most `capacity` events (clamped to
    /// [`MIN_FINITE_CAPACITY`]). When `auto_ids` is true, the store
    /// assigns its own monotonically increasing base-10 ids and rejects
    /// events that already carry one; when false, callers must supply an
    /// id on every published event.
    #[must_use]
    pub fn new(capacity: usize, auto_ids: bool) -> Self {
        Self {
            capacity: capacity.max(MIN_FINITE_CAPACITY),
            auto_ids,
            ring: VecDeque::new(),
            next_id: 0,
        }
    }

    fn resolve_start_auto(&self, cursor: Option<&str>) -> usize {
        let Some(cursor) = cursor else { return 0 };
        let Ok(cursor) = cursor.parse::<u64>() else {
            return 0;
        };
        let Some(first) = self.ring.front().and_then(|e| e.event.id()) else {
            return 0;
        };
        let Ok(first) = first.parse::<u64>() else {
            return 0;
        };
        if cursor < first {
            return 0;
        }
        let newest = first + self.ring.len() as u64 - 1;
        if cursor >= newest {
            return self.ring.len();
        }
        (cursor - first + 1) as usize
    }

    fn resolve_start_manual(&self, cursor: Option<&str>) -> usize {
        let Some(cursor) = cursor else { return 0 };
        match self.ring.iter().position(|e| e.event.id() == Some(cursor)) {
            Some(pos) => pos + 1,
            None => self.ring.len(),
        }
    }
}

#[async_trait]
impl Replayer for FiniteReplayer {
    fn put(&mut self, event: Event, topics: &[Topic]) -> Result<Event> {
        let event = if self.auto_ids {
            if event.id().is_some() {
                return Err(EventlineError::IdNotAllowed);
            }
            let id = self.next_id.to_string();
            self.next_id += 1;
            event.with_id(id)
        } else {
            if event.id().is_none() {
                return Err(EventlineError::IdRequired);
            }
            event
        };

        if self.ring.len() == self.capacity {
            self.ring.pop_front();
        }
        self.ring.push_back(Entry {
            event: event.clone(),
            topics: topics.to_vec(),
        });
        Ok(event)
    }

    async fn replay(&mut self, subscription: &mut Subscription) -> Result<()> {
        let start = if self.auto_ids {
            self.resolve_start_auto(subscription.last_event_id())
        } else {
            self.resolve_start_manual(subscription.last_event_id())
        };

        for entry in self.ring.iter().skip(start) {
            if topics_match(&entry.topics, subscription) {
                subscription.send(&entry.event).await?;
            }
        }
        subscription.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::topics;
    use crate::subscription::{Subscription, VecSink};

    fn sub(last_event_id: Option<&str>) -> (Subscription, VecSink) {
        let sink = VecSink::new();
        let mut s = Subscription::new(Box::new(sink.clone()), Default::default());
        if let Some(id) = last_event_id {
            s = s.with_last_event_id(id);
        }
        (s, sink)
    }

    #[tokio::test]
    async fn auto_ids_reject_caller_supplied_id() {
        let mut r = FiniteReplayer::new(3, true);
        let e = Event::builder().data("x").id("5").unwrap().build();
        assert!(matches!(r.put(e, &[]), Err(EventlineError::IdNotAllowed)));
    }

    #[tokio::test]
    async fn manual_ids_require_caller_supplied_id() {
        let mut r = FiniteReplayer::new(3, false);
        let e = Event::builder().data("x").build();
        assert!(matches!(r.put(e, &[]), Err(EventlineError::IdRequired)));
    }

    #[tokio::test]
    async fn auto_ids_assign_sequential_ids() {
        let mut r = FiniteReplayer::new(3, true);
        let a = r.put(Event::builder().data("a").build(), &[]).unwrap();
        let b = r.put(Event::builder().data("b").build(), &[]).unwrap();
        assert_eq!(a.id(), Some("0"));
        assert_eq!(b.id(), Some("1"));
    }

    #[tokio::test]
    async fn cursor_zero_replays_events_after_it() {
        let mut r = FiniteReplayer::new(3, true);
        for c in ["a", "b", "c"] {
            r.put(Event::builder().data(c).build(), &[]).unwrap();
        }
        let (mut s, sink) = sub(Some("0"));
        r.replay(&mut s).await.unwrap();
        let received = sink.received();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].id(), Some("1"));
        assert_eq!(received[1].id(), Some("2"));
        assert_eq!(sink.flush_count(), 1);
    }

    #[tokio::test]
    async fn eviction_drops_oldest_on_overflow() {
        let mut r = FiniteReplayer::new(2, true);
        r.put(Event::builder().data("a").build(), &[]).unwrap();
        r.put(Event::builder().data("b").build(), &[]).unwrap();
        r.put(Event::builder().data("c").build(), &[]).unwrap();
        assert_eq!(r.ring.len(), 2);
        assert_eq!(r.ring.front().unwrap().event.id(), Some("1"));
    }

    #[tokio::test]
    async fn cursor_below_oldest_replays_everything() {
        let mut r = FiniteReplayer::new(2, true);
        r.put(Event::builder().data("a").build(), &[]).unwrap();
        r.put(Event::builder().data("b").build(), &[]).unwrap();
        r.put(Event::builder().data("c").build(), &[]).unwrap();
        let start = r.resolve_start_auto(Some("0"));
        assert_eq!(start, 0);
    }

    #[tokio::test]
    async fn unknown_manual_cursor_replays_nothing() {
        let mut r = FiniteReplayer::new(2, false);
        r.put(Event::builder().data("a").id("x").unwrap().build(), &[]).unwrap();
        let start = r.resolve_start_manual(Some("nope"));
        assert_eq!(start, r.ring.len());
    }

    #[tokio::test]
    async fn topic_filter_excludes_non_matching_events() {
        let mut r = FiniteReplayer::new(3, true);
        r.put(Event::builder().data("a").build(), &topics(&["orders"])).unwrap();
        r.put(Event::builder().data("b").build(), &topics(&["shipping"])).unwrap();
        let sink = VecSink::new();
        let mut s = Subscription::new(Box::new(sink.clone()), ["orders".to_owned()].into());
        r.replay(&mut s).await.unwrap();
        let received = sink.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].id(), Some("0"));
    }
}
