// ABOUTME: TTL-bounded replay store: events expire after a fixed lifetime
// ABOUTME: Storage is a dynamically sized ring that grows on demand and shrinks after GC
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! [`ValidReplayer`]: retains published events until they age past a TTL.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::constants::replay::MIN_VALID_CAPACITY;
use crate::errors::{EventlineError, Result};
use crate::event::Event;
use crate::subscription::{Subscription, Topic};

use super::clock::{Clock, SystemClock};
use super::{topics_match, Replayer};

struct Entry {
    event: Event,
    topics: Vec<Topic>,
    expires_at: Instant,
}

/// A replay store bounded by age: an event is evicted once `ttl` has
/// elapsed since it was published. Storage capacity is not fixed — the
/// ring doubles when a `put` finds it full, and halves (down to
/// [`MIN_VALID_CAPACITY`]) when garbage collection leaves it mostly empty.
pub struct ValidReplayer {
    ttl: Duration,
    gc_interval: Duration,
    auto_ids: bool,
    clock: Arc<dyn Clock>,
    capacity: usize,
    ring: VecDeque<Entry>,
    next_id: u64,
    last_gc: Instant,
}

impl ValidReplayer {
    /// A new store retaining events for `ttl`, using the real system
    /// clock. GC runs opportunistically on `put`, at most once per
    /// `ttl / 4`.
    #[must_use]
    pub fn new(ttl: Duration, auto_ids: bool) -> Self {
        Self::with_clock(ttl, auto_ids, Arc::new(SystemClock))
    }

    /// As [`Self::new`], but driven by an injected [`Clock`] — used in
    /// tests to advance time deterministically.
    #[must_use]
    pub fn with_clock(ttl: Duration, auto_ids: bool, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            ttl,
            gc_interval: ttl / 4,
            auto_ids,
            clock,
            capacity: MIN_VALID_CAPACITY,
            ring: VecDeque::new(),
            next_id: 0,
            last_gc: now,
        }
    }

    /// Override the opportunistic-GC interval (default `ttl / 4`). Pass
    /// [`Duration::ZERO`] to disable automatic GC on `put` entirely and
    /// rely only on explicit [`Replayer::gc`](super::Replayer::gc) calls.
    #[must_use]
    pub fn with_gc_interval(mut self, gc_interval: Duration) -> Self {
        self.gc_interval = gc_interval;
        self
    }

    fn maybe_gc(&mut self, now: Instant) {
        if self.gc_interval.is_zero() {
            return;
        }
        if now.duration_since(self.last_gc) >= self.gc_interval {
            self.gc_at(now);
        }
    }

    fn gc_at(&mut self, now: Instant) {
        while let Some(front) = self.ring.front() {
            if front.expires_at <= now {
                self.ring.pop_front();
            } else {
                break;
            }
        }
        if self.ring.len() < self.capacity / 4 {
            self.capacity = (self.capacity / 2).max(MIN_VALID_CAPACITY);
        }
        self.last_gc = now;
    }

    fn resolve_start_auto(&self, cursor: Option<&str>, now: Instant) -> usize {
        let Some(cursor) = cursor else { return 0 };
        let Ok(cursor) = cursor.parse::<u64>() else {
            return 0;
        };
        let live_start = self.ring.iter().position(|e| e.expires_at > now).unwrap_or(self.ring.len());
        let Some(first) = self.ring.get(live_start).and_then(|e| e.event.id()) else {
            return self.ring.len();
        };
        let Ok(first) = first.parse::<u64>() else {
            return self.ring.len();
        };
        if cursor < first {
            return live_start;
        }
        let newest = first + (self.ring.len() - live_start) as u64 - 1;
        if cursor >= newest {
            return self.ring.len();
        }
        live_start + (cursor - first + 1) as usize
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
impl Replayer for ValidReplayer {
    fn put(&mut self, event: Event, topics: &[Topic]) -> Result<Event> {
        let now = self.clock.now();
        self.maybe_gc(now);

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

        if self.ring.len() >= self.capacity {
            self.capacity *= 2;
        }
        self.ring.push_back(Entry {
            event: event.clone(),
            topics: topics.to_vec(),
            expires_at: now + self.ttl,
        });
        Ok(event)
    }

    async fn replay(&mut self, subscription: &mut Subscription) -> Result<()> {
        let now = self.clock.now();
        let start = if self.auto_ids {
            self.resolve_start_auto(subscription.last_event_id(), now)
        } else {
            self.resolve_start_manual(subscription.last_event_id())
        };

        for entry in self.ring.iter().skip(start) {
            if entry.expires_at <= now {
                continue;
            }
            if topics_match(&entry.topics, subscription) {
                subscription.send(&entry.event).await?;
            }
        }
        subscription.flush().await
    }

    fn gc(&mut self) {
        let now = self.clock.now();
        self.gc_at(now);
    }
}
