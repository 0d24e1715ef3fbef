// ABOUTME: Reconnection delay policy: initial/server-overridden delay, retry ceiling, jitter
// ABOUTME: Mirrors the retry knobs a production SSE client exposes, driven by rand for jitter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

use std::time::Duration;

use rand::Rng;

use crate::constants::client::{DEFAULT_RECONNECTION_TIME, JITTER_FRACTION, UNLIMITED_RETRIES};

/// Governs how a [`super::ClientConnection`] spaces out reconnection
/// attempts after a transient failure.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    initial_delay: Duration,
    max_retries: i64,
    jitter_fraction: f64,
}

impl ReconnectPolicy {
    /// A policy with the crate's default initial delay, unlimited
    /// retries, and ±50% jitter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            initial_delay: DEFAULT_RECONNECTION_TIME,
            max_retries: UNLIMITED_RETRIES,
            jitter_fraction: JITTER_FRACTION,
        }
    }

    /// Override the initial/default reconnection delay.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Cap the number of retries. Negative means unlimited, zero means
    /// never retry.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: i64) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the multiplicative jitter bound (e.g. `0.5` for ±50%).
    #[must_use]
    pub const fn with_jitter_fraction(mut self, jitter_fraction: f64) -> Self {
        self.jitter_fraction = jitter_fraction;
        self
    }

    /// The configured starting delay, before any server `retry:` override.
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Whether another attempt is allowed after `attempt` prior retries
    /// (0-indexed: `attempt == 0` is the first retry after the initial
    /// failure).
    #[must_use]
    pub fn allows_retry(&self, attempt: u32) -> bool {
        if self.max_retries < 0 {
            return true;
        }
        #[allow(clippy::cast_sign_loss)]
        let max = self.max_retries as u64;
        u64::from(attempt) < max
    }

    /// The jittered delay to wait before the next attempt, given the
    /// current base delay (the initial delay, or the most recent server
    /// `retry:` override).
    #[must_use]
    pub fn jittered_delay(&self, base: Duration) -> Duration {
        let mut rng = rand::thread_rng();
        let factor = 1.0 + rng.gen_range(-self.jitter_fraction..=self.jitter_fraction);
        let millis = (base.as_secs_f64() * 1000.0 * factor.max(0.0)).round();
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        Duration::from_millis(millis as u64)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new()
    }
}
