// ABOUTME: Structured, environment-overridable configuration for broker/replay/client tuning
// ABOUTME: Named env vars, each parsed independently with a typed fallback to the struct's Default
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! Configuration objects assembled from environment variables: one struct
//! per concern, a `Default` built from [`crate::constants`], and a
//! `from_env` that re-reads each field independently so a single bad
//! variable doesn't block the rest.

use std::time::Duration;

use crate::constants::{broker, client, env_var_or, env_var_parsed, replay};

/// Tuning for [`crate::broker::Broker`].
#[derive(Debug, Clone, Copy)]
pub struct BrokerConfig {
    /// Capacity of the broker's internal command channel.
    pub command_channel_size: usize,
    /// Capacity of a subscriber's outbound mailbox.
    pub subscriber_mailbox_size: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            command_channel_size: broker::COMMAND_CHANNEL_SIZE,
            subscriber_mailbox_size: broker::SUBSCRIBER_MAILBOX_SIZE,
        }
    }
}

impl BrokerConfig {
    /// Load from `EVENTLINE_BROKER_COMMAND_CHANNEL_SIZE` /
    /// `EVENTLINE_BROKER_SUBSCRIBER_MAILBOX_SIZE`, falling back to the
    /// crate defaults for unset or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            command_channel_size: env_var_parsed(
                "EVENTLINE_BROKER_COMMAND_CHANNEL_SIZE",
                default.command_channel_size,
            ),
            subscriber_mailbox_size: env_var_parsed(
                "EVENTLINE_BROKER_SUBSCRIBER_MAILBOX_SIZE",
                default.subscriber_mailbox_size,
            ),
        }
    }
}

/// Which replay store a broker should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayKind {
    /// No replay: subscribers only see events published after they join.
    None,
    /// A fixed-capacity ring buffer (`FiniteReplayer`).
    Finite,
    /// A TTL-bounded, dynamically-sized ring buffer (`ValidReplayer`).
    Valid,
}

/// Tuning for the replay store a broker is constructed with.
#[derive(Debug, Clone, Copy)]
pub struct ReplayConfig {
    /// Which store implementation to use.
    pub kind: ReplayKind,
    /// Ring capacity for [`ReplayKind::Finite`], or the initial capacity
    /// for [`ReplayKind::Valid`].
    pub capacity: usize,
    /// Entry lifetime for [`ReplayKind::Valid`]; ignored otherwise.
    pub ttl: Duration,
    /// Opportunistic-GC interval for [`ReplayKind::Valid`]; ignored
    /// otherwise. Zero disables automatic per-`put` GC, relying only on
    /// manual `gc()` calls.
    pub gc_interval: Duration,
    /// Whether the store assigns ids to events that arrive without one.
    pub auto_ids: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        let ttl = Duration::from_secs(300);
        Self {
            kind: ReplayKind::None,
            capacity: replay::MIN_FINITE_CAPACITY,
            ttl,
            gc_interval: ttl / 4,
            auto_ids: true,
        }
    }
}

impl ReplayConfig {
    /// Load from `EVENTLINE_REPLAY_KIND` (`none`/`finite`/`valid`),
    /// `EVENTLINE_REPLAY_CAPACITY`, `EVENTLINE_REPLAY_TTL_SECS`,
    /// `EVENTLINE_REPLAY_GC_INTERVAL_SECS`, and `EVENTLINE_REPLAY_AUTO_IDS`.
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();
        let kind = match env_var_or("EVENTLINE_REPLAY_KIND", "none").as_str() {
            "finite" => ReplayKind::Finite,
            "valid" => ReplayKind::Valid,
            _ => ReplayKind::None,
        };
        Self {
            kind,
            capacity: env_var_parsed("EVENTLINE_REPLAY_CAPACITY", default.capacity),
            ttl: Duration::from_secs(env_var_parsed(
                "EVENTLINE_REPLAY_TTL_SECS",
                default.ttl.as_secs(),
            )),
            gc_interval: Duration::from_secs(env_var_parsed(
                "EVENTLINE_REPLAY_GC_INTERVAL_SECS",
                default.gc_interval.as_secs(),
            )),
            auto_ids: env_var_parsed("EVENTLINE_REPLAY_AUTO_IDS", default.auto_ids),
        }
    }
}

/// Tuning for [`crate::client::ClientConnection`]'s reconnect policy.
#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    /// Starting reconnection delay, absent a server `retry:` override.
    pub initial_delay: Duration,
    /// Retry ceiling; negative means unlimited.
    pub max_retries: i64,
    /// Multiplicative jitter bound applied to the current delay.
    pub jitter_fraction: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            initial_delay: client::DEFAULT_RECONNECTION_TIME,
            max_retries: client::UNLIMITED_RETRIES,
            jitter_fraction: client::JITTER_FRACTION,
        }
    }
}

impl ClientConfig {
    /// Load from `EVENTLINE_CLIENT_INITIAL_DELAY_MS`,
    /// `EVENTLINE_CLIENT_MAX_RETRIES`, and
    /// `EVENTLINE_CLIENT_JITTER_FRACTION`.
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            initial_delay: Duration::from_millis(env_var_parsed(
                "EVENTLINE_CLIENT_INITIAL_DELAY_MS",
                u64::try_from(default.initial_delay.as_millis()).unwrap_or(u64::MAX),
            )),
            max_retries: env_var_parsed("EVENTLINE_CLIENT_MAX_RETRIES", default.max_retries),
            jitter_fraction: env_var_parsed(
                "EVENTLINE_CLIENT_JITTER_FRACTION",
                default.jitter_fraction,
            ),
        }
    }

    /// Build the equivalent [`crate::client::ReconnectPolicy`].
    #[must_use]
    #[cfg(feature = "client")]
    pub fn to_policy(&self) -> crate::client::ReconnectPolicy {
        crate::client::ReconnectPolicy::new()
            .with_initial_delay(self.initial_delay)
            .with_max_retries(self.max_retries)
            .with_jitter_fraction(self.jitter_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_config_defaults_match_constants() {
        let config = BrokerConfig::default();
        assert_eq!(config.command_channel_size, broker::COMMAND_CHANNEL_SIZE);
        assert_eq!(config.subscriber_mailbox_size, broker::SUBSCRIBER_MAILBOX_SIZE);
    }

    #[test]
    fn replay_config_defaults_to_no_replay() {
        assert_eq!(ReplayConfig::default().kind, ReplayKind::None);
    }

    #[test]
    fn replay_config_gc_interval_defaults_to_a_quarter_of_ttl() {
        let config = ReplayConfig::default();
        assert_eq!(config.gc_interval, config.ttl / 4);
    }

    #[test]
    fn client_config_defaults_to_unlimited_retries() {
        assert_eq!(ClientConfig::default().max_retries, client::UNLIMITED_RETRIES);
    }
}
