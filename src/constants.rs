// ABOUTME: System-wide constants and environment-overridable defaults for eventline
// ABOUTME: env_var_or / from_env configuration pattern shared by every config struct in src/config.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! Hardcoded defaults and environment variable names used across the crate.

use std::env;
use std::str::FromStr;

/// Read an environment variable, falling back to `default` when unset or empty.
pub(crate) fn env_var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

/// Read and parse an environment variable, falling back to `default` when
/// unset, empty, or unparsable.
pub(crate) fn env_var_parsed<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Broker tuning defaults.
pub mod broker {
    /// Default capacity of the broker's internal command channel.
    pub const COMMAND_CHANNEL_SIZE: usize = 256;
    /// Default capacity of a subscriber's outbound mailbox.
    pub const SUBSCRIBER_MAILBOX_SIZE: usize = 64;
}

/// Replay store tuning defaults.
pub mod replay {
    /// Minimum ring capacity accepted by `FiniteReplayer`.
    pub const MIN_FINITE_CAPACITY: usize = 2;
    /// Floor below which `ValidReplayer`'s ring never shrinks.
    pub const MIN_VALID_CAPACITY: usize = 4;
}

/// Client connection tuning defaults.
pub mod client {
    use std::time::Duration;

    /// Default initial reconnection delay, absent a server `retry:` field.
    pub const DEFAULT_RECONNECTION_TIME: Duration = Duration::from_secs(5);
    /// Multiplicative jitter bound applied to the current delay (±50%).
    pub const JITTER_FRACTION: f64 = 0.5;
    /// Negative sentinel meaning "unlimited retries" for `max_retries`.
    pub const UNLIMITED_RETRIES: i64 = -1;
}

/// Codec tuning defaults.
pub mod codec {
    /// Default maximum size, in bytes, of a single buffered event before
    /// [`crate::errors::EventlineError::EventTooLarge`] is raised.
    pub const DEFAULT_MAX_EVENT_SIZE: usize = 64 * 1024;
    /// UTF-8 byte-order mark, stripped once at the start of a stream.
    pub const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
}

/// Service/library identity, used in logging and the `User-Agent`-equivalent
/// `Accept` negotiation of the client connection.
pub mod identity {
    /// Crate name, used as the default `tracing` span/target prefix.
    pub const LIBRARY_NAME: &str = "eventline";
}
