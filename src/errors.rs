// ABOUTME: Centralized error handling and error types for the eventline SSE library
// ABOUTME: Defines all error variants used across the codec, replay, broker, and client modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! Unified error type for every subsystem in this crate.
//!
//! Each variant corresponds to a row in the error handling table of the
//! system specification: recoverable, subscriber-local conditions are
//! isolated by the broker rather than surfaced here; this enum carries the
//! conditions that do cross an API boundary.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by any part of the eventline crate.
#[derive(Debug, Error)]
pub enum EventlineError {
    /// `publish` was called with an empty topic set.
    #[error("publish requires at least one topic")]
    NoTopic,

    /// A broker operation was attempted after `shutdown` completed.
    #[error("broker has been shut down")]
    ProviderClosed,

    /// A replay store configured with `auto_ids: false` received an event
    /// without an `id`.
    #[error("replay store requires events to carry an id")]
    IdRequired,

    /// A replay store configured with `auto_ids: true` received an event
    /// that already carried an `id`.
    #[error("replay store does not accept events with a pre-assigned id")]
    IdNotAllowed,

    /// The codec reached end-of-input in the middle of an event (fields
    /// were accumulated but no terminating blank line arrived).
    #[error("stream ended mid-event")]
    UnexpectedEndOfInput,

    /// A `retry:` field value was not composed entirely of ASCII digits,
    /// encountered during strict (non-streaming) event unmarshaling.
    #[error("retry field is not a base-10 integer")]
    RetryNotDigits,

    /// The event exceeded the codec's configured maximum size.
    #[error("event exceeded the maximum allowed size of {limit} bytes")]
    EventTooLarge {
        /// The configured limit that was exceeded.
        limit: usize,
    },

    /// The HTTP response writer could not be upgraded into a streaming body.
    #[error("server-sent events unsupported")]
    UpgradeUnsupported,

    /// An id, type, or other field failed its structural invariant (LF/CR/NUL).
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Name of the offending field (`id`, `event`, ...).
        field: &'static str,
        /// Human-readable reason.
        reason: &'static str,
    },

    /// The client's retry-triggering request had a body and no reset hook
    /// was supplied, so it cannot be safely replayed.
    #[error("request body cannot be reset for reconnection")]
    NoBodyResetter,

    /// A client connection error, classified as permanent or transient.
    #[error("connection error: {reason}")]
    Connection {
        /// Short, stable description of what failed.
        reason: String,
        /// Whether the connection layer considers this retryable.
        class: ErrorClass,
        /// The underlying transport/validation error, if any.
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl EventlineError {
    /// Build a [`EventlineError::Connection`] classified as permanent.
    #[must_use]
    pub fn permanent(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
            class: ErrorClass::Permanent,
            cause: None,
        }
    }

    /// Build a [`EventlineError::Connection`] classified as transient.
    #[must_use]
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
            class: ErrorClass::Transient,
            cause: None,
        }
    }

    /// Attach a source error to a [`EventlineError::Connection`].
    #[must_use]
    pub fn with_cause(
        mut self,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        if let Self::Connection { cause: slot, .. } = &mut self {
            *slot = Some(Box::new(cause));
        }
        self
    }

    /// Whether this error should stop the client connection immediately
    /// rather than schedule a reconnect.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        match self {
            Self::Connection { class, .. } => matches!(class, ErrorClass::Permanent),
            Self::NoBodyResetter | Self::InvalidField { .. } => true,
            _ => false,
        }
    }
}

/// Classification used by the client connection's retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Propagate immediately; no reconnect will be attempted.
    Permanent,
    /// Schedule a reconnection per the retry policy.
    Transient,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permanent => write!(f, "permanent"),
            Self::Transient => write!(f, "transient"),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EventlineError>;

/// A reconnection delay floor, retained for documentation purposes in
/// [`crate::client::ReconnectPolicy`].
pub(crate) const MIN_RETRY_DELAY: Duration = Duration::from_millis(1);
