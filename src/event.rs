// ABOUTME: The Event data model and its validating builder
// ABOUTME: Shared by the codec, replay stores, broker, and client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! The [`Event`] type: a single SSE message and the builder that validates
//! its structural invariants before construction.

use std::time::Duration;

use crate::errors::{EventlineError, Result};

/// One piece of an event's body, in the order it was appended.
///
/// `data` and `comment` lines are interleaved on the wire in call order
/// (only `id`/`event`/`retry` have a fixed position ahead of the body), so
/// the body is kept as a single ordered sequence rather than two separate
/// vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BodyPart {
    Data(String),
    Comment(String),
}

/// A single Server-Sent Event.
///
/// Once constructed, an `Event` is logically immutable: the replay store may
/// clone it and assign an `id`, but it never mutates a caller's copy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Event {
    id: Option<String>,
    event_type: Option<String>,
    body: Vec<BodyPart>,
    retry: Option<Duration>,
}

impl Event {
    /// Start building a new event.
    #[must_use]
    pub fn builder() -> EventBuilder {
        EventBuilder::default()
    }

    /// The event's `id`, if set. Unset is distinct from an empty string.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The event's `event:` type, if set.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    /// The ordered `data:` chunks, with any interleaved comments filtered out.
    #[must_use]
    pub fn data(&self) -> Vec<&str> {
        self.body
            .iter()
            .filter_map(|p| match p {
                BodyPart::Data(s) => Some(s.as_str()),
                BodyPart::Comment(_) => None,
            })
            .collect()
    }

    /// The `retry:` reconnection time, if set and serializable (>= 1ms).
    #[must_use]
    pub const fn retry(&self) -> Option<Duration> {
        self.retry
    }

    /// Comment (`:`) lines, preserved only when a parser chose to retain
    /// them, with any interleaved data chunks filtered out.
    #[must_use]
    pub fn comments(&self) -> Vec<&str> {
        self.body
            .iter()
            .filter_map(|p| match p {
                BodyPart::Comment(s) => Some(s.as_str()),
                BodyPart::Data(_) => None,
            })
            .collect()
    }

    /// The event's body in wire order: data chunks and comments as
    /// originally appended.
    pub(crate) fn body(&self) -> &[BodyPart] {
        &self.body
    }

    /// True if no field at all is set on this event (a pure keep-alive).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.event_type.is_none() && self.body.is_empty() && self.retry.is_none()
    }

    /// Returns a clone of this event with `id` replaced, used by replay
    /// stores that auto-assign ids on `put`.
    #[must_use]
    pub(crate) fn with_id(&self, id: String) -> Self {
        let mut clone = self.clone();
        clone.id = Some(id);
        clone
    }

    /// Construct an event directly from already-validated, ordered parts.
    ///
    /// Used by [`crate::codec::assembler::Assembler`], which enforces the
    /// `id`-NUL invariant itself as fields stream in and can never produce
    /// a multi-line `id`/`event` value (the decoder only ever yields whole
    /// lines), so the builder's validation would be redundant here.
    pub(crate) fn from_parts(
        id: Option<String>,
        event_type: Option<String>,
        body: Vec<BodyPart>,
        retry: Option<Duration>,
    ) -> Self {
        Self {
            id,
            event_type,
            body,
            retry,
        }
    }
}

/// Validating constructor for [`Event`].
#[derive(Debug, Default)]
pub struct EventBuilder {
    id: Option<String>,
    event_type: Option<String>,
    body: Vec<BodyPart>,
    retry: Option<Duration>,
}

fn is_single_line(s: &str) -> bool {
    !s.contains('\n') && !s.contains('\r')
}

impl EventBuilder {
    /// Set the event's `id`. Rejected if it contains LF, CR, or NUL.
    ///
    /// # Errors
    ///
    /// Returns [`EventlineError::InvalidField`] if `id` contains a line
    /// terminator or a NUL byte.
    pub fn id(mut self, id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if !is_single_line(&id) {
            return Err(EventlineError::InvalidField {
                field: "id",
                reason: "must not contain LF or CR",
            });
        }
        if id.contains('\0') {
            return Err(EventlineError::InvalidField {
                field: "id",
                reason: "must not contain NUL",
            });
        }
        self.id = Some(id);
        Ok(self)
    }

    /// Set the event's `event:` type. Rejected if it contains LF or CR.
    ///
    /// # Errors
    ///
    /// Returns [`EventlineError::InvalidField`] if `event_type` contains a
    /// line terminator.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Result<Self> {
        let event_type = event_type.into();
        if !is_single_line(&event_type) {
            return Err(EventlineError::InvalidField {
                field: "event",
                reason: "must not contain LF or CR",
            });
        }
        self.event_type = Some(event_type);
        Ok(self)
    }

    /// Append a `data:` chunk. Newlines within `chunk` are split into
    /// multiple `data:` lines by the encoder, not here.
    #[must_use]
    pub fn data(mut self, chunk: impl Into<String>) -> Self {
        self.body.push(BodyPart::Data(chunk.into()));
        self
    }

    /// Set the `retry:` reconnection time. Values below 1ms are silently
    /// not serialized by the encoder, per the wire format rules.
    #[must_use]
    pub const fn retry(mut self, retry: Duration) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Append a comment (`:`) line, in call order relative to `data`.
    #[must_use]
    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.body.push(BodyPart::Comment(text.into()));
        self
    }

    /// Finish building the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: self.id,
            event_type: self.event_type,
            body: self.body,
            retry: self.retry,
        }
    }
}
