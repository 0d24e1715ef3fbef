// ABOUTME: Groups decoded fields into complete Events and tracks the last-event-id cursor
// ABOUTME: Consumes codec::decoder::Token and produces AssembledEvent on each boundary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! Turns a stream of [`Token`]s into [`AssembledEvent`]s.

use crate::codec::decoder::Token;
use crate::codec::field::{FieldName, ParsedLine};
use crate::event::{BodyPart, Event};

/// An event dispatched by the assembler, paired with the assembler's
/// persisted last-event-id cursor at the moment of dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledEvent {
    /// The event as accumulated since the previous boundary.
    pub event: Event,
    /// The cursor value to use for `Last-Event-ID` on reconnection; this
    /// persists across events that do not themselves carry an `id` field.
    pub last_event_id: Option<String>,
}

/// Accumulates fields between event boundaries.
#[derive(Debug, Default)]
pub struct Assembler {
    retain_comments: bool,
    last_event_id: Option<String>,
    pending_id: Option<String>,
    pending_event_type: Option<String>,
    pending_body: Vec<BodyPart>,
    pending_retry_ms: Option<u64>,
    any_field_set: bool,
}

impl Assembler {
    /// An assembler that discards comment lines (the default per the wire
    /// format rules).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An assembler that retains comment lines on the built [`Event`].
    #[must_use]
    pub fn retaining_comments() -> Self {
        Self {
            retain_comments: true,
            ..Self::default()
        }
    }

    /// The current last-event-id cursor, independent of whether an event
    /// is currently being assembled.
    #[must_use]
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Whether fields have accumulated since the last boundary without yet
    /// being dispatched. True at end-of-stream means the stream ended
    /// mid-event: a terminating blank line never arrived.
    #[must_use]
    pub fn has_pending_fields(&self) -> bool {
        self.any_field_set
    }

    /// Feed one decoder token. Returns `Some` exactly when `token` was a
    /// [`Token::Boundary`] that closed a non-empty event.
    pub fn push(&mut self, token: Token) -> Option<AssembledEvent> {
        match token {
            Token::Line(line) => {
                self.push_line(line);
                None
            }
            Token::Boundary => self.close(),
        }
    }

    fn push_line(&mut self, line: ParsedLine) {
        match line {
            ParsedLine::Field(FieldName::Data, value) => {
                self.pending_body.push(BodyPart::Data(value));
                self.any_field_set = true;
            }
            ParsedLine::Field(FieldName::Event, value) => {
                self.pending_event_type = Some(value);
                self.any_field_set = true;
            }
            ParsedLine::Field(FieldName::Id, value) => {
                if value.contains('\0') {
                    return;
                }
                self.last_event_id = Some(value.clone());
                self.pending_id = Some(value);
                self.any_field_set = true;
            }
            ParsedLine::Field(FieldName::Retry, value) => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.pending_retry_ms = Some(ms);
                    self.any_field_set = true;
                }
                // Non-digit retry values are silently ignored by the
                // streaming codec (strict unmarshal rejects them instead).
            }
            ParsedLine::Comment(text) => {
                if self.retain_comments {
                    self.pending_body.push(BodyPart::Comment(text));
                    self.any_field_set = true;
                }
            }
            ParsedLine::Ignored => {}
        }
    }

    fn close(&mut self) -> Option<AssembledEvent> {
        let dispatch = if self.any_field_set {
            let event = Event::from_parts(
                self.pending_id.take(),
                self.pending_event_type.take(),
                self.pending_body.drain(..).collect(),
                self.pending_retry_ms.take().map(std::time::Duration::from_millis),
            );
            Some(AssembledEvent {
                event,
                last_event_id: self.last_event_id.clone(),
            })
        } else {
            None
        };

        self.pending_id = None;
        self.pending_event_type = None;
        self.pending_body.clear();
        self.pending_retry_ms = None;
        self.any_field_set = false;

        dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::field::ParsedLine;

    fn field(name: FieldName, value: &str) -> Token {
        Token::Line(ParsedLine::Field(name, value.to_owned()))
    }

    #[test]
    fn dispatches_on_boundary_with_any_field() {
        let mut a = Assembler::new();
        assert_eq!(a.push(field(FieldName::Data, "hi")), None);
        let dispatched = a.push(Token::Boundary).unwrap();
        assert_eq!(dispatched.event.data(), vec!["hi"]);
    }

    #[test]
    fn suppresses_dispatch_on_pure_keepalive() {
        let mut a = Assembler::new();
        assert_eq!(a.push(Token::Boundary), None);
    }

    #[test]
    fn last_event_id_persists_across_events() {
        let mut a = Assembler::new();
        a.push(field(FieldName::Id, "42"));
        a.push(field(FieldName::Data, "first"));
        let first = a.push(Token::Boundary).unwrap();
        assert_eq!(first.last_event_id.as_deref(), Some("42"));

        a.push(field(FieldName::Data, "second"));
        let second = a.push(Token::Boundary).unwrap();
        assert_eq!(second.event.id(), None);
        assert_eq!(second.last_event_id.as_deref(), Some("42"));
    }

    #[test]
    fn nul_id_is_ignored() {
        let mut a = Assembler::new();
        a.push(field(FieldName::Id, "a\0b"));
        a.push(field(FieldName::Data, "x"));
        let dispatched = a.push(Token::Boundary).unwrap();
        assert_eq!(dispatched.event.id(), None);
        assert_eq!(a.last_event_id(), None);
    }

    #[test]
    fn has_pending_fields_reports_unclosed_event() {
        let mut a = Assembler::new();
        assert!(!a.has_pending_fields());
        a.push(field(FieldName::Data, "partial"));
        assert!(a.has_pending_fields());
        a.push(Token::Boundary);
        assert!(!a.has_pending_fields());
    }

    #[test]
    fn non_digit_retry_is_ignored() {
        let mut a = Assembler::new();
        a.push(field(FieldName::Retry, "x"));
        a.push(field(FieldName::Data, "hi"));
        let dispatched = a.push(Token::Boundary).unwrap();
        assert_eq!(dispatched.event.retry(), None);
    }
}
