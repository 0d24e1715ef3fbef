// ABOUTME: Byte-stream line framing and BOM handling for the SSE wire format
// ABOUTME: Synchronous state machine; the async read loop lives in client::transport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! Splits an incoming byte stream into lines (LF, CR, or CRLF terminated)
//! and classifies each one, synchronously and without requiring the whole
//! stream to be buffered at once.

use crate::codec::field::{parse_line, ParsedLine};
use crate::constants::codec::{BOM, DEFAULT_MAX_EVENT_SIZE};
use crate::errors::{EventlineError, Result};

/// One token produced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A non-blank line, classified.
    Line(ParsedLine),
    /// A blank line: the boundary between two events.
    Boundary,
}

/// Incremental line framer. Feed it bytes as they arrive with [`Decoder::feed`]
/// and drain completed lines with [`Decoder::poll_line`].
#[derive(Debug)]
pub struct Decoder {
    buf: Vec<u8>,
    bom_checked: bool,
    max_event_size: usize,
    bytes_in_current_event: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// A decoder with the default maximum event size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_event_size(DEFAULT_MAX_EVENT_SIZE)
    }

    /// A decoder that rejects any single event whose accumulated line bytes
    /// exceed `max_event_size`.
    #[must_use]
    pub fn with_max_event_size(max_event_size: usize) -> Self {
        Self {
            buf: Vec::new(),
            bom_checked: false,
            max_event_size,
            bytes_in_current_event: 0,
        }
    }

    /// Append freshly received bytes to the internal buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Whether bytes remain buffered that cannot yet form a complete line
    /// (used by callers to detect [`EventlineError::UnexpectedEndOfInput`]
    /// at end-of-stream, together with the assembler's pending-field state).
    #[must_use]
    pub fn has_buffered_data(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Pop and classify the next complete line, if one is buffered.
    ///
    /// Returns `Ok(None)` when no complete line is available yet (more
    /// bytes are needed). A single CR at the very end of the current
    /// buffer is never treated as a complete terminator, since it might be
    /// the first half of a CRLF pair split across two reads.
    ///
    /// # Errors
    ///
    /// Returns [`EventlineError::EventTooLarge`] if the accumulated size of
    /// the current (not yet boundary-terminated) event exceeds the
    /// configured maximum.
    pub fn poll_line(&mut self) -> Result<Option<Token>> {
        self.strip_bom_once();

        let Some((line_end, term_len)) = self.find_terminator() else {
            return Ok(None);
        };

        let line_bytes: Vec<u8> = self.buf.drain(0..line_end + term_len).collect();
        let line = &line_bytes[..line_end];

        if line.is_empty() {
            self.bytes_in_current_event = 0;
            return Ok(Some(Token::Boundary));
        }

        self.bytes_in_current_event += line.len();
        if self.bytes_in_current_event > self.max_event_size {
            return Err(EventlineError::EventTooLarge {
                limit: self.max_event_size,
            });
        }

        let text = String::from_utf8_lossy(line);
        Ok(Some(Token::Line(parse_line(&text))))
    }

    fn strip_bom_once(&mut self) {
        if self.bom_checked {
            return;
        }
        // Fewer bytes than the BOM itself may have arrived in the first
        // `feed()` (a byte-at-a-time transport, an oddly chunked read);
        // wait for enough to actually decide instead of committing to
        // "not a BOM" prematurely.
        if self.buf.len() < BOM.len() {
            return;
        }
        self.bom_checked = true;
        if self.buf[..BOM.len()] == BOM {
            self.buf.drain(0..BOM.len());
        }
    }

    /// Find the offset and length of the next line terminator, if a
    /// complete one is present in the buffer.
    fn find_terminator(&self) -> Option<(usize, usize)> {
        for i in 0..self.buf.len() {
            match self.buf[i] {
                b'\n' => return Some((i, 1)),
                b'\r' => {
                    return if i + 1 < self.buf.len() {
                        if self.buf[i + 1] == b'\n' {
                            Some((i, 2))
                        } else {
                            Some((i, 1))
                        }
                    } else {
                        // Might be a CRLF split across reads; wait for more data.
                        None
                    };
                }
                _ => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::field::FieldName;

    fn drain_all(decoder: &mut Decoder) -> Vec<Token> {
        let mut out = Vec::new();
        while let Some(tok) = decoder.poll_line().unwrap() {
            out.push(tok);
        }
        out
    }

    #[test]
    fn splits_lf_cr_and_crlf() {
        let mut d = Decoder::new();
        d.feed(b"a: 1\nb: 2\rc: 3\r\n\n");
        let toks = drain_all(&mut d);
        assert_eq!(toks.len(), 4); // three ignored lines + boundary
        assert_eq!(toks[3], Token::Boundary);
    }

    #[test]
    fn bom_stripped_once_at_start() {
        let mut d = Decoder::new();
        let mut input = BOM.to_vec();
        input.extend_from_slice(b"data: hi\n\n");
        d.feed(&input);
        let toks = drain_all(&mut d);
        assert_eq!(
            toks[0],
            Token::Line(ParsedLine::Field(FieldName::Data, "hi".to_owned()))
        );
    }

    #[test]
    fn bom_only_stripped_at_the_very_start() {
        let mut d = Decoder::new();
        let mut input = b"data: a\n".to_vec();
        input.extend_from_slice(&BOM);
        input.extend_from_slice(b"data: b\n\n");
        d.feed(&input);
        let toks = drain_all(&mut d);
        // The second BOM contaminates the "data" field name, dropping that line.
        assert_eq!(
            toks[0],
            Token::Line(ParsedLine::Field(FieldName::Data, "a".to_owned()))
        );
        assert_eq!(toks[1], Token::Line(ParsedLine::Ignored));
        assert_eq!(toks[2], Token::Boundary);
    }

    #[test]
    fn bom_split_across_feeds_is_still_stripped() {
        let mut d = Decoder::new();
        d.feed(&BOM[..1]);
        assert_eq!(d.poll_line().unwrap(), None);
        d.feed(&BOM[1..]);
        d.feed(b"data: hi\n\n");
        let toks = drain_all(&mut d);
        assert_eq!(
            toks[0],
            Token::Line(ParsedLine::Field(FieldName::Data, "hi".to_owned()))
        );
    }

    #[test]
    fn split_crlf_across_feeds_waits_for_more_data() {
        let mut d = Decoder::new();
        d.feed(b"data: hi\r");
        assert_eq!(d.poll_line().unwrap(), None);
        d.feed(b"\n\n");
        let toks = drain_all(&mut d);
        assert_eq!(
            toks[0],
            Token::Line(ParsedLine::Field(FieldName::Data, "hi".to_owned()))
        );
        assert_eq!(toks[1], Token::Boundary);
    }

    #[test]
    fn event_too_large_is_reported() {
        let mut d = Decoder::with_max_event_size(4);
        d.feed(b"data: this line is too long\n");
        assert!(matches!(
            d.poll_line(),
            Err(EventlineError::EventTooLarge { limit: 4 })
        ));
    }
}
