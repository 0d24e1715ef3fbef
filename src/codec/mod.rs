// ABOUTME: The SSE wire codec: line framing, field recognition, event assembly, and encoding
// ABOUTME: Synchronous and allocation-light; async I/O driving lives in client::transport and http
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! The streaming decoder and symmetric encoder for the SSE wire format.
//!
//! [`decoder::Decoder`] turns bytes into [`decoder::Token`]s; [`assembler::Assembler`]
//! turns tokens into [`assembler::AssembledEvent`]s; [`encoder::encode`] goes
//! the other way, from [`crate::event::Event`] back to wire text.

/// Event assembly: fields between blank lines become one [`crate::event::Event`].
pub mod assembler;
/// Byte-stream line framing, BOM handling, and event-size limits.
pub mod decoder;
/// Symmetric encoder: [`crate::event::Event`] to wire text.
pub mod encoder;
/// Single-line field tokenization (`data`/`event`/`id`/`retry`/comment).
pub mod field;

pub use assembler::{AssembledEvent, Assembler};
pub use decoder::{Decoder, Token};
pub use encoder::{encode, encode_to_string};

use crate::errors::Result;

/// Decode a complete, self-contained buffer into its events, using the
/// default (non-comment-retaining) assembler.
///
/// Trailing fields with no terminating blank line are discarded and
/// reported as [`crate::errors::EventlineError::UnexpectedEndOfInput`].
///
/// # Errors
///
/// Returns an error if the input exceeds the default maximum event size or
/// ends mid-event.
pub fn decode_all(input: &[u8]) -> Result<Vec<AssembledEvent>> {
    let mut decoder = Decoder::new();
    let mut assembler = Assembler::new();
    let mut events = Vec::new();

    decoder.feed(input);
    while let Some(token) = decoder.poll_line()? {
        if let Some(assembled) = assembler.push(token) {
            events.push(assembled);
        }
    }

    if decoder.has_buffered_data() || assembler.has_pending_fields() {
        return Err(crate::errors::EventlineError::UnexpectedEndOfInput);
    }

    Ok(events)
}
