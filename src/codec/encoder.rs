// ABOUTME: Writes an Event back out as well-formed SSE wire bytes
// ABOUTME: Always emits LF terminators regardless of the line endings in the source data
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! The symmetric encoder half of the codec: [`Event`] → UTF-8 text.

use crate::event::{BodyPart, Event};

/// Append `event` to `out` as SSE wire text. Writes nothing if `event`
/// carries no fields at all.
pub fn encode(event: &Event, out: &mut String) {
    if event.is_empty() {
        return;
    }

    if let Some(id) = event.id() {
        out.push_str("id: ");
        out.push_str(id);
        out.push('\n');
    }

    if let Some(event_type) = event.event_type() {
        if !event_type.is_empty() {
            out.push_str("event: ");
            out.push_str(event_type);
            out.push('\n');
        }
    }

    if let Some(retry) = event.retry() {
        let millis = retry.as_millis();
        if millis >= 1 {
            out.push_str("retry: ");
            out.push_str(&millis.to_string());
            out.push('\n');
        }
    }

    for part in event.body() {
        match part {
            BodyPart::Data(chunk) => encode_data_chunk(chunk, out),
            BodyPart::Comment(text) => {
                out.push_str(": ");
                out.push_str(text);
                out.push('\n');
            }
        }
    }

    out.push('\n');
}

/// Encode `event` into a freshly allocated `String`.
#[must_use]
pub fn encode_to_string(event: &Event) -> String {
    let mut out = String::new();
    encode(event, &mut out);
    out
}

/// Split `chunk` on any of LF, CR, or CRLF (normalized to LF first), writing
/// one `data: <piece>` line per resulting piece. A chunk ending in a
/// terminator — or the empty chunk itself — still yields a final bare
/// `data:` line.
fn encode_data_chunk(chunk: &str, out: &mut String) {
    if chunk.contains('\r') {
        let normalized = chunk.replace("\r\n", "\n").replace('\r', "\n");
        for line in normalized.split('\n') {
            out.push_str("data: ");
            out.push_str(line);
            out.push('\n');
        }
        return;
    }
    for line in chunk.split('\n') {
        out.push_str("data: ");
        out.push_str(line);
        out.push('\n');
    }
}
