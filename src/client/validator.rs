// ABOUTME: Pluggable response validation for the client connection
// ABOUTME: The default requires 200 OK and a text/event-stream Content-Type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

use std::sync::Arc;

use reqwest::Response;

use crate::errors::{EventlineError, Result};

/// A predicate run against the response before it is treated as a live
/// SSE stream. Rejections are always classified as permanent failures.
pub type ResponseValidator = Arc<dyn Fn(&Response) -> Result<()> + Send + Sync>;

/// The default validator: status `200` and a `Content-Type` whose first
/// token (before any `;` or `,`) equals `text/event-stream`.
#[must_use]
pub fn default_validator() -> ResponseValidator {
    Arc::new(|response: &Response| {
        if response.status() != reqwest::StatusCode::OK {
            return Err(EventlineError::permanent(format!(
                "response validation failed: unexpected status {}",
                response.status()
            )));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if first_token(content_type) != "text/event-stream" {
            return Err(EventlineError::permanent(
                "response validation failed: unexpected content type",
            ));
        }
        Ok(())
    })
}

/// The first `;`/`,`-delimited token of a `Content-Type` header value,
/// trimmed of surrounding whitespace.
fn first_token(content_type: &str) -> &str {
    content_type
        .split(|c| c == ';' || c == ',')
        .next()
        .unwrap_or_default()
        .trim()
}
