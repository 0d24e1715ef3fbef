// ABOUTME: Reconnecting SSE client connection: drives a request, retries on transient failure
// ABOUTME: Turns a reqwest::Response body into decoded events, with a retry/backoff state machine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! A reconnecting client connection: turns a [`reqwest::Response`] body
//! into decoded events, with a retry/backoff/`Last-Event-ID` state machine
//! and a per-event-type callback registry.

pub mod backoff;
pub mod registry;
pub mod validator;

pub use backoff::ReconnectPolicy;
pub use registry::{CallbackRegistry, RemovalToken};
pub use validator::{default_validator, ResponseValidator};

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT, CACHE_CONTROL, CONNECTION};
use tracing::{error, warn};

use crate::codec::{AssembledEvent, Assembler, Decoder};
use crate::constants::identity::LIBRARY_NAME;
use crate::errors::{EventlineError, Result};

/// `text/event-stream`, the `Accept` header value this connection sends.
pub static MIME_EVENT_STREAM: HeaderValue = HeaderValue::from_static("text/event-stream");

/// A reconnecting consumer of one SSE endpoint.
///
/// Owns a [`reqwest::Client`] and a template [`reqwest::Request`] that is
/// re-cloned on every attempt ([`reqwest::Request::try_clone`]); requests
/// whose body cannot be cloned (a streaming body) fail reconnection with
/// [`EventlineError::NoBodyResetter`] rather than silently losing data.
pub struct ClientConnection {
    client: reqwest::Client,
    request: reqwest::Request,
    policy: ReconnectPolicy,
    validator: ResponseValidator,
    registry: Arc<CallbackRegistry>,
    last_event_id: Option<String>,
}

impl ClientConnection {
    /// A connection that will issue `request` (and retries built from
    /// `request.try_clone()`), using `client` as the transport.
    #[must_use]
    pub fn new(client: reqwest::Client, request: reqwest::Request) -> Self {
        Self {
            client,
            request,
            policy: ReconnectPolicy::new(),
            validator: default_validator(),
            registry: CallbackRegistry::new(),
            last_event_id: None,
        }
    }

    /// A convenience constructor for a simple `GET` endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` cannot be parsed or the request cannot
    /// be built.
    pub fn get(client: reqwest::Client, url: &str) -> Result<Self> {
        let request = client
            .get(url)
            .build()
            .map_err(|e| EventlineError::permanent(e.to_string()).with_cause(e))?;
        Ok(Self::new(client, request))
    }

    /// Override the reconnection policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the response validator.
    #[must_use]
    pub fn with_validator(mut self, validator: ResponseValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Register a callback for `event_type` (`None` for every event).
    /// Delivery happens on the task driving [`Self::connect`]; the
    /// callback must not block indefinitely.
    pub async fn on(
        &self,
        event_type: Option<String>,
        callback: impl Fn(&AssembledEvent) + Send + Sync + 'static,
    ) -> RemovalToken {
        self.registry.register(event_type, callback).await
    }

    /// The last non-NUL event id observed, used as the next `Last-Event-ID`.
    #[must_use]
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Drive the connection until `cancel` is signaled or a permanent
    /// error occurs. Reconnects on transient failure per the configured
    /// [`ReconnectPolicy`], resetting the attempt counter after every
    /// successful read.
    ///
    /// # Errors
    ///
    /// Returns the permanent error that ended the connection. Returns
    /// `Ok(())` if `cancel` was signaled.
    pub async fn connect(&mut self, mut cancel: crate::broker::CancelToken) -> Result<()> {
        let mut attempt: u32 = 0;
        let mut current_delay = self.policy.initial_delay();

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            match self.read_once(&mut current_delay).await {
                Ok(()) => {
                    attempt = 0;
                    continue;
                }
                Err(e) if e.is_permanent() => {
                    error!(target: LIBRARY_NAME, error = %e, "sse connection failed permanently");
                    return Err(e);
                }
                Err(e) => {
                    if !self.policy.allows_retry(attempt) {
                        error!(target: LIBRARY_NAME, error = %e, attempt, "sse connection exhausted retries");
                        return Err(e);
                    }
                    let delay = self.policy.jittered_delay(current_delay);
                    warn!(target: LIBRARY_NAME, error = %e, attempt, ?delay, "sse connection failed, retrying");
                    tokio::select! {
                        () = cancel.cancelled() => return Ok(()),
                        () = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn read_once(&mut self, current_delay: &mut Duration) -> Result<()> {
        let mut request = self
            .request
            .try_clone()
            .ok_or(EventlineError::NoBodyResetter)?;
        apply_standard_headers(&mut request, self.last_event_id.as_deref());

        let response = self
            .client
            .execute(request)
            .await
            .map_err(classify_transport_error)?;

        (self.validator)(&response)?;

        let mut decoder = Decoder::new();
        let mut assembler = Assembler::new();
        let mut response = response;

        loop {
            let chunk = response.chunk().await.map_err(classify_transport_error)?;
            let Some(bytes) = chunk else { break };
            decoder.feed(&bytes);
            while let Some(token) = decoder.poll_line()? {
                if let Some(assembled) = assembler.push(token) {
                    if let Some(retry) = assembled.event.retry() {
                        *current_delay = retry;
                    }
                    self.registry.dispatch(&assembled).await;
                }
                // The id cursor updates as soon as an `id:` field is
                // parsed, independent of whether its event ever dispatches
                // (the event may still be truncated or a pure keep-alive).
                if let Some(id) = assembler.last_event_id() {
                    self.last_event_id = Some(id.to_owned());
                }
            }
        }

        // The body ended without a terminating blank line for the event
        // still being accumulated: a truncated upstream response, not a
        // clean close. `UnexpectedEndOfInput` is non-permanent, so this
        // takes the retry/backoff path in `connect` rather than resetting
        // the attempt counter as a clean read would.
        if decoder.has_buffered_data() || assembler.has_pending_fields() {
            return Err(EventlineError::UnexpectedEndOfInput);
        }

        Ok(())
    }
}

fn apply_standard_headers(request: &mut reqwest::Request, last_event_id: Option<&str>) {
    let headers = request.headers_mut();
    headers.insert(ACCEPT, MIME_EVENT_STREAM.clone());
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    match last_event_id.and_then(|id| HeaderValue::from_str(id).ok()) {
        Some(value) => {
            headers.insert("Last-Event-ID", value);
        }
        None => {
            headers.remove("Last-Event-ID");
        }
    }
}

/// DNS/connect failures, timeouts, and mid-stream read errors are all
/// transient per the connection's error classification: the caller's
/// [`ReconnectPolicy`] decides whether and when to retry.
fn classify_transport_error(err: reqwest::Error) -> EventlineError {
    EventlineError::transient(err.to_string()).with_cause(err)
}
