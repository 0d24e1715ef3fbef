// ABOUTME: axum adapter wiring the broker to HTTP SSE responses
// ABOUTME: An Sse<Stream> fed by a per-connection channel, bridging the broker's Sink trait into axum
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! Glue between [`crate::broker::Broker`] and an `axum` HTTP server: each
//! connection gets its own channel-backed [`crate::subscription::Sink`]
//! feeding an `axum::response::sse::Sse` stream.

use std::convert::Infallible;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event as AxumEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures_util::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::info;

use crate::broker::{Broker, CancelToken};
use crate::constants::broker::SUBSCRIBER_MAILBOX_SIZE;
use crate::constants::identity::LIBRARY_NAME;
use crate::errors::{EventlineError, Result};
use crate::event::Event;
use crate::subscription::{Sink, Subscription, Topic};

impl IntoResponse for EventlineError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UpgradeUnsupported => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoTopic | Self::InvalidField { .. } | Self::RetryNotDigits => StatusCode::BAD_REQUEST,
            Self::ProviderClosed => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = if matches!(self, Self::UpgradeUnsupported) {
            "Server-sent events unsupported\n".to_owned()
        } else {
            format!("{self}\n")
        };
        (status, body).into_response()
    }
}

/// A [`Sink`] that forwards events into an unbounded-lifetime per-connection
/// channel read by the `axum::response::sse::Sse` stream. `send` reports
/// [`EventlineError::UpgradeUnsupported`] once the HTTP connection has gone
/// away and the channel's receiver has been dropped.
struct ChannelSink {
    tx: mpsc::Sender<Event>,
}

#[async_trait]
impl Sink for ChannelSink {
    async fn send(&mut self, event: &Event) -> Result<()> {
        self.tx
            .send(event.clone())
            .await
            .map_err(|_| EventlineError::UpgradeUnsupported)
    }

    async fn flush(&mut self) -> Result<()> {
        if self.tx.is_closed() {
            return Err(EventlineError::UpgradeUnsupported);
        }
        Ok(())
    }
}

/// Read `Last-Event-ID` from `headers`, per §6: absent, empty, or
/// containing control characters is treated as "no cursor."
fn extract_last_event_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Last-Event-ID")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && !v.chars().any(char::is_control))
        .map(str::to_owned)
}

fn to_axum_event(event: Event) -> AxumEvent {
    let mut axum_event = AxumEvent::default();
    if let Some(id) = event.id() {
        axum_event = axum_event.id(id);
    }
    if let Some(event_type) = event.event_type() {
        axum_event = axum_event.event(event_type);
    }
    if let Some(retry) = event.retry() {
        axum_event = axum_event.retry(retry);
    }
    axum_event = axum_event.data(event.data().join("\n"));
    axum_event
}

/// Build an `axum` SSE response subscribing `topics` on `broker`, honoring
/// the request's `Last-Event-ID` header as the replay cursor.
///
/// The returned stream never errors at the `axum` layer (`Infallible`);
/// sink failures end the stream and are reported via `tracing`, matching
/// `handle_notification_sse`'s unregister-on-close behavior.
pub fn subscribe_route(
    broker: Broker,
    topics: Vec<Topic>,
    headers: &HeaderMap,
) -> Sse<impl Stream<Item = std::result::Result<AxumEvent, Infallible>>> {
    let (tx, rx) = mpsc::channel(SUBSCRIBER_MAILBOX_SIZE);
    let topic_set = topics.into_iter().collect();
    let mut subscription = Subscription::new(Box::new(ChannelSink { tx }), topic_set);
    if let Some(id) = extract_last_event_id(headers) {
        subscription = subscription.with_last_event_id(id);
    }

    tokio::spawn(async move {
        if let Err(e) = broker.subscribe(subscription, CancelToken::pending()).await {
            info!(target: LIBRARY_NAME, error = %e, "sse subscriber ended");
        }
    });

    let stream = ReceiverStream::new(rx).map(|event| Ok(to_axum_event(event)));
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("keepalive"))
}
