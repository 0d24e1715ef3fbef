// ABOUTME: Crate root: module wiring and the public re-exports consumers reach for
// ABOUTME: No unsafe anywhere in this crate; see Cargo.toml's [lints.rust] for the enforced deny
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! `eventline` is a Server-Sent Events broker: a wire codec, a pub/sub
//! broker with pluggable replay stores for resuming subscribers, and
//! (behind feature flags) a reconnecting `reqwest` client and an `axum`
//! HTTP adapter.
//!
//! The broker ([`broker::Broker`]) is the crate's core: it multiplexes
//! publish/subscribe/shutdown onto a single event-loop task and fans
//! out each published event to every matching subscriber in order. A
//! [`replay::Replayer`] plugged into the broker lets a reconnecting
//! subscriber resume from its last seen event id.
//!
//! Enable `client` for [`client::ClientConnection`], a reconnecting SSE
//! consumer built on `reqwest`. Enable `server` for [`http::subscribe_route`],
//! an `axum` handler that bridges the broker into an HTTP response.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod broker;
pub mod codec;
pub mod config;
pub mod constants;
pub mod errors;
pub mod event;
pub mod replay;
pub mod subscription;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "server")]
pub mod http;

pub use broker::{Broker, CancelHandle, CancelToken};
pub use codec::{decode_all, encode, encode_to_string, AssembledEvent, Assembler, Decoder, Token};
pub use config::{BrokerConfig, ClientConfig, ReplayConfig, ReplayKind};
pub use errors::{ErrorClass, EventlineError, Result};
pub use event::{Event, EventBuilder};
pub use replay::{Clock, FiniteReplayer, ManualClock, Replayer, SystemClock, ValidReplayer};
pub use subscription::{Sink, Subscription, Topic, VecSink};

#[cfg(feature = "client")]
pub use client::{CallbackRegistry, ClientConnection, ReconnectPolicy, RemovalToken};
