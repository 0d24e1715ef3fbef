// ABOUTME: The single-threaded pub/sub event loop ("Joe") behind a cloneable, thread-safe handle
// ABOUTME: All state mutation happens inside one spawned task; the handle only sends commands to it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 the eventline authors

//! The broker multiplexes publish, subscribe, and shutdown onto one
//! event-loop task behind a task-owned façade: the façade owns the event
//! loop itself rather than fronting a shared `Arc<RwLock<HashMap>>`.
//!
//! State machine: `Uninit -> Running -> Draining -> Terminated`. The loop
//! is spawned lazily on the first operation ([`Broker::publish`],
//! [`Broker::subscribe`], or [`Broker::shutdown`]).

pub mod cancel;

pub use cancel::{CancelHandle, CancelToken};

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use tokio::sync::{mpsc, oneshot, OnceCell};
use tracing::{debug, warn};

use crate::constants;
use crate::errors::{EventlineError, Result};
use crate::event::Event;
use crate::replay::Replayer;
use crate::subscription::{Subscription, Topic};

enum Command {
    Publish {
        event: Event,
        topics: Vec<Topic>,
        reply: oneshot::Sender<Result<()>>,
    },
    Subscribe {
        subscription: Subscription,
        reply: oneshot::Sender<Result<oneshot::Receiver<Result<()>>>>,
    },
    Shutdown {
        reply: oneshot::Sender<Result<()>>,
    },
}

struct SubscriberEntry {
    subscription: Subscription,
    done: Option<oneshot::Sender<Result<()>>>,
}

struct Shared {
    commands: OnceCell<mpsc::Sender<Command>>,
    replayer: Mutex<Option<Box<dyn Replayer>>>,
    command_channel_size: usize,
}

/// A cloneable handle onto a broker's event loop. Every clone shares the
/// same underlying loop; the loop itself is spawned lazily on first use.
#[derive(Clone)]
pub struct Broker(Arc<Shared>);

impl Broker {
    /// A broker with no replay store: subscribers never receive history,
    /// only events published after they join.
    #[must_use]
    pub fn new() -> Self {
        Self::with_replayer(None)
    }

    /// A broker backed by `replayer` for history replay on subscribe.
    #[must_use]
    pub fn with_replayer(replayer: Option<Box<dyn Replayer>>) -> Self {
        Self(Arc::new(Shared {
            commands: OnceCell::new(),
            replayer: Mutex::new(replayer),
            command_channel_size: constants::broker::COMMAND_CHANNEL_SIZE,
        }))
    }

    async fn sender(&self) -> mpsc::Sender<Command> {
        self.0
            .commands
            .get_or_init(|| async {
                let replayer = self
                    .0
                    .replayer
                    .lock()
                    .expect("replayer mutex poisoned")
                    .take();
                let (tx, rx) = mpsc::channel(self.0.command_channel_size);
                tokio::spawn(run_loop(rx, replayer));
                tx
            })
            .await
            .clone()
    }

    /// Publish `event` to `topics`.
    ///
    /// # Errors
    ///
    /// Returns [`EventlineError::NoTopic`] if `topics` is empty, or
    /// [`EventlineError::ProviderClosed`] if the broker has been shut
    /// down. Otherwise succeeds even if individual subscribers are
    /// dropped for failing to accept the event.
    pub async fn publish(&self, event: Event, topics: Vec<Topic>) -> Result<()> {
        if topics.is_empty() {
            return Err(EventlineError::NoTopic);
        }
        let tx = self.sender().await;
        let (reply, reply_rx) = oneshot::channel();
        if tx
            .send(Command::Publish {
                event,
                topics,
                reply,
            })
            .await
            .is_err()
        {
            return Err(EventlineError::ProviderClosed);
        }
        reply_rx.await.unwrap_or(Err(EventlineError::ProviderClosed))
    }

    /// Join `subscription` to the broker, replaying history first.
    ///
    /// Blocks until `cancel` is signaled (returns `Ok(())`), the broker
    /// shuts down (returns [`EventlineError::ProviderClosed`]), or the
    /// subscription's sink errors during fan-out (returns that error).
    ///
    /// # Errors
    ///
    /// Returns whatever the initial replay, or a later `send`/`flush`
    /// call, returned.
    pub async fn subscribe(&self, subscription: Subscription, mut cancel: CancelToken) -> Result<()> {
        let tx = self.sender().await;
        let (reply, reply_rx) = oneshot::channel();
        if tx
            .send(Command::Subscribe {
                subscription,
                reply,
            })
            .await
            .is_err()
        {
            return Err(EventlineError::ProviderClosed);
        }

        let done_rx = match reply_rx.await {
            Ok(Ok(done_rx)) => done_rx,
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(EventlineError::ProviderClosed),
        };

        tokio::select! {
            () = cancel.cancelled() => Ok(()),
            result = done_rx => result.unwrap_or(Err(EventlineError::ProviderClosed)),
        }
    }

    /// Stop the loop: reject further publishes, release every
    /// subscriber, and wait for the loop to fully terminate.
    ///
    /// # Errors
    ///
    /// Returns [`EventlineError::ProviderClosed`] if already shut down.
    pub async fn shutdown(&self) -> Result<()> {
        let tx = self.sender().await;
        let (reply, reply_rx) = oneshot::channel();
        if tx.send(Command::Shutdown { reply }).await.is_err() {
            return Err(EventlineError::ProviderClosed);
        }
        reply_rx.await.unwrap_or(Err(EventlineError::ProviderClosed))
    }

    /// As [`Self::shutdown`], but gives up waiting after `timeout`. The
    /// loop continues draining in the background regardless.
    ///
    /// # Errors
    ///
    /// Returns a transient [`EventlineError::Connection`] if `timeout`
    /// elapses before the loop finishes, or whatever [`Self::shutdown`]
    /// would have returned.
    pub async fn shutdown_with_timeout(&self, timeout: std::time::Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.shutdown()).await {
            Ok(result) => result,
            Err(_) => Err(EventlineError::transient("shutdown timed out; broker continues draining")),
        }
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_loop(mut commands: mpsc::Receiver<Command>, mut replayer: Option<Box<dyn Replayer>>) {
    debug!(target: constants::identity::LIBRARY_NAME, "broker loop running");
    let mut subscribers: HashMap<u64, SubscriberEntry> = HashMap::new();
    let mut next_id: u64 = 0;

    while let Some(cmd) = commands.recv().await {
        match cmd {
            Command::Publish {
                event,
                topics,
                reply,
            } => {
                let result = handle_publish(&mut replayer, &mut subscribers, event, &topics).await;
                let _ = reply.send(result);
            }
            Command::Subscribe {
                mut subscription,
                reply,
            } => {
                let replay_result = guarded_replay(replayer.as_deref_mut(), &mut subscription).await;
                match replay_result {
                    Ok(()) => {
                        let id = next_id;
                        next_id += 1;
                        let (done_tx, done_rx) = oneshot::channel();
                        subscribers.insert(
                            id,
                            SubscriberEntry {
                                subscription,
                                done: Some(done_tx),
                            },
                        );
                        let _ = reply.send(Ok(done_rx));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            Command::Shutdown { reply } => {
                debug!(target: constants::identity::LIBRARY_NAME, count = subscribers.len(), "broker draining");
                for (_, mut entry) in subscribers.drain() {
                    if let Some(done) = entry.done.take() {
                        let _ = done.send(Err(EventlineError::ProviderClosed));
                    }
                }
                let _ = reply.send(Ok(()));
                break;
            }
        }
    }
    debug!(target: constants::identity::LIBRARY_NAME, "broker loop terminated");
}

async fn handle_publish(
    replayer: &mut Option<Box<dyn Replayer>>,
    subscribers: &mut HashMap<u64, SubscriberEntry>,
    event: Event,
    topics: &[Topic],
) -> Result<()> {
    let delivered = if let Some(store) = replayer.as_mut() {
        match std::panic::catch_unwind(AssertUnwindSafe(|| store.put(event.clone(), topics))) {
            Ok(Ok(stored)) => stored,
            Ok(Err(e)) => return Err(e),
            Err(_panic) => {
                warn!(target: constants::identity::LIBRARY_NAME, "replay store panicked on put; delivering unmodified");
                event
            }
        }
    } else {
        event
    };

    let mut dead = Vec::new();
    for (id, entry) in subscribers.iter_mut() {
        if !entry.subscription.matches(topics) {
            continue;
        }
        if let Err(e) = guarded_send(&mut entry.subscription, &delivered).await {
            dead.push((*id, e));
        }
    }

    for (id, err) in dead {
        if let Some(mut entry) = subscribers.remove(&id) {
            if let Some(done) = entry.done.take() {
                let _ = done.send(Err(err));
            }
        }
    }

    Ok(())
}

async fn guarded_replay(replayer: Option<&mut (dyn Replayer)>, subscription: &mut Subscription) -> Result<()> {
    let Some(replayer) = replayer else {
        return Ok(());
    };
    match AssertUnwindSafe(replayer.replay(subscription)).catch_unwind().await {
        Ok(result) => result,
        Err(_panic) => {
            warn!(target: constants::identity::LIBRARY_NAME, "replay panicked; subscriber rejected");
            Err(EventlineError::transient("replay panicked"))
        }
    }
}

async fn guarded_send(subscription: &mut Subscription, event: &Event) -> Result<()> {
    let send_result = match AssertUnwindSafe(subscription.send(event)).catch_unwind().await {
        Ok(result) => result,
        Err(_panic) => Err(EventlineError::transient("subscriber send panicked")),
    };
    send_result?;

    match AssertUnwindSafe(subscription.flush()).catch_unwind().await {
        Ok(result) => result,
        Err(_panic) => Err(EventlineError::transient("subscriber flush panicked")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::FiniteReplayer;
    use crate::subscription::VecSink;
    use std::collections::HashSet;

    fn subscription_with(sink: VecSink, topics: &[&str]) -> Subscription {
        let set: HashSet<Topic> = topics.iter().map(|s| (*s).to_owned()).collect();
        Subscription::new(Box::new(sink), set)
    }

    #[tokio::test]
    async fn publish_requires_a_topic() {
        let broker = Broker::new();
        let err = broker.publish(Event::builder().data("x").build(), vec![]).await.unwrap_err();
        assert!(matches!(err, EventlineError::NoTopic));
    }

    #[tokio::test]
    async fn scenario_s3_broker_fan_out() {
        let broker = Broker::new();
        let sink_a = VecSink::new();
        let sink_b = VecSink::new();

        let (handle_a, token_a) = CancelHandle::new();
        let (handle_b, token_b) = CancelHandle::new();

        let broker_a = broker.clone();
        let sub_a = subscription_with(sink_a.clone(), &["default"]);
        let task_a = tokio::spawn(async move { broker_a.subscribe(sub_a, token_a).await });

        let broker_b = broker.clone();
        let sub_b = subscription_with(sink_b.clone(), &["t"]);
        let task_b = tokio::spawn(async move { broker_b.subscribe(sub_b, token_b).await });

        tokio::task::yield_now().await;

        broker
            .publish(Event::builder().data("e1").build(), vec!["default".to_owned()])
            .await
            .unwrap();
        broker
            .publish(
                Event::builder().data("e2").build(),
                vec!["default".to_owned(), "t".to_owned()],
            )
            .await
            .unwrap();

        tokio::task::yield_now().await;

        assert_eq!(sink_a.received().len(), 2);
        assert_eq!(sink_b.received().len(), 1);

        broker.shutdown().await.unwrap();
        assert!(task_a.await.unwrap().is_err());
        assert!(task_b.await.unwrap().is_err());
        handle_a.cancel();
        handle_b.cancel();
    }

    #[tokio::test]
    async fn shutdown_then_publish_is_provider_closed() {
        let broker = Broker::new();
        broker.shutdown().await.unwrap();
        let err = broker
            .publish(Event::builder().data("x").build(), vec!["default".to_owned()])
            .await
            .unwrap_err();
        assert!(matches!(err, EventlineError::ProviderClosed));
    }

    #[tokio::test]
    async fn second_shutdown_is_provider_closed() {
        let broker = Broker::new();
        broker.shutdown().await.unwrap();
        assert!(matches!(broker.shutdown().await, Err(EventlineError::ProviderClosed)));
    }

    #[tokio::test]
    async fn slow_subscriber_is_dropped_after_send_error() {
        let broker = Broker::new();
        let sink = VecSink::new();
        sink.fail_next_send(EventlineError::transient("boom"));

        let (_handle, token) = CancelHandle::new();
        let sub = subscription_with(sink.clone(), &["default"]);
        let broker_task = broker.clone();
        let task = tokio::spawn(async move { broker_task.subscribe(sub, token).await });
        tokio::task::yield_now().await;

        broker
            .publish(Event::builder().data("e1").build(), vec!["default".to_owned()])
            .await
            .unwrap();

        let result = task.await.unwrap();
        assert!(result.is_err());
        assert_eq!(sink.received().len(), 0);
    }

    #[tokio::test]
    async fn subscribe_replays_history_from_finite_store() {
        let broker = Broker::with_replayer(Some(Box::new(FiniteReplayer::new(4, true))));
        broker
            .publish(Event::builder().data("a").build(), vec!["default".to_owned()])
            .await
            .unwrap();
        broker
            .publish(Event::builder().data("b").build(), vec!["default".to_owned()])
            .await
            .unwrap();

        let sink = VecSink::new();
        let sub = Subscription::new(Box::new(sink.clone()), ["default".to_owned()].into())
            .with_last_event_id("0");
        let (handle, token) = CancelHandle::new();
        let broker2 = broker.clone();
        let task = tokio::spawn(async move { broker2.subscribe(sub, token).await });
        tokio::task::yield_now().await;

        let received = sink.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].id(), Some("1"));

        handle.cancel();
        assert!(task.await.unwrap().is_ok());
    }
}
