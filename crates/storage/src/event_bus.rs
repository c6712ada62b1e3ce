// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bounded, drop-oldest event bus (spec §4.B).
//!
//! `tokio::sync::broadcast` was considered and rejected (see
//! `DESIGN.md`'s Open Question 3): its lagging-receiver semantics drop
//! a contiguous prefix and report a *count* of lost messages, which
//! does not match the spec's requirement that a full queue silently
//! drops only the single oldest pending entry on each publish. A
//! hand-rolled ring buffer behind a `parking_lot::Mutex` plus a
//! `tokio::sync::Notify` gives that exact behavior.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use agent_hub_core::Envelope;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Default per-subscriber queue capacity (spec §4.B: "order-of 512").
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 512;

struct Inner {
    capacity: usize,
    queue: Mutex<VecDeque<Option<Envelope>>>,
    notify: Notify,
}

/// A single subscriber's bounded queue handle. Cloning shares the same
/// underlying queue (cheap `Arc` clone), matching how the facade hands
/// a subscriber handle to both the publishing side and the websocket
/// send loop.
#[derive(Clone)]
pub struct EventSubscriber {
    inner: Arc<Inner>,
}

impl EventSubscriber {
    fn new(capacity: usize) -> Self {
        Self { inner: Arc::new(Inner { capacity, queue: Mutex::new(VecDeque::new()), notify: Notify::new() }) }
    }

    /// Push an envelope, dropping the oldest pending entry first if the
    /// queue is already at capacity.
    fn push(&self, envelope: Option<Envelope>) {
        let mut queue = self.inner.queue.lock();
        if queue.len() >= self.inner.capacity {
            queue.pop_front();
        }
        queue.push_back(envelope);
        drop(queue);
        self.inner.notify.notify_one();
    }

    /// Await and return the next event, or `None` once the subscriber
    /// has been closed (the `None` sentinel, per spec §4.B) and drained.
    pub async fn recv(&self) -> Option<Envelope> {
        loop {
            if let Some(item) = self.inner.queue.lock().pop_front() {
                return item;
            }
            self.inner.notify.notified().await;
        }
    }

    /// Non-blocking drain of everything currently queued, preserving
    /// publication order. Used by tests asserting ordering (I9).
    pub fn drain(&self) -> Vec<Envelope> {
        let mut queue = self.inner.queue.lock();
        let mut out = Vec::with_capacity(queue.len());
        while let Some(Some(envelope)) = queue.pop_front() {
            out.push(envelope);
        }
        out
    }
}

/// Fan-out bus: each `subscribe()` call registers a new bounded queue;
/// `publish()` snapshots the listener list and pushes to every queue
/// without holding any state-document lock (spec §5's lock-ordering
/// rule: listener fan-out never blocks writers).
pub struct EventBus {
    subscribers: Mutex<Vec<EventSubscriber>>,
    capacity: usize,
    published: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self { subscribers: Mutex::new(Vec::new()), capacity, published: AtomicU64::new(0) }
    }

    /// Register a new subscriber. The caller is responsible for sending
    /// an initial `snapshot` envelope before streaming live events.
    pub fn subscribe(&self) -> EventSubscriber {
        let subscriber = EventSubscriber::new(self.capacity);
        self.subscribers.lock().push(subscriber.clone());
        subscriber
    }

    /// Drop a subscriber from the fan-out list (called on websocket
    /// disconnect so publishers stop wasting work on a dead queue).
    pub fn unsubscribe(&self, subscriber: &EventSubscriber) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|s| !Arc::ptr_eq(&s.inner, &subscriber.inner));
    }

    /// Publish an envelope to every currently registered subscriber.
    pub fn publish(&self, envelope: Envelope) {
        let snapshot: Vec<EventSubscriber> = self.subscribers.lock().clone();
        self.published.fetch_add(1, Ordering::Relaxed);
        for subscriber in &snapshot {
            subscriber.push(Some(envelope.clone()));
        }
    }

    /// Close every subscriber by pushing the `None` sentinel.
    pub fn close_all(&self) {
        let snapshot: Vec<EventSubscriber> = self.subscribers.lock().clone();
        for subscriber in &snapshot {
            subscriber.push(None);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Total envelopes published over this bus's lifetime (diagnostics).
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
