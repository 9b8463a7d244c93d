// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Ordered fan-out of events to subscribers on any thread.
//!
//! The subscriber set is a copy-on-write list behind an [`ArcSwap`]: publish
//! loads one snapshot and walks it, subscribe and unsubscribe swap in a new
//! list. Publishing never takes a lock, so the engine worker can publish
//! without ever waiting on a subscriber thread.
//!
//! Delivery guarantees, per subscription:
//! * events arrive in publish order
//! * each event arrives at most once
//! * events published before the subscription was registered never arrive

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::mpsc;

use crate::engine::devices::DeviceSelection;
use crate::engine::surface::PixelBuffer;
use crate::errors::WorkloadError;
use crate::traits::workload::{LifecycleStatus, WorkloadEvent};

/// Notifications published by the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A device selection was resolved and applied.
    DeviceChanged(DeviceSelection),
    /// A workload was started and now occupies the slot.
    WorkloadSelected(String),
    /// The viewport was replaced; `buffer` is the new output buffer.
    SizeChanged {
        width: u32,
        height: u32,
        buffer: Arc<PixelBuffer>,
    },
    WorkloadLifecycle {
        status: LifecycleStatus,
        progress: f64,
        message: String,
    },
    WorkloadError(Arc<WorkloadError>),
    /// A render tick finished and was paced; `buffer` holds the new frame.
    BufferReady {
        frame_time: Duration,
        buffer: Arc<PixelBuffer>,
    },
}

impl From<WorkloadEvent> for EngineEvent {
    fn from(event: WorkloadEvent) -> Self {
        match event {
            WorkloadEvent::Lifecycle {
                status,
                progress,
                message,
            } => EngineEvent::WorkloadLifecycle {
                status,
                progress,
                message,
            },
            WorkloadEvent::Error(cause) => EngineEvent::WorkloadError(cause),
        }
    }
}

/// Returns `false` once the subscriber is gone, which prunes it.
type Sink<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

struct Subscriber<E> {
    id: u64,
    sink: Sink<E>,
}

impl<E> Clone for Subscriber<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            sink: Arc::clone(&self.sink),
        }
    }
}

struct BusInner<E> {
    subscribers: ArcSwap<Vec<Subscriber<E>>>,
    next_id: AtomicU64,
}

impl<E> BusInner<E> {
    fn push(&self, subscriber: Subscriber<E>) {
        self.subscribers.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(subscriber.clone());
            next
        });
    }
}

trait Unsubscribe: Send + Sync {
    fn remove(&self, id: u64);
}

impl<E: 'static> Unsubscribe for BusInner<E> {
    fn remove(&self, id: u64) {
        self.subscribers.rcu(|current| {
            current
                .iter()
                .filter(|subscriber| subscriber.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });
    }
}

/// A cloneable handle to a shared subscriber set.
pub struct EventBus<E> {
    inner: Arc<BusInner<E>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Clone + Send + 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send + 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: ArcSwap::from_pointee(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Deliver `event` to every current subscriber, returning how many took it.
    pub fn publish(&self, event: E) -> usize {
        let snapshot = self.inner.subscribers.load_full();
        let mut delivered = 0usize;
        let mut stale = Vec::new();

        for subscriber in snapshot.iter() {
            let sink = &subscriber.sink;
            // A panicking sink is treated like a closed one.
            match panic::catch_unwind(AssertUnwindSafe(|| sink(&event))) {
                Ok(true) => delivered += 1,
                Ok(false) | Err(_) => stale.push(subscriber.id),
            }
        }

        for id in stale {
            self.inner.remove(id);
        }

        delivered
    }

    /// Subscribe with a channel; events are buffered until received.
    pub fn subscribe(&self) -> EventStream<E> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscription = self.subscribe_with(move |event: &E| sender.send(event.clone()).is_ok());
        EventStream {
            receiver,
            subscription,
        }
    }

    /// Subscribe with a callback invoked on the publishing thread.
    ///
    /// The callback returns `false` to be dropped from the bus. Callbacks run
    /// inline on the engine worker, so only crate code registers them;
    /// everyone else gets a channel through [`subscribe`](Self::subscribe).
    pub(crate) fn subscribe_with<F>(&self, sink: F) -> Subscription
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.push(Subscriber {
            id,
            sink: Arc::new(sink),
        });

        let bus: Arc<dyn Unsubscribe> = self.inner.clone();
        Subscription {
            id,
            bus: Some(Arc::downgrade(&bus)),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.load().len()
    }
}

/// Keeps a subscription registered; unsubscribes when dropped.
pub struct Subscription {
    id: u64,
    bus: Option<Weak<dyn Unsubscribe>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release();
    }

    pub fn is_active(&self) -> bool {
        self.bus.as_ref().is_some_and(|bus| bus.strong_count() > 0)
    }

    fn release(&mut self) {
        if let Some(bus) = self.bus.take().and_then(|weak| weak.upgrade()) {
            bus.remove(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// A channel-backed subscription.
pub struct EventStream<E> {
    receiver: mpsc::UnboundedReceiver<E>,
    subscription: Subscription,
}

impl<E> EventStream<E> {
    /// Wait for the next event; `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<E> {
        self.receiver.recv().await
    }

    /// Blocking variant of [`recv`](Self::recv) for non-async threads.
    ///
    /// Panics if called from within an async runtime.
    pub fn blocking_recv(&mut self) -> Option<E> {
        self.receiver.blocking_recv()
    }

    pub fn try_recv(&mut self) -> Option<E> {
        self.receiver.try_recv().ok()
    }

    /// Take everything buffered so far.
    pub fn drain(&mut self) -> Vec<E> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn unsubscribe(self) {
        self.subscription.unsubscribe();
    }
}
