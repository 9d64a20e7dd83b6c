//! Observer registration with explicit unsubscribe handles.
//!
//! - `Arc<Mutex<Vec<..>>>` holds the subscriber list shared by all clones
//! - each subscriber gets its own unbounded `mpsc` channel
//! - a [`Subscription`] removes itself from the list when unsubscribed or dropped

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

type Subscribers<T> = Mutex<Vec<(u64, UnboundedSender<T>)>>;

/// A value source observers can subscribe to.
///
/// Clones share the same subscriber list.
pub struct Observable<T> {
    subscribers: Arc<Subscribers<T>>,
    next_id: Arc<AtomicU64>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<T> Default for Observable<T> {
    fn default() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<T: Clone> Observable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new observer.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push((id, tx));
        }

        Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.subscribers),
        }
    }

    /// Delivers `value` to every live observer, returning how many got it.
    pub fn emit(&self, value: T) -> usize {
        match self.subscribers.lock() {
            Ok(mut subs) => {
                subs.retain(|(_, tx)| tx.send(value.clone()).is_ok());
                subs.len()
            }
            Err(_) => 0,
        }
    }

    /// Number of registered observers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

/// Receiving end of one observer registration.
///
/// Doubles as a lazy, unbounded [`Stream`] of observed values. The stream
/// ends once the [`Observable`] and all its clones are dropped.
pub struct Subscription<T> {
    id: u64,
    rx: UnboundedReceiver<T>,
    registry: Weak<Subscribers<T>>,
}

impl<T> Subscription<T> {
    /// Waits for the next value.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Returns an already delivered value without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Removes this observer. Equivalent to dropping the subscription.
    pub fn unsubscribe(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(subscribers) = self.registry.upgrade() {
            if let Ok(mut subs) = subscribers.lock() {
                subs.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
