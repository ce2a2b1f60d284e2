//! Fan-out of one event stream to any number of independent subscribers.
//!
//! Design:
//! - The registry lives inside an owning actor; only that actor touches it.
//! - Each subscriber gets its own unbounded channel, so a slow consumer
//!   suspends itself, never the producer or its siblings.
//! - Closed receivers are pruned on the next send.

use tokio::sync::mpsc;

pub struct Fanout<T> {
    subscribers: Vec<mpsc::UnboundedSender<T>>,
}

impl<T: Clone> Fanout<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register a subscriber that sees every event from this moment on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver one event to every live subscriber, in registration order.
    pub fn send(&mut self, event: &T) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<T: Clone> Default for Fanout<T> {
    fn default() -> Self {
        Self::new()
    }
}
