//! In-process publish/subscribe bus.
//!
//! Topics are created on first use. Delivery is fire-and-forget: `publish`
//! never waits, a subscriber whose queue is full misses the message, and a
//! subscriber whose receiver was dropped is pruned. Latched topics keep the
//! last payload and hand it to every new subscriber.

#[cfg(test)]
#[path = "bus_test.rs"]
mod bus_test;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use crate::transport::TransportError;

#[derive(Default)]
struct Topic {
    latched: bool,
    last: Option<Vec<u8>>,
    subscribers: Vec<mpsc::Sender<Vec<u8>>>,
}

#[derive(Default)]
struct BusState {
    topics: HashMap<String, Topic>,
    closed: bool,
}

/// Cloneable handle to a shared bus.
#[derive(Clone)]
pub struct Bus {
    state: Arc<Mutex<BusState>>,
    capacity: usize,
}

impl Bus {
    /// Create a bus whose subscribers each buffer up to `capacity` messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { state: Arc::new(Mutex::new(BusState::default())), capacity: capacity.max(1) }
    }

    /// Mark `topic` as latched: its last payload is replayed to new subscribers.
    pub fn declare_latched(&self, topic: &str) {
        let mut state = self.lock();
        state.topics.entry(topic.to_owned()).or_default().latched = true;
    }

    /// Subscribe to `topic`. A latched topic's last payload is queued first.
    #[must_use]
    pub fn subscribe(&self, topic: &str) -> mpsc::Receiver<Vec<u8>> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut state = self.lock();
        let entry = state.topics.entry(topic.to_owned()).or_default();
        if let Some(last) = &entry.last {
            if tx.try_send(last.clone()).is_err() {
                debug!(topic, "latched replay dropped");
            }
        }
        entry.subscribers.push(tx);
        rx
    }

    /// Deliver `payload` to every live subscriber of `topic`.
    ///
    /// Returns the number of subscribers that received it.
    ///
    /// # Errors
    ///
    /// [`TransportError::Closed`] once the bus is closed, and
    /// [`TransportError::QueueFull`] when at least one subscriber had no room.
    /// Subscribers with room still receive the payload in the latter case.
    pub fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<usize, TransportError> {
        let mut state = self.lock();
        if state.closed {
            return Err(TransportError::Closed { topic: topic.to_owned() });
        }
        let entry = state.topics.entry(topic.to_owned()).or_default();

        let mut delivered = 0;
        let mut full = false;
        entry.subscribers.retain(|tx| match tx.try_send(payload.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                full = true;
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
        if entry.latched {
            entry.last = Some(payload);
        }

        if full {
            return Err(TransportError::QueueFull { topic: topic.to_owned() });
        }
        Ok(delivered)
    }

    /// Stop accepting publishes and drop every subscriber sender.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        for topic in state.topics.values_mut() {
            topic.subscribers.clear();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
