//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a wrapper around [`tokio::sync::broadcast`] that lets the
//! controller, pool, and reporter broadcast [`Event`]s to any number of
//! subscribers.
//!
//! ## Key characteristics:
//! - **Broadcast semantics**: all active subscribers receive a clone of each event
//! - **Non-persistent**: events are lost if there are no active subscribers
//! - **Bounded capacity**: the oldest events are dropped when a subscriber lags
//! - **Never blocking**: publishers are never slowed by slow subscribers

use std::sync::Arc;

use tokio::sync::broadcast;

use super::event::Event;
use crate::subscribers::Subscribe;

/// Broadcast channel for runtime events.
#[derive(Clone)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// When a subscriber falls more than `capacity` events behind, the
    /// oldest events are dropped for that subscriber only.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes an event to all active subscribers.
    ///
    /// If there are no active subscribers the event is dropped silently;
    /// the system operates fine without observers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Spawns a dedicated listener task that feeds events to `subscriber`.
    ///
    /// A subscriber that lags skips the missed events and keeps going. The
    /// task exits when the bus is dropped.
    pub fn attach(&self, subscriber: Arc<dyn Subscribe>) {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => subscriber.on_event(&ev).await,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}
