//! # Event subscriber trait.
//!
//! [`Subscribe`] receives events from a [`Bus`](crate::events::Bus) via a
//! dedicated listener task, so slow handlers never block publishers.
//!
//! ## Rules
//! - `on_event` runs on the listener task, not in the publisher's context
//! - Events arrive in publish order; a lagging subscriber skips the missed ones
//! - Handle errors internally, do not panic

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for runtime observability.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    async fn on_event(&self, event: &Event);
}
