//! # Stop-token stream.
//!
//! The pool is the only producer of stop tokens; every worker holds a
//! [`StopListener`]. Tokens are fungible: any worker may consume any token,
//! and consuming one stops exactly one worker.
//!
//! Tokens are semaphore permits. Delivery never blocks the producer, and a
//! token posted before any worker is listening is simply consumed by the
//! next worker that asks.

use std::sync::Arc;

use tokio::sync::{Semaphore, TryAcquireError};

/// Worker-side receiver for stop tokens.
#[derive(Clone)]
pub struct StopListener {
    permits: Arc<Semaphore>,
}

impl StopListener {
    pub(crate) fn new(permits: Arc<Semaphore>) -> Self {
        Self { permits }
    }

    /// Waits until a stop token is available and consumes it.
    ///
    /// Mix this into the runner's select loop; when it completes, the
    /// runner must return.
    pub async fn recv(&self) {
        match self.permits.acquire().await {
            Ok(permit) => permit.forget(),
            // A closed stream is a global stop.
            Err(_) => {}
        }
    }

    /// Consumes a stop token if one is immediately available.
    ///
    /// Returns `true` when the runner should stop.
    pub fn try_recv(&self) -> bool {
        match self.permits.try_acquire() {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(TryAcquireError::NoPermits) => false,
            Err(TryAcquireError::Closed) => true,
        }
    }
}
