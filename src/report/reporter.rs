//! # Reporter capability.
//!
//! A [`Reporter`] is handed to every [`Runner`](crate::Runner). The runner
//! wraps each unit of work in [`Reporter::work`] so its latency and outcome
//! feed the control loop, and calls [`Reporter::no_work`] when its work
//! source is momentarily empty.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::WorkError;

/// Boxed future for a single unit of work.
///
/// The unit's `Err` is recorded on the emitted
/// [`Execution`](crate::Execution); it is never returned to the caller.
pub type BoxWorkFuture = Pin<Box<dyn Future<Output = Result<(), WorkError>> + Send + 'static>>;

/// Receives feedback from workers about latencies, errors, and idleness.
///
/// ## Rules
/// - [`work`](Reporter::work) never fails: unit failures are captured in the
///   execution record, and an abnormal abort (panic, cancellation) must
///   still decrement the in-flight gauge before propagating.
/// - [`no_work`](Reporter::no_work) must never block; if nobody is
///   listening the signal is dropped.
#[async_trait]
pub trait Reporter: Send + Sync + 'static {
    /// Executes `unit`, measures its round-trip time, and reports the
    /// outcome together with a snapshot of the in-flight gauge.
    async fn work(&self, unit: BoxWorkFuture);

    /// Signals that no work was available right now.
    fn no_work(&self);
}
