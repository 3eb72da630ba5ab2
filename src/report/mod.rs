//! # Feedback from workers to the controller.
//!
//! Workers report per-unit outcomes through a [`Reporter`]; the controller
//! consumes them through a [`Notifier`]. The canonical implementation,
//! [`NonBlockingReporter`], drops reports under backpressure rather than
//! stalling the hot path: the controller needs recent signals more than it
//! needs exhaustive ones.

mod execution;
mod nonblocking;
mod reporter;

pub use execution::Execution;
pub use nonblocking::{NonBlockingReporter, Notifier};
pub use reporter::{BoxWorkFuture, Reporter};
