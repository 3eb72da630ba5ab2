//! # Gradient controller: the closed control loop.
//!
//! [`GradientController`] consumes execution reports from a
//! [`Notifier`](crate::Notifier), computes new concurrency limits with a
//! gradient estimator, and drives a [`WorkerPool`](crate::WorkerPool) to
//! them.

mod core;
mod estimator;

pub use self::core::GradientController;
