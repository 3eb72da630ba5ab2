//! # Runner abstraction: the user-supplied worker body.
//!
//! Defines the core [`Runner`] trait for the blocking worker bodies the pool
//! spawns.
//!
//! - **[`Runner`]** — trait for implementing worker bodies
//! - **[`RunnerRef`]** — shared handle (`Arc<dyn Runner>`) for passing runners to the pool
//! - **[`RunnerFn`]** — function-backed implementation wrapping a closure
//! - **[`BoxRunnerFuture`]** — type alias for boxed runner futures
//!
//! ## Rules
//! - [`Runner::run`] must block while consuming its own work source.
//! - Each unit of work must go through [`Reporter::work`](crate::Reporter::work);
//!   when nothing is available, call [`Reporter::no_work`](crate::Reporter::no_work).
//! - The runner **must** return promptly once a stop token is receivable
//!   from its [`StopListener`]. A runner that never consults the stopper
//!   wedges [`WorkerPool::settle`](crate::WorkerPool::settle); that is the
//!   runner's bug, not the pool's.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::pool::StopListener;
use crate::report::Reporter;

/// Boxed future returned by [`Runner::run`].
pub type BoxRunnerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Shared handle to a runner object.
///
/// One runner instance serves the whole pool; every spawned worker invokes
/// [`Runner::run`] on the same shared value, so per-worker state belongs
/// inside the returned future.
pub type RunnerRef = Arc<dyn Runner>;

/// A worker body: loops consuming work, returns when told to stop.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use poolvisor::{Reporter, Runner, BoxRunnerFuture, StopListener};
///
/// struct Echo;
///
/// impl Runner for Echo {
///     fn run(&self, stopper: StopListener, reporter: Arc<dyn Reporter>) -> BoxRunnerFuture {
///         Box::pin(async move {
///             loop {
///                 tokio::select! {
///                     _ = stopper.recv() => return,
///                     _ = reporter.work(Box::pin(async { Ok(()) })) => {}
///                 }
///             }
///         })
///     }
/// }
/// ```
pub trait Runner: Send + Sync + 'static {
    /// Creates a new future that consumes work until a stop token arrives.
    ///
    /// ### Stop requirements
    /// - The returned future **must** mix `stopper` into its own select and
    ///   exit promptly when a token is receivable.
    /// - Stop tokens are fungible: consuming one token stops one worker,
    ///   whichever observes it first.
    fn run(&self, stopper: StopListener, reporter: Arc<dyn Reporter>) -> BoxRunnerFuture;
}

/// Function-backed runner implementation.
///
/// Wraps a closure that *creates* a new future per spawned worker. Workers
/// are anonymous and fungible, so unlike named task abstractions there is
/// nothing to identify a particular instance by.
pub struct RunnerFn<F> {
    f: F,
}

impl<F> RunnerFn<F> {
    /// Creates a new function-backed runner.
    ///
    /// Prefer [`RunnerFn::arc`] when you immediately need a [`RunnerRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the runner and returns it as a shared handle.
    ///
    /// ## Example
    /// ```rust
    /// use std::sync::Arc;
    /// use poolvisor::{Reporter, RunnerFn, RunnerRef, StopListener};
    ///
    /// let r: RunnerRef = RunnerFn::arc(|stopper: StopListener, _reporter: Arc<dyn Reporter>| {
    ///     async move {
    ///         stopper.recv().await;
    ///     }
    /// });
    /// ```
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut> Runner for RunnerFn<F>
where
    F: Fn(StopListener, Arc<dyn Reporter>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn run(&self, stopper: StopListener, reporter: Arc<dyn Reporter>) -> BoxRunnerFuture {
        Box::pin((self.f)(stopper, reporter))
    }
}
