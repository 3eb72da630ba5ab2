//! # poolvisor
//!
//! **Poolvisor** is an adaptive concurrency controller for worker pools.
//!
//! Given a worker body whose latency degrades when over-subscribed, the
//! controller continuously adjusts the number of concurrently running
//! workers to sit near the knee of the latency/throughput curve: enough
//! parallelism to saturate the downstream, not so much that queueing
//! inflates end-to-end response time.
//!
//! ## Features
//!
//! | Area            | Description                                                       | Key types / traits                        |
//! |-----------------|-------------------------------------------------------------------|-------------------------------------------|
//! | **Runners**     | Supply the worker body that consumes your work source.            | [`Runner`], [`RunnerFn`], [`StopListener`]|
//! | **Reporting**   | Feed per-unit latency/error outcomes back, without blocking.      | [`Reporter`], [`NonBlockingReporter`]     |
//! | **Pool**        | Spawn and converge workers toward a target count.                 | [`WorkerPool`], [`PoolMetrics`]           |
//! | **Control**     | Gradient-based limit estimation with probing and backoff.         | [`GradientController`], [`ControllerConfig`] |
//! | **Observability** | Hook into limit changes, probes, and backpressure drops.        | [`events::Bus`], [`Subscribe`]            |
//! | **Errors**      | Typed errors for configuration, settling, and work units.         | [`ConfigError`], [`SettleError`], [`WorkError`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in `LogWriter` subscriber _(demo/reference only)_.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use poolvisor::{
//!     ControllerConfig, GradientController, NonBlockingReporter, Reporter, RunnerFn,
//!     StopListener, WorkerPool,
//! };
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (reporter, notifier) = NonBlockingReporter::channel(8);
//!
//!     // The worker body: consume your own work source, report each unit,
//!     // and exit when a stop token arrives.
//!     let runner = RunnerFn::arc(|stopper: StopListener, reporter: Arc<dyn Reporter>| {
//!         async move {
//!             loop {
//!                 tokio::select! {
//!                     _ = stopper.recv() => return,
//!                     _ = reporter.work(Box::pin(async {
//!                         // fetch and handle one unit of work here
//!                         Ok(())
//!                     })) => {}
//!                 }
//!             }
//!         }
//!     });
//!
//!     let pool = WorkerPool::new(runner, reporter.clone());
//!     let mut controller =
//!         GradientController::new(notifier, pool, ControllerConfig::default())?;
//!
//!     controller.start();
//!     // ... let it run ...
//!     controller.stop(&CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ---

mod config;
mod controller;
mod error;
mod pool;
mod report;
mod runner;

pub mod events;
pub mod subscribers;

// ---- Public re-exports ----

pub use config::{ControllerConfig, DEFAULT_MAX_CONCURRENCY, QueueSizeFn, sqrt_queue};
pub use controller::GradientController;
pub use error::{ConfigError, SettleError, WorkError};
pub use pool::{NoopMetrics, PoolMetrics, StopListener, WorkerPool, WorkerPoolBuilder};
pub use report::{BoxWorkFuture, Execution, NonBlockingReporter, Notifier, Reporter};
pub use runner::{BoxRunnerFuture, Runner, RunnerFn, RunnerRef};
pub use subscribers::Subscribe;

// Optional: expose a simple built-in logging subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
