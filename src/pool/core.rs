//! # Worker pool.
//!
//! [`WorkerPool`] keeps track of the workers currently running. It starts
//! and stops them, and lets callers wait for the running count to converge
//! on the target.
//!
//! # High-level architecture
//!
//! ```text
//!           incr(n) / decr(n)
//!                 │
//!                 ▼
//!  wanted_n ──► stop tokens / spawns ──► workers (Runner::run)
//!                                           │ exit guard
//!                                           ▼
//!                          actual_n (watch) ──► settle(ctx)
//! ```
//!
//! - `wanted_n` has a single writer (the control loop); readers tolerate
//!   staleness and take no lock.
//! - `actual_n` lives in a watch channel; [`WorkerPool::settle`] waits on it
//!   until it matches `wanted_n` or the caller's token fires.
//! - Workers consume fungible stop tokens; the pool never chooses which
//!   worker terminates.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Semaphore, watch};
use tokio_util::sync::CancellationToken;

use crate::error::SettleError;
use crate::events::{Bus, Event, EventKind};
use crate::pool::metrics::{NoopMetrics, PoolMetrics};
use crate::pool::stop::StopListener;
use crate::report::Reporter;
use crate::runner::RunnerRef;

/// Tracks and drives the set of running workers.
///
/// A pool starts with `wanted_n = 0` and no workers running. Cloning is
/// cheap and shares the same pool.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    runner: RunnerRef,
    reporter: Arc<dyn Reporter>,
    metrics: Arc<dyn PoolMetrics>,
    bus: Option<Bus>,

    /// Stop tokens. Sole producer: `decr`. Consumers: workers.
    stop: Arc<Semaphore>,

    /// Desired number of workers. Written only by the control loop;
    /// read without synchronization everywhere else.
    wanted: AtomicUsize,

    /// Number of workers currently running.
    actual: watch::Sender<usize>,
}

impl WorkerPool {
    /// Creates a pool with default collaborators.
    pub fn new(runner: RunnerRef, reporter: Arc<dyn Reporter>) -> Self {
        Self::builder(runner, reporter).build()
    }

    /// Starts building a pool with optional metrics and bus.
    pub fn builder(runner: RunnerRef, reporter: Arc<dyn Reporter>) -> WorkerPoolBuilder {
        WorkerPoolBuilder {
            runner,
            reporter,
            metrics: Arc::new(NoopMetrics),
            bus: None,
        }
    }

    /// Number of workers currently running.
    pub fn actual_n(&self) -> usize {
        *self.inner.actual.borrow()
    }

    /// Number of workers we want running.
    ///
    /// May lag behind a concurrent adjustment; the single-writer discipline
    /// makes that staleness harmless.
    pub fn wanted_n(&self) -> usize {
        self.inner.wanted.load(Ordering::Relaxed)
    }

    /// Raises the target by `n` and spawns `n` workers.
    ///
    /// `actual_n` is raised optimistically before the workers exist; call
    /// [`WorkerPool::settle`] to wait for convergence after later removals.
    pub fn incr(&self, n: usize) {
        if n == 0 {
            return;
        }
        self.inner.wanted.fetch_add(n, Ordering::Relaxed);
        self.inner.actual.send_modify(|actual| *actual += n);
        for _ in 0..n {
            self.spawn_worker();
        }
        self.inner.metrics.incr(n);
    }

    /// Lowers the target by `n` (saturating at 0) and posts `n` stop
    /// tokens. Up to `n` workers will terminate; the pool does not choose
    /// which. They stop asynchronously; call [`WorkerPool::settle`] to wait.
    pub fn decr(&self, n: usize) {
        if n == 0 {
            return;
        }
        let _ = self
            .inner
            .wanted
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |wanted| {
                Some(wanted.saturating_sub(n))
            });
        self.inner.stop.add_permits(n);
        self.inner.metrics.decr(n);
    }

    /// Blocks until `actual_n == wanted_n`, or until `ctx` is cancelled.
    ///
    /// On cancellation the pool may still be converging; the remaining
    /// workers keep honouring their stop tokens.
    pub async fn settle(&self, ctx: &CancellationToken) -> Result<(), SettleError> {
        let mut rx = self.inner.actual.subscribe();
        tokio::select! {
            _ = ctx.cancelled() => Err(SettleError::Cancelled),
            res = rx.wait_for(|&actual| actual == self.inner.wanted.load(Ordering::Relaxed)) => {
                res.map(|_| ()).map_err(|_| SettleError::Cancelled)
            }
        }
    }

    pub(crate) fn note_restart(&self) {
        self.inner.metrics.restart();
    }

    fn spawn_worker(&self) {
        let inner = self.inner.clone();
        if let Some(bus) = &inner.bus {
            bus.publish(Event::now(EventKind::WorkerSpawned));
        }
        tokio::spawn(async move {
            let stopper = StopListener::new(inner.stop.clone());
            let reporter = inner.reporter.clone();
            // The guard decrements `actual_n` and broadcasts on every exit
            // path, including a panicking runner.
            let _guard = WorkerExitGuard {
                inner: inner.clone(),
            };
            inner.runner.run(stopper, reporter).await;
        });
    }
}

/// Builder for [`WorkerPool`].
pub struct WorkerPoolBuilder {
    runner: RunnerRef,
    reporter: Arc<dyn Reporter>,
    metrics: Arc<dyn PoolMetrics>,
    bus: Option<Bus>,
}

impl WorkerPoolBuilder {
    /// Sets the metrics hook invoked on pool-size changes.
    pub fn metrics(mut self, metrics: Arc<dyn PoolMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Publishes worker lifecycle events to `bus`.
    pub fn bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds the pool with `wanted_n = 0` and no workers running.
    pub fn build(self) -> WorkerPool {
        let (actual, _) = watch::channel(0);
        WorkerPool {
            inner: Arc::new(PoolInner {
                runner: self.runner,
                reporter: self.reporter,
                metrics: self.metrics,
                bus: self.bus,
                stop: Arc::new(Semaphore::new(0)),
                wanted: AtomicUsize::new(0),
                actual,
            }),
        }
    }
}

struct WorkerExitGuard {
    inner: Arc<PoolInner>,
}

impl Drop for WorkerExitGuard {
    fn drop(&mut self) {
        self.inner.actual.send_modify(|actual| *actual -= 1);
        if let Some(bus) = &self.inner.bus {
            bus.publish(Event::now(EventKind::WorkerExited));
        }
    }
}
