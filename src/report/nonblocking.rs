//! # Non-blocking reporter and its consumer half.
//!
//! [`NonBlockingReporter`] carries feedback from workers to the controller
//! without introducing head-of-line blocking: both the execution stream and
//! the no-work stream drop on full. [`Notifier`] owns the receiving ends.
//!
//! # High-level architecture
//!
//! ```text
//!  workers ──► Reporter::work / no_work
//!                    │ try_send (drop on full)
//!                    ▼
//!          ┌──────────────────┐
//!          │ bounded channels │
//!          └────────┬─────────┘
//!                   ▼
//!           Notifier::next_report / next_no_work
//!                   ▼
//!             control loop
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use async_trait::async_trait;

use tokio::sync::mpsc;

use crate::events::{Bus, Event};
use crate::report::execution::Execution;
use crate::report::reporter::{BoxWorkFuture, Reporter};

/// Non-blocking [`Reporter`] backed by bounded channels.
///
/// Reports are delivered in the order they were enqueued; under
/// backpressure, reports are dropped rather than delaying the worker, and
/// the drop is counted (and published to the bus when one is wired).
pub struct NonBlockingReporter {
    executions: mpsc::Sender<Execution>,
    idle: mpsc::Sender<()>,
    in_flight: AtomicUsize,
    dropped: AtomicU64,
    bus: Option<Bus>,
}

impl NonBlockingReporter {
    /// Creates a reporter and its consumer half.
    ///
    /// `depth` is the execution-stream buffer size. It is clamped to at
    /// least 1 (tokio channels have no zero-capacity rendezvous mode).
    /// Increase it if you expect bursty traffic and want the controller to
    /// see more of it.
    pub fn channel(depth: usize) -> (Arc<Self>, Notifier) {
        Self::channel_with_bus(depth, None)
    }

    /// Like [`NonBlockingReporter::channel`], additionally publishing
    /// [`EventKind::ReportDropped`](crate::events::EventKind::ReportDropped)
    /// events to `bus` whenever backpressure drops a report.
    pub fn channel_with_bus(depth: usize, bus: Option<Bus>) -> (Arc<Self>, Notifier) {
        let (exec_tx, exec_rx) = mpsc::channel(depth.max(1));
        let (idle_tx, idle_rx) = mpsc::channel(1);
        let reporter = Arc::new(Self {
            executions: exec_tx,
            idle: idle_tx,
            in_flight: AtomicUsize::new(0),
            dropped: AtomicU64::new(0),
            bus,
        });
        let notifier = Notifier {
            executions: exec_rx,
            idle: idle_rx,
        };
        (reporter, notifier)
    }

    /// Number of units currently executing through this reporter.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Number of reports dropped under backpressure since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn note_drop(&self, stream: &'static str) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        if let Some(bus) = &self.bus {
            bus.publish(Event::report_dropped(stream));
        }
    }
}

#[async_trait]
impl Reporter for NonBlockingReporter {
    async fn work(&self, unit: BoxWorkFuture) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        // The guard decrements on every exit path: normal completion, a
        // panicking unit, or this future being dropped mid-poll. An
        // abnormal exit decrements without emitting a report.
        let guard = InFlightGuard {
            gauge: &self.in_flight,
            done: false,
        };
        let started = Instant::now();
        let result = unit.await;
        let in_flight = guard.complete();

        let report = Execution {
            in_flight,
            rtt: started.elapsed(),
            err: result.err(),
        };
        if self.executions.try_send(report).is_err() {
            self.note_drop("executions");
        }
    }

    fn no_work(&self) {
        if self.idle.try_send(()).is_err() {
            self.note_drop("no_work");
        }
    }
}

struct InFlightGuard<'a> {
    gauge: &'a AtomicUsize,
    done: bool,
}

impl InFlightGuard<'_> {
    /// Decrements the gauge and returns its value after the decrement,
    /// i.e. the number of other units still executing.
    fn complete(mut self) -> usize {
        self.done = true;
        self.gauge.fetch_sub(1, Ordering::Relaxed) - 1
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.gauge.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

/// Consumer half of a [`NonBlockingReporter`].
///
/// Exposes the two streams the control loop selects over. Delivered reports
/// preserve enqueue order; dropped reports are simply missing.
pub struct Notifier {
    pub(crate) executions: mpsc::Receiver<Execution>,
    pub(crate) idle: mpsc::Receiver<()>,
}

impl Notifier {
    /// Receives the next execution report.
    ///
    /// Returns `None` once every handle to the reporter has been dropped.
    pub async fn next_report(&mut self) -> Option<Execution> {
        self.executions.recv().await
    }

    /// Receives the next no-work signal.
    pub async fn next_no_work(&mut self) -> Option<()> {
        self.idle.recv().await
    }

    /// Discards any buffered execution reports.
    ///
    /// Used after a limit adjustment so the next samples reflect the new
    /// concurrency rather than the previous one.
    pub fn clear_pending(&mut self) {
        while self.executions.try_recv().is_ok() {}
    }
}
