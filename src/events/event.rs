//! # Events emitted by the controller, pool, and reporter.
//!
//! [`EventKind`] classifies events across three categories:
//! - **Controller events**: start/stop, limit changes, probes, no-work shedding.
//! - **Pool events**: worker spawn and exit.
//! - **Backpressure events**: reports dropped by the non-blocking reporter.
//!
//! The [`Event`] struct carries metadata such as the new limit, the change
//! delta, the reported RTT, and a free-form detail string.
//!
//! ## Ordering
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically, so subscribers can order events even when several
//! publishers race.
//!
//! ## Example
//! ```rust
//! use poolvisor::events::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::LimitChanged).with_limit(8).with_delta(-2);
//!
//! assert_eq!(ev.kind, EventKind::LimitChanged);
//! assert_eq!(ev.limit, Some(8));
//! assert_eq!(ev.delta, Some(-2));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Controller events ===
    /// The control loop started and raised the pool to the initial limit.
    ControllerStarted,
    /// The control loop exited and the pool was drained.
    ControllerStopped,
    /// The controller moved `wanted_n` to a new limit.
    LimitChanged,
    /// A probe epoch began: the limit collapsed to the queue size so the
    /// next samples approximate unloaded latency.
    ProbeArmed,
    /// A no-work signal shed one worker.
    NoWorkShed,
    /// A settle wait was interrupted by cancellation before convergence.
    SettleInterrupted,

    // === Pool events ===
    /// A worker task was spawned.
    WorkerSpawned,
    /// A worker task exited (stop token consumed, runner returned, or panic).
    WorkerExited,

    // === Backpressure events ===
    /// The reporter dropped a report because its channel was full.
    ReportDropped,
}

/// Runtime event with optional metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp (may go backwards, use for logging only).
    pub at: SystemTime,
    /// The kind of event.
    pub kind: EventKind,
    /// The limit (`wanted_n`) after the event, if relevant.
    pub limit: Option<usize>,
    /// Signed change in the limit, if relevant.
    pub delta: Option<i64>,
    /// The reported round-trip time, if relevant.
    pub rtt: Option<Duration>,
    /// Free-form detail, e.g. which stream dropped a report.
    pub detail: Option<String>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            limit: None,
            delta: None,
            rtt: None,
            detail: None,
        }
    }

    /// Attaches the limit after the event.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Attaches the signed limit delta.
    pub fn with_delta(mut self, delta: i64) -> Self {
        self.delta = Some(delta);
        self
    }

    /// Attaches a round-trip time.
    pub fn with_rtt(mut self, rtt: Duration) -> Self {
        self.rtt = Some(rtt);
        self
    }

    /// Attaches a free-form detail string.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Creates a backpressure-drop event for the given stream.
    pub fn report_dropped(stream: &'static str) -> Self {
        Event::now(EventKind::ReportDropped).with_detail(stream)
    }
}
