//! # Gradient controller.
//!
//! [`GradientController`] owns the control loop that turns execution
//! reports into pool-size adjustments.
//!
//! # High-level architecture
//!
//! ```text
//!            ┌──────────────────────────────┐
//!  quit ───► │          control loop        │
//!  reports ─►│  estimator ──► adjust+settle │──► WorkerPool
//!  no-work ─►│  shed one  ──► adjust        │
//!            └──────────────────────────────┘
//! ```
//!
//! A single task owns all estimator state and is the sole writer of
//! `wanted_n`. Each iteration selects over the quit token, the execution
//! stream, and the no-work stream.

use std::cmp::Ordering;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ControllerConfig;
use crate::error::{ConfigError, SettleError};
use crate::events::{Bus, Event, EventKind};
use crate::pool::WorkerPool;
use crate::report::Notifier;

use super::estimator::Estimator;

/// Adaptive concurrency controller.
///
/// Consumes a [`Notifier`]'s streams, computes new limits with a gradient
/// algorithm, and drives a [`WorkerPool`] toward them. Construction
/// validates the configuration and fails fast on inconsistent bounds.
///
/// Call [`start`](GradientController::start) to run it; once done, call
/// [`stop`](GradientController::stop) to drain the pool. A stopped
/// controller can be started again.
pub struct GradientController {
    pool: WorkerPool,
    cfg: ControllerConfig,
    bus: Option<Bus>,

    /// Present while idle; taken by the control loop while running and
    /// handed back on stop so the controller is restartable.
    notifier: Option<Notifier>,
    run: Option<RunState>,
}

struct RunState {
    quit: CancellationToken,
    handle: JoinHandle<Notifier>,
}

impl GradientController {
    /// Creates an idle controller bound to `notifier` and `pool`.
    ///
    /// Fails fast on invalid configuration; no partial controller is
    /// returned.
    pub fn new(
        notifier: Notifier,
        pool: WorkerPool,
        cfg: ControllerConfig,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            pool,
            cfg,
            bus: None,
            notifier: Some(notifier),
            run: None,
        })
    }

    /// Publishes controller lifecycle events to `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Whether the control loop is currently running.
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Starts the control loop.
    ///
    /// Immediately raises the pool to the initial limit, then reacts to
    /// reports. Starting an already-running controller is a no-op.
    pub fn start(&mut self) {
        if self.run.is_some() {
            return;
        }
        let Some(notifier) = self.notifier.take() else {
            // The previous control loop died without returning the
            // notifier (it panicked); nothing left to run with.
            return;
        };

        let quit = CancellationToken::new();
        let control = ControlLoop {
            pool: self.pool.clone(),
            estimator: Estimator::new(&self.cfg),
            initial: self.cfg.initial_limit,
            min: self.cfg.min_limit,
            max: self.cfg.max_limit,
            drain_backlog: self.cfg.drain_backlog,
            bus: self.bus.clone(),
        };
        let handle = tokio::spawn(control.run(notifier, quit.clone()));
        self.run = Some(RunState { quit, handle });
    }

    /// Stops the control loop, then shrinks the pool to zero and waits for
    /// convergence.
    ///
    /// Reports arriving after this point are simply no longer listened to;
    /// the reporter's non-blocking semantics keep workers from wedging.
    /// If `ctx` fires before the pool converges, returns
    /// [`SettleError::Cancelled`] and leaves the remaining workers to
    /// finish honouring their stop tokens.
    pub async fn stop(&mut self, ctx: &CancellationToken) -> Result<(), SettleError> {
        let Some(run) = self.run.take() else {
            return Ok(());
        };
        run.quit.cancel();
        // The loop hands the notifier back so the controller can be
        // started again. A join error means the loop panicked; the
        // controller stays stopped for good.
        if let Ok(notifier) = run.handle.await {
            self.notifier = Some(notifier);
        }

        self.pool.decr(self.pool.wanted_n());
        let settled = self.pool.settle(ctx).await;
        if let Some(bus) = &self.bus {
            bus.publish(Event::now(EventKind::ControllerStopped));
        }
        settled
    }
}

/// The running half of the controller. Owns every piece of mutable control
/// state for the lifetime of one start/stop cycle.
struct ControlLoop {
    pool: WorkerPool,
    estimator: Estimator,
    initial: usize,
    min: usize,
    max: usize,
    drain_backlog: bool,
    bus: Option<Bus>,
}

impl ControlLoop {
    async fn run(mut self, mut notifier: Notifier, quit: CancellationToken) -> Notifier {
        self.pool.note_restart();
        self.pool.incr(self.initial);
        self.estimator.arm_probe();
        self.publish(Event::now(EventKind::ControllerStarted).with_limit(self.initial));

        loop {
            tokio::select! {
                _ = quit.cancelled() => break,

                report = notifier.executions.recv() => {
                    let Some(report) = report else { break };
                    let decision = self.estimator.observe(self.pool.wanted_n(), &report);
                    if decision.probe {
                        self.publish(
                            Event::now(EventKind::ProbeArmed)
                                .with_limit(decision.limit)
                                .with_rtt(report.rtt),
                        );
                    }
                    let changed = self.adjust(decision.limit, true, &quit).await;
                    if changed && self.drain_backlog {
                        // Reports queued before the adjustment describe the
                        // old concurrency; reacting to them would be
                        // second-guessing the decision just made.
                        notifier.clear_pending();
                    }
                }

                signal = notifier.idle.recv() => {
                    if signal.is_none() {
                        break;
                    }
                    // A no-work signal is evidence of overprovisioning;
                    // conservatively shed one worker.
                    let wanted = self.pool.wanted_n();
                    if wanted > self.min {
                        self.publish(Event::now(EventKind::NoWorkShed).with_limit(wanted - 1));
                        let changed = self.adjust(wanted - 1, false, &quit).await;
                        if changed && self.drain_backlog {
                            notifier.clear_pending();
                        }
                    }
                }
            }
        }

        notifier
    }

    /// Clamps `new_limit` into `[min, max]` and drives the pool to it.
    /// Returns whether the target actually moved.
    async fn adjust(&self, new_limit: usize, settle: bool, quit: &CancellationToken) -> bool {
        let new_limit = new_limit.clamp(self.min, self.max);
        let current = self.pool.wanted_n();
        match new_limit.cmp(&current) {
            Ordering::Greater => self.pool.incr(new_limit - current),
            Ordering::Less => self.pool.decr(current - new_limit),
            Ordering::Equal => return false,
        }
        self.publish(
            Event::now(EventKind::LimitChanged)
                .with_limit(new_limit)
                .with_delta(new_limit as i64 - current as i64),
        );

        if settle {
            // Wait for the pool to stabilize so the next RTT samples
            // reflect the new concurrency, not a transient mix. The quit
            // token doubles as the settle context so stop() can interrupt
            // a wait wedged by a stop-ignoring runner.
            if self.pool.settle(quit).await.is_err() {
                self.publish(Event::now(EventKind::SettleInterrupted).with_limit(new_limit));
            }
        }
        true
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev);
        }
    }
}
