//! # Gradient limit estimator.
//!
//! Pure state machine behind the control loop: it turns a stream of
//! [`Execution`] reports into limit decisions. All state is owned by the
//! control-loop task; nothing here is shared.
//!
//! The estimate follows the ratio between the best RTT observed in the
//! current probe epoch and the reported RTT:
//!
//! - ratio near 1.0: the downstream is healthy, grow by the queue slack;
//! - ratio clamped at 0.5: the downstream is saturated, halve at most;
//! - reported error: shrink multiplicatively, regardless of RTT.
//!
//! Decreases are smoothed with an EMA; increases apply unsmoothed.
//! Periodically the estimator collapses the limit to the queue size alone
//! so the next few samples re-measure unloaded latency; the gap between
//! probes is randomized to avoid lockstep across controllers.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ControllerConfig, QueueSizeFn};
use crate::report::Execution;

/// Outcome of one observation step.
pub(crate) struct Decision {
    /// The unclamped next limit. The control loop clamps into `[min, max]`.
    pub limit: usize,
    /// True when this step started a probe epoch instead of evaluating the
    /// gradient.
    pub probe: bool,
}

pub(crate) struct Estimator {
    rtt_tolerance: f64,
    smoothing: f64,
    backoff_ratio: f64,
    probe_interval: u64,
    queue_size: QueueSizeFn,
    rng: StdRng,

    /// Best RTT observed in the current probe epoch.
    no_load_rtt: Duration,
    /// When set, the next report unconditionally overwrites `no_load_rtt`.
    reset_no_load_rtt: bool,
    /// Reports remaining until the next forced probe.
    probe_countdown: u64,
}

impl Estimator {
    pub fn new(cfg: &ControllerConfig) -> Self {
        Self {
            rtt_tolerance: cfg.rtt_tolerance,
            smoothing: cfg.smoothing,
            backoff_ratio: cfg.backoff_ratio,
            probe_interval: cfg.probe_interval,
            queue_size: cfg.queue_size.clone(),
            rng: StdRng::seed_from_u64(cfg.seed),
            no_load_rtt: Duration::ZERO,
            reset_no_load_rtt: true,
            probe_countdown: 0,
        }
    }

    /// Starts a probe epoch: re-seeds the countdown and arms the no-load
    /// RTT overwrite.
    pub fn arm_probe(&mut self) {
        self.probe_countdown = self.next_probe_countdown();
        self.reset_no_load_rtt = true;
    }

    /// Uniformly random in `[probe_interval, 2 * probe_interval)`.
    ///
    /// Randomization prevents probe-interval lockstep across multiple
    /// controllers sharing a tenant.
    fn next_probe_countdown(&mut self) -> u64 {
        self.probe_interval + self.rng.random_range(0..self.probe_interval)
    }

    /// Consumes one execution report and produces the next limit.
    pub fn observe(&mut self, current_limit: usize, report: &Execution) -> Decision {
        let queue = (self.queue_size)(current_limit);

        self.probe_countdown = self.probe_countdown.saturating_sub(1);
        if self.probe_countdown == 0 {
            // Collapse to roughly sqrt(limit) workers so the next samples
            // approximate unloaded latency.
            self.arm_probe();
            return Decision {
                limit: queue,
                probe: true,
            };
        }

        if self.reset_no_load_rtt || report.rtt < self.no_load_rtt {
            self.no_load_rtt = report.rtt;
            self.reset_no_load_rtt = false;
        }

        let gradient = if report.rtt.is_zero() {
            1.0
        } else {
            (self.rtt_tolerance * self.no_load_rtt.as_secs_f64() / report.rtt.as_secs_f64())
                .clamp(0.5, 1.0)
        };

        let current = current_limit as f64;
        let mut next = if report.err.is_some() {
            current * self.backoff_ratio
        } else {
            current * gradient + queue as f64
        };

        if next < current {
            next = (1.0 - self.smoothing) * current + self.smoothing * next;
        }

        Decision {
            limit: queue.max(next as usize),
            probe: false,
        }
    }
}
