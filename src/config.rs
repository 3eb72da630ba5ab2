//! # Controller configuration.
//!
//! [`ControllerConfig`] holds every tunable of the gradient control loop:
//! limit bounds, RTT tolerance, smoothing, the queue-size function, probe
//! interval, backoff ratio, the PRNG seed, and backlog draining.
//!
//! # Example
//! ```
//! use poolvisor::ControllerConfig;
//!
//! let mut cfg = ControllerConfig::default();
//! cfg.initial_limit = 4;
//! cfg.max_limit = 64;
//! cfg.rtt_tolerance = 1.5;
//!
//! assert!(cfg.validate().is_ok());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;

/// Default upper bound on the concurrency limit.
pub const DEFAULT_MAX_CONCURRENCY: usize = 20;

/// Slack added on top of the gradient-shrunk limit, as a function of the
/// current limit.
pub type QueueSizeFn = Arc<dyn Fn(usize) -> usize + Send + Sync>;

/// The default queue-size function: `round(sqrt(limit))`.
///
/// Square-root slack grows sublinearly, so headroom shrinks relative to the
/// limit as the pool scales up.
pub fn sqrt_queue(limit: usize) -> usize {
    (limit as f64).sqrt().round() as usize
}

/// Configuration for a [`GradientController`](crate::GradientController).
///
/// Construction of a controller validates the bounds and fails fast on
/// inconsistent values; see [`ControllerConfig::validate`].
#[derive(Clone)]
pub struct ControllerConfig {
    /// Number of workers raised immediately on start.
    pub initial_limit: usize,
    /// Lower bound on the limit. The controller never drives `wanted_n`
    /// below it, except while draining to zero during stop.
    pub min_limit: usize,
    /// Upper bound on the limit.
    pub max_limit: usize,
    /// Multiplier on the best observed RTT before the gradient penalizes.
    pub rtt_tolerance: f64,
    /// EMA coefficient in `[0, 1]`, applied to limit decreases only.
    pub smoothing: f64,
    /// Slack added on top of the gradient-scaled limit.
    pub queue_size: QueueSizeFn,
    /// Baseline number of reports between forced re-probes of the no-load
    /// RTT. The actual gap is randomized in `[probe_interval, 2*probe_interval)`.
    pub probe_interval: u64,
    /// Multiplicative shrink applied to the limit when a work unit reports
    /// an error. Must lie in `(0, 1]`.
    pub backoff_ratio: f64,
    /// Seed for the controller's PRNG. Fixed by default so probe timing is
    /// reproducible across runs.
    pub seed: u64,
    /// Clear pending execution reports after every controller-initiated
    /// adjustment, so the next samples reflect the new limit rather than the
    /// previous one. Stale reports drive second-guessing; leave this on
    /// unless you want to react to every delivered sample.
    pub drain_backlog: bool,
}

impl Default for ControllerConfig {
    /// Provides a default configuration:
    /// - `initial_limit = 1`
    /// - `min_limit = 1`
    /// - `max_limit = 20`
    /// - `rtt_tolerance = 2.0`
    /// - `smoothing = 0.2`
    /// - `queue_size = round(sqrt(limit))`
    /// - `probe_interval = 1000`
    /// - `backoff_ratio = 0.9`
    /// - `seed = 42`
    /// - `drain_backlog = true`
    fn default() -> Self {
        Self {
            initial_limit: 1,
            min_limit: 1,
            max_limit: DEFAULT_MAX_CONCURRENCY,
            rtt_tolerance: 2.0,
            smoothing: 0.2,
            queue_size: Arc::new(sqrt_queue),
            probe_interval: 1000,
            backoff_ratio: 0.9,
            seed: 42,
            drain_backlog: true,
        }
    }
}

impl ControllerConfig {
    /// Checks the configuration invariants.
    ///
    /// Required: `min_limit <= initial_limit <= max_limit`,
    /// `probe_interval >= 1`, `rtt_tolerance > 0`, `smoothing` in `[0, 1]`,
    /// `backoff_ratio` in `(0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_limit > self.max_limit {
            return Err(ConfigError::MinAboveMax {
                min: self.min_limit,
                max: self.max_limit,
            });
        }
        if self.initial_limit < self.min_limit {
            return Err(ConfigError::InitialBelowMin {
                initial: self.initial_limit,
                min: self.min_limit,
            });
        }
        if self.initial_limit > self.max_limit {
            return Err(ConfigError::InitialAboveMax {
                initial: self.initial_limit,
                max: self.max_limit,
            });
        }
        if self.probe_interval == 0 {
            return Err(ConfigError::ZeroProbeInterval);
        }
        if !(self.rtt_tolerance > 0.0 && self.rtt_tolerance.is_finite()) {
            return Err(ConfigError::RttToleranceOutOfRange {
                value: self.rtt_tolerance,
            });
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(ConfigError::SmoothingOutOfRange {
                value: self.smoothing,
            });
        }
        if !(self.backoff_ratio > 0.0 && self.backoff_ratio <= 1.0) {
            return Err(ConfigError::BackoffRatioOutOfRange {
                value: self.backoff_ratio,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("initial_limit", &self.initial_limit)
            .field("min_limit", &self.min_limit)
            .field("max_limit", &self.max_limit)
            .field("rtt_tolerance", &self.rtt_tolerance)
            .field("smoothing", &self.smoothing)
            .field("queue_size", &"<fn>")
            .field("probe_interval", &self.probe_interval)
            .field("backoff_ratio", &self.backoff_ratio)
            .field("seed", &self.seed)
            .field("drain_backlog", &self.drain_backlog)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_queue_rounds_to_nearest() {
        assert_eq!(sqrt_queue(0), 0);
        assert_eq!(sqrt_queue(1), 1);
        assert_eq!(sqrt_queue(2), 1);
        assert_eq!(sqrt_queue(3), 2);
        assert_eq!(sqrt_queue(10), 3);
        assert_eq!(sqrt_queue(100), 10);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(ControllerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let cfg = ControllerConfig {
            min_limit: 10,
            max_limit: 5,
            initial_limit: 10,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::MinAboveMax { min: 10, max: 5 })
        );
    }

    #[test]
    fn rejects_initial_outside_bounds() {
        let below = ControllerConfig {
            min_limit: 2,
            initial_limit: 1,
            ..Default::default()
        };
        assert!(matches!(
            below.validate(),
            Err(ConfigError::InitialBelowMin { .. })
        ));

        let above = ControllerConfig {
            initial_limit: 30,
            ..Default::default()
        };
        assert!(matches!(
            above.validate(),
            Err(ConfigError::InitialAboveMax { .. })
        ));
    }

    #[test]
    fn rejects_degenerate_tunables() {
        let zero_probe = ControllerConfig {
            probe_interval: 0,
            ..Default::default()
        };
        assert_eq!(zero_probe.validate(), Err(ConfigError::ZeroProbeInterval));

        let bad_smoothing = ControllerConfig {
            smoothing: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            bad_smoothing.validate(),
            Err(ConfigError::SmoothingOutOfRange { .. })
        ));

        let bad_backoff = ControllerConfig {
            backoff_ratio: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_backoff.validate(),
            Err(ConfigError::BackoffRatioOutOfRange { .. })
        ));
    }
}
