//! # Error types used by the poolvisor controller and reporters.
//!
//! This module defines three error enums:
//!
//! - [`ConfigError`] invalid controller configuration, rejected at construction.
//! - [`SettleError`] a wait for pool convergence was cancelled before it completed.
//! - [`WorkError`] failures reported by individual work units.
//!
//! All types provide an `as_label` method returning a short stable string
//! for logs and metrics.

use thiserror::Error;

/// # Configuration faults detected at controller construction.
///
/// Construction fails fast: no partially-configured controller is ever
/// returned.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// `min_limit` exceeds `max_limit`.
    #[error("min limit {min} can't be greater than max limit {max}")]
    MinAboveMax { min: usize, max: usize },

    /// `initial_limit` is below `min_limit`.
    #[error("initial limit {initial} can't be less than min limit {min}")]
    InitialBelowMin { initial: usize, min: usize },

    /// `initial_limit` is above `max_limit`.
    #[error("initial limit {initial} can't be greater than max limit {max}")]
    InitialAboveMax { initial: usize, max: usize },

    /// `probe_interval` must be at least 1 report.
    #[error("probe interval must be at least 1")]
    ZeroProbeInterval,

    /// `rtt_tolerance` must be a positive finite number.
    #[error("rtt tolerance must be positive, got {value}")]
    RttToleranceOutOfRange { value: f64 },

    /// `smoothing` must lie within `[0, 1]`.
    #[error("smoothing must be within [0, 1], got {value}")]
    SmoothingOutOfRange { value: f64 },

    /// `backoff_ratio` must lie within `(0, 1]`.
    #[error("backoff ratio must be within (0, 1], got {value}")]
    BackoffRatioOutOfRange { value: f64 },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::MinAboveMax { .. } => "config_min_above_max",
            ConfigError::InitialBelowMin { .. } => "config_initial_below_min",
            ConfigError::InitialAboveMax { .. } => "config_initial_above_max",
            ConfigError::ZeroProbeInterval => "config_zero_probe_interval",
            ConfigError::RttToleranceOutOfRange { .. } => "config_rtt_tolerance_out_of_range",
            ConfigError::SmoothingOutOfRange { .. } => "config_smoothing_out_of_range",
            ConfigError::BackoffRatioOutOfRange { .. } => "config_backoff_ratio_out_of_range",
        }
    }
}

/// # Errors produced while waiting for the pool to settle.
///
/// Returned by [`WorkerPool::settle`](crate::WorkerPool::settle) and
/// [`GradientController::stop`](crate::GradientController::stop). Cancellation
/// is the only failure mode: convergence itself cannot fail, only be
/// abandoned.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleError {
    /// The cancellation token fired before `actual_n` reached `wanted_n`.
    ///
    /// Remaining workers may still be running; the caller decides whether to
    /// leak them or retry with a fresh token.
    #[error("cancelled before the pool settled")]
    Cancelled,
}

impl SettleError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            SettleError::Cancelled => "settle_cancelled",
        }
    }
}

/// # Failures reported by a work unit.
///
/// A `WorkError` never escapes the feedback loop: it is recorded on the
/// [`Execution`](crate::Execution) and drives the controller's multiplicative
/// backoff, nothing more.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkError {
    /// The unit failed; the downstream may recover if load is shed.
    #[error("work unit failed: {reason}")]
    Fail { reason: String },

    /// The unit gave up waiting on the downstream.
    #[error("work unit timed out: {reason}")]
    Timeout { reason: String },
}

impl WorkError {
    /// Shorthand for [`WorkError::Fail`].
    pub fn fail(reason: impl Into<String>) -> Self {
        WorkError::Fail {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`WorkError::Timeout`].
    pub fn timeout(reason: impl Into<String>) -> Self {
        WorkError::Timeout {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Fail { .. } => "work_failed",
            WorkError::Timeout { .. } => "work_timeout",
        }
    }
}
