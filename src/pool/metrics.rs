//! # Metrics hook for pool-size changes.

/// Called for pool-size changes and controller restarts.
///
/// Implementations should be cheap and non-blocking; these run on the
/// controller task.
pub trait PoolMetrics: Send + Sync + 'static {
    /// `n` workers were added to the target.
    fn incr(&self, n: usize);
    /// `n` workers were removed from the target.
    fn decr(&self, n: usize);
    /// The controller (re)started its control loop.
    fn restart(&self);
}

/// The default [`PoolMetrics`] if none other is set.
pub struct NoopMetrics;

impl PoolMetrics for NoopMetrics {
    fn incr(&self, _n: usize) {}
    fn decr(&self, _n: usize) {}
    fn restart(&self) {}
}
