//! # Worker pool: spawn, count, and converge workers.
//!
//! [`WorkerPool`] owns the set of running workers and drives `actual_n`
//! toward `wanted_n`. [`StopListener`] is the worker-side view of the stop
//! stream; [`PoolMetrics`] is an optional hook for pool-size changes.

mod core;
mod metrics;
mod stop;

pub use self::core::{WorkerPool, WorkerPoolBuilder};
pub use metrics::{NoopMetrics, PoolMetrics};
pub use stop::StopListener;
