//! # Runtime events and the broadcast bus.
//!
//! The controller, pool, and reporter publish [`Event`]s to a shared [`Bus`]
//! so hosts can observe limit decisions, probes, and backpressure drops
//! without being in the hot path. Publishing is always non-blocking; if
//! nobody subscribes, events vanish.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
