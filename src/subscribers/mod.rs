//! # Event subscribers.
//!
//! [`Subscribe`] is the extension point for consuming runtime events:
//! implement it and hand an `Arc` of your type to
//! [`Bus::attach`](crate::events::Bus::attach). The built-in `LogWriter`
//! (behind the `logging` feature) prints events to stdout for demos and
//! debugging.

mod subscriber;

#[cfg(feature = "logging")]
mod log;

pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
