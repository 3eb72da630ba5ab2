//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [started] limit=1
//! [limit] limit=5 delta=+2
//! [probe] limit=3
//! [no-work] limit=4
//! [dropped] stream=executions
//! [stopped]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Not intended for production use;
/// implement a custom [`Subscribe`] for structured logging or metrics.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::ControllerStarted => {
                println!("[started] limit={:?}", e.limit);
            }
            EventKind::ControllerStopped => {
                println!("[stopped]");
            }
            EventKind::LimitChanged => {
                println!("[limit] limit={:?} delta={:?}", e.limit, e.delta);
            }
            EventKind::ProbeArmed => {
                println!("[probe] limit={:?}", e.limit);
            }
            EventKind::NoWorkShed => {
                println!("[no-work] limit={:?}", e.limit);
            }
            EventKind::SettleInterrupted => {
                println!("[settle-interrupted]");
            }
            EventKind::WorkerSpawned => {
                println!("[worker-spawned]");
            }
            EventKind::WorkerExited => {
                println!("[worker-exited]");
            }
            EventKind::ReportDropped => {
                println!("[dropped] stream={:?}", e.detail);
            }
        }
    }
}
