//! Process-wide run-state machine with latest-value fan-out.
//!
//! [`ProgressTracker`] guards the singleton [`RunState`] behind a
//! `tokio::sync::watch` channel: every mutation goes through the sender's
//! internal lock (single-writer discipline), and any number of subscribers
//! read complete snapshots without ever blocking the pipeline. Slow
//! subscribers may miss intermediate updates, but the terminal
//! `is_running: false` value is always the latest and therefore always seen.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

/// Point-in-time progress of the (single) collection run.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    pub is_running: bool,
    pub message: String,
    pub current_count: usize,
    pub total_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl RunState {
    fn idle() -> Self {
        RunState {
            is_running: false,
            message: "idle".to_string(),
            current_count: 0,
            total_count: 0,
            started_at: None,
        }
    }
}

/// Single-slot run-state machine; see the module docs.
pub struct ProgressTracker {
    tx: watch::Sender<RunState>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RunState::idle());
        Self { tx }
    }

    /// Attempts to flip the tracker from idle to running.
    ///
    /// The check-and-set runs inside the watch sender's lock, so exactly one
    /// of any number of concurrent callers wins; losers observe `false` and
    /// must not start work. Counters reset to zero for the new run.
    pub fn try_start(&self) -> bool {
        let mut acquired = false;
        self.tx.send_if_modified(|state| {
            if state.is_running {
                return false;
            }
            *state = RunState {
                is_running: true,
                message: "starting".to_string(),
                current_count: 0,
                total_count: 0,
                started_at: Some(Utc::now()),
            };
            acquired = true;
            true
        });
        acquired
    }

    /// Publishes the run's total work count and a phase message.
    pub fn set_total(&self, total: usize, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|state| {
            state.total_count = total;
            state.message = message;
        });
    }

    /// Records one completed unit of work.
    ///
    /// Callable from any worker; each call increments by exactly one, so
    /// `current_count` is monotonically non-decreasing within a run.
    pub fn advance(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|state| {
            state.current_count += 1;
            state.message = message;
        });
    }

    /// Ends the run, leaving the counters at their final values for late
    /// subscribers.
    pub fn finish(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|state| {
            state.is_running = false;
            state.message = message;
        });
    }

    /// The current state, as a complete copy.
    #[must_use]
    pub fn snapshot(&self) -> RunState {
        self.tx.borrow().clone()
    }

    /// A new subscription; the receiver immediately holds the current state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.tx.subscribe()
    }
}
