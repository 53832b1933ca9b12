// src/crawl/stop.rs
// =============================================================================
// The crawl's one-way stop switch.
//
// Several things can end a crawl: the queue running dry, the URL budget being
// used up, the global deadline, or the user pressing Ctrl-C. Whichever happens
// first is recorded; later requests are ignored. Once set, the switch never
// resets.
// =============================================================================

use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;
use tokio::sync::Notify;

/// Why a crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No task was running and the queue was empty.
    Quiescent,
    /// The visited set hit max_count while a page was being expanded.
    CapacityReached,
    /// The global deadline fired.
    DeadlineExceeded,
    /// Someone outside the crawl asked it to stop.
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::Quiescent => "no more work",
            StopReason::CapacityReached => "URL budget reached",
            StopReason::DeadlineExceeded => "deadline exceeded",
            StopReason::Interrupted => "interrupted",
        };
        f.write_str(text)
    }
}

/// Monotonic stop flag shared by the scheduler, its tasks and the caller.
#[derive(Debug, Default)]
pub struct StopSignal {
    reason: OnceLock<StopReason>,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `reason` if nothing stopped the crawl yet.
    ///
    /// Returns true when this call was the one that set the flag.
    pub fn request(&self, reason: StopReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        if first {
            self.notify.notify_waiters();
        }
        first
    }

    pub fn is_requested(&self) -> bool {
        self.reason.get().is_some()
    }

    /// The reason that won, if any.
    pub fn reason(&self) -> Option<StopReason> {
        self.reason.get().copied()
    }

    /// Resolves once a stop has been requested.
    pub async fn requested(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_requested() {
            return;
        }
        notified.await;
    }
}
