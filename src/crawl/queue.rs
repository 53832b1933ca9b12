// src/crawl/queue.rs
// =============================================================================
// The work queue: URLs that have been admitted but not crawled yet.
//
// How it works:
// 1. Crawl tasks push newly admitted URLs onto the back
// 2. The scheduler pops from the front (first in, first out)
// 3. close() ends the queue: pushes become no-ops and every pop, blocked or
//    future, returns None
//
// Many tasks push at the same time, so the VecDeque sits behind a Mutex. The
// lock is never held across an .await; waiting is done with tokio's Notify.
//
// Rust concepts:
// - VecDeque: Double-ended queue, push_back()/pop_front() are O(1)
// - Notify: An async "wake up" signal, like a condition variable
// =============================================================================

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

use super::url_record::UrlRecord;

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<UrlRecord>,
    closed: bool,
}

/// FIFO of pending crawl work, safe for many producers and consumers.
#[derive(Debug, Default)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
    available: Notify,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. Returns false (and drops it) if the queue is closed.
    pub fn push(&self, record: UrlRecord) -> bool {
        {
            let mut state = self.lock();
            if state.closed {
                return false;
            }
            state.items.push_back(record);
        }
        // notify_one stores a permit when nobody is waiting yet,
        // so a popper that is about to wait still sees this push
        self.available.notify_one();
        true
    }

    /// Takes the next record without waiting.
    ///
    /// Returns None when the queue is empty or closed.
    pub fn try_pop(&self) -> Option<UrlRecord> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }
        state.items.pop_front()
    }

    /// Waits until a record is available. Returns None once the queue is closed.
    pub async fn pop(&self) -> Option<UrlRecord> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            // Register interest before checking state so a close() that
            // lands between the check and the await is not missed
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(record) = state.items.pop_front() {
                    return Some(record);
                }
            }

            notified.await;
        }
    }

    /// Closes the queue and wakes every waiting pop. Calling it again does nothing.
    pub fn close(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        state.items.clear();
        drop(state);
        self.available.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why std::sync::Mutex and not tokio::sync::Mutex?
//    - We only hold the lock for a few instructions and never across .await
//    - A std Mutex is cheaper for that and can't deadlock an async task
//
// 2. What does enable() do?
//    - notified() creates a future but doesn't register it yet
//    - enable() registers it right away, so a notify_waiters() call that
//      happens before we reach .await still wakes us up
//
// 3. Why does close() clear the items?
//    - After close, nobody is allowed to pop anymore
//    - Keeping the items would just hold memory until the queue is dropped
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn record(url: &str) -> UrlRecord {
        UrlRecord::new(url, 0).unwrap()
    }

    #[test]
    fn test_fifo_order() {
        let queue = WorkQueue::new();
        queue.push(record("https://example.com/1"));
        queue.push(record("https://example.com/2"));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_pop().unwrap().url(), "https://example.com/1");
        assert_eq!(queue.try_pop().unwrap().url(), "https://example.com/2");
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn test_push_after_close_is_noop() {
        let queue = WorkQueue::new();
        queue.close();
        queue.close();
        assert!(!queue.push(record("https://example.com")));
        assert!(queue.is_empty());
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn test_blocking_pop_receives_later_push() {
        let queue = Arc::new(WorkQueue::new());
        let popper = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push(record("https://example.com/late"));

        let popped = popper.await.unwrap();
        assert_eq!(popped.unwrap().url(), "https://example.com/late");
    }

    #[tokio::test]
    async fn test_close_releases_all_waiters() {
        let queue = Arc::new(WorkQueue::new());
        let poppers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move { queue.pop().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        let results = futures::future::join_all(poppers).await;
        for result in results {
            assert!(result.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_pop_after_close_returns_none_even_with_items() {
        let queue = WorkQueue::new();
        queue.push(record("https://example.com"));
        queue.close();
        assert!(queue.pop().await.is_none());
        assert!(queue.try_pop().is_none());
    }
}
