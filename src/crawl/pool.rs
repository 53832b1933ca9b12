// src/crawl/pool.rs
// =============================================================================
// Bounded set of running crawl tasks.
//
// A Semaphore hands out `size` slots. The scheduler must hold a slot to start
// a task, and the task gives the slot back when it ends, so at most `size`
// fetches are ever in flight. Waiting for a slot is the crawler's only
// backpressure.
//
// Running tasks live in a JoinSet. A task counts as active until the
// scheduler reaps it, and only the scheduler spawns or reaps, so the active
// count can't change behind its back.
// =============================================================================

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::error;

use crate::error::CrawlError;

/// Proof that a slot was reserved; handed to [`WorkerPool::spawn`].
#[derive(Debug)]
pub struct Slot(OwnedSemaphorePermit);

#[derive(Debug)]
pub struct WorkerPool {
    slots: Arc<Semaphore>,
    tasks: JoinSet<()>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(size)),
            tasks: JoinSet::new(),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Tasks spawned and not reaped yet.
    pub fn active(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Slots nobody holds right now.
    pub fn free_count(&self) -> usize {
        self.slots.available_permits()
    }

    /// Waits for a free slot.
    pub async fn acquire(&self) -> Result<Slot, CrawlError> {
        Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map(Slot)
            .map_err(|_| CrawlError::PoolClosed)
    }

    /// Starts `task`; the slot is released when it finishes.
    pub fn spawn<F>(&mut self, slot: Slot, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(async move {
            let _slot = slot;
            task.await;
        });
    }

    /// Reaps every task that already finished, without waiting.
    pub fn reap(&mut self) -> usize {
        let mut reaped = 0;
        while let Some(result) = self.tasks.try_join_next() {
            log_join_result(result);
            reaped += 1;
        }
        reaped
    }

    /// Waits for one task to finish and reaps it.
    ///
    /// Returns false immediately when nothing is running.
    pub async fn wait_next(&mut self) -> bool {
        match self.tasks.join_next().await {
            Some(result) => {
                log_join_result(result);
                true
            }
            None => false,
        }
    }

    /// Waits for every running task.
    pub async fn join_all(&mut self) {
        while self.wait_next().await {}
    }
}

fn log_join_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!("crawl task panicked: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_never_exceeds_size() {
        let mut pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..6 {
            let slot = pool.acquire().await.unwrap();
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            pool.spawn(slot, async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            });
        }
        pool.join_all().await;

        assert!(pool.is_idle());
        assert_eq!(pool.free_count(), 2);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_reap_is_non_blocking() {
        let mut pool = WorkerPool::new(1);
        let slot = pool.acquire().await.unwrap();
        pool.spawn(slot, std::future::pending());

        assert_eq!(pool.reap(), 0);
        assert_eq!(pool.active(), 1);
        assert_eq!(pool.free_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_next_on_empty_pool() {
        let mut pool = WorkerPool::new(3);
        assert!(!pool.wait_next().await);
        assert_eq!(pool.size(), 3);
    }

    #[tokio::test]
    async fn test_panicking_task_is_reaped() {
        let mut pool = WorkerPool::new(1);
        let slot = pool.acquire().await.unwrap();
        pool.spawn(slot, async { panic!("boom") });
        assert!(pool.wait_next().await);
        assert!(pool.is_idle());
        assert_eq!(pool.free_count(), 1);
    }
}
