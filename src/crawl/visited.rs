// src/crawl/visited.rs
// =============================================================================
// The set of every URL the crawl has ever admitted.
//
// This is the single source of truth for "have we seen this URL?" and for the
// URL budget (max_count). Crawl tasks run in parallel on the tokio runtime, so
// "is there room?", "is it new?" and "insert it" all happen under one lock in
// admit(). The set can therefore never grow past max_count, no matter how
// many tasks race on the last free slot.
// =============================================================================

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::url_record::{normalize, UrlRecord};

/// Outcome of trying to admit a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The URL was new and is now part of the set.
    Admitted,
    /// The URL was already present; the stored depth is unchanged.
    Duplicate,
    /// The set is at capacity; nothing was inserted.
    Full,
}

/// Capacity-bounded, dedup-by-URL store.
#[derive(Debug)]
pub struct VisitedSet {
    records: Mutex<HashMap<String, UrlRecord>>,
    // 0 means unbounded
    capacity: usize,
}

impl VisitedSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Checks capacity, then membership, then inserts, as one atomic step.
    pub fn admit(&self, record: UrlRecord) -> Admission {
        let mut records = self.lock();
        if self.is_full(records.len()) {
            return Admission::Full;
        }
        if records.contains_key(record.url()) {
            return Admission::Duplicate;
        }
        records.insert(record.url().to_string(), record);
        Admission::Admitted
    }

    /// Returns true iff the URL was newly admitted.
    pub fn insert(&self, record: UrlRecord) -> bool {
        self.admit(record) == Admission::Admitted
    }

    /// Membership test; `url` is normalized before lookup.
    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains_key(&normalize(url))
    }

    /// The record stored for `url`, if any.
    pub fn get(&self, url: &str) -> Option<UrlRecord> {
        self.lock().get(&normalize(url)).cloned()
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn full(&self) -> bool {
        let len = self.lock().len();
        self.is_full(len)
    }

    pub fn capacity(&self) -> Option<usize> {
        (self.capacity > 0).then_some(self.capacity)
    }

    /// Snapshot of all admitted records, shallowest first.
    pub fn records(&self) -> Vec<UrlRecord> {
        let mut records: Vec<UrlRecord> = self.lock().values().cloned().collect();
        records.sort_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.url().cmp(b.url())));
        records
    }

    fn is_full(&self, len: usize) -> bool {
        self.capacity > 0 && len >= self.capacity
    }

    // A panic while holding the lock can't leave the map half-updated
    // (every mutation is a single insert), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, UrlRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why one lock for check-capacity, check-duplicate and insert?
//    - With separate steps, two tasks could both see "one slot left" and
//      both insert, pushing the set past max_count
//    - Under one lock the set can never hold more than its capacity
//
// 2. What does into_inner() on a poisoned lock do?
//    - A Mutex is "poisoned" if a thread panicked while holding it
//    - Our critical sections leave the map consistent, so we just take
//      the data back and keep going instead of panicking too
//
// 3. Why does contains() normalize its argument?
//    - Keys are stored normalized, so "http://a.test/" and "http://a.test"
//      must look up the same entry
// -----------------------------------------------------------------------------
