//! Cache Statistics Module
//!
//! Tracks per-process store activity: hits, misses, writes, deletes, expiries
//! and GC sweeps.

use serde::Serialize;

// == Cache Stats ==
/// Counters for one `CacheStore` handle.
///
/// These are in-memory only; other processes sharing the root keep their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (absent, undecodable or expired)
    pub misses: u64,
    /// Number of entries found expired at read time
    pub expired: u64,
    /// Number of successful `set` calls
    pub writes: u64,
    /// Number of successful `delete` calls
    pub deletes: u64,
    /// Number of GC sweeps run
    pub gc_runs: u64,
    /// Files removed across all sweeps
    pub files_swept: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Counts an expired read; also a miss.
    pub fn record_expired(&mut self) {
        self.expired += 1;
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    // == Record Sweep ==
    /// Records one finished GC sweep and how many files it removed.
    pub fn record_sweep(&mut self, removed: usize) {
        self.gc_runs += 1;
        self.files_swept += removed as u64;
    }
}
