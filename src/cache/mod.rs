//! Cache Module
//!
//! Sharded on-disk caching with per-entry TTL, probabilistic GC sweeps and
//! fragment capture/replay.

mod clock;
mod entry;
mod file;
mod fragment;
mod gc;
mod hasher;
mod locator;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use file::CacheFile;
pub use fragment::{Capture, Fragment, FragmentCache};
pub use gc::{sweep, Always, GcTrigger, Never, Probability, STALE_TEMP_SECS};
pub use hasher::{crc32, hash};
pub use locator::ShardLocator;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default TTL in seconds (one year)
pub const DEFAULT_TTL: u64 = 31_536_000;

/// Name of the per-directory lock file
pub const LOCK_FILE_NAME: &str = ".lock";

/// Name prefix of the temp files shard rewrites go through
pub const TEMP_FILE_PREFIX: &str = ".tmp";
