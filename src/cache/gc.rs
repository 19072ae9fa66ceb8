//! Garbage collection for the shard tree.
//!
//! GC is driven by writes: before each `set` the store asks its
//! [`GcTrigger`] whether to sweep. A sweep deletes every shard file whose
//! modification time lies in the past, which is the expiry of the last entry
//! written to it.

use std::path::Path;

use rand::Rng;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::cache::clock::{to_unix_secs, Clock};
use crate::cache::TEMP_FILE_PREFIX;

/// Decides whether a write should run a sweep first.
pub trait GcTrigger: Send + Sync {
    fn should_collect(&self) -> bool;
}

impl<F> GcTrigger for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn should_collect(&self) -> bool {
        self()
    }
}

// == Probability ==
/// Fires when a uniform draw from `[0, 1_000_000)` falls below `per_million`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probability {
    pub per_million: u32,
}

impl Probability {
    pub const SCALE: u32 = 1_000_000;

    pub fn new(per_million: u32) -> Self {
        Self { per_million }
    }
}

impl GcTrigger for Probability {
    fn should_collect(&self) -> bool {
        rand::thread_rng().gen_range(0..Self::SCALE) < self.per_million
    }
}

/// Never sweeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl GcTrigger for Never {
    fn should_collect(&self) -> bool {
        false
    }
}

/// Sweeps before every write.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl GcTrigger for Always {
    fn should_collect(&self) -> bool {
        true
    }
}

// == Sweep ==
/// Age after which an abandoned temp file is reclaimed
pub const STALE_TEMP_SECS: i64 = 3600;

/// Deletes every file below `root` whose modification time is before now.
///
/// Best effort: unreadable entries and failed deletions are skipped. Names
/// starting with `.` are left alone, except temp files left behind by an
/// interrupted write, which go once they are [`STALE_TEMP_SECS`] old.
/// Returns the number of files removed.
pub fn sweep(root: &Path, clock: &dyn Clock) -> usize {
    let mut removed = 0;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e) || is_temp_file(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("GC: skipping unreadable entry: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let modified = match entry.metadata().ok().and_then(|m| m.modified().ok()) {
            Some(modified) => to_unix_secs(modified),
            None => continue,
        };

        // "now" is re-read per file; a long sweep sees the threshold move
        let mut threshold = clock.now();
        if is_temp_file(&entry) {
            threshold = threshold.saturating_sub(STALE_TEMP_SECS);
        }

        if modified < threshold {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(err) => debug!("GC: could not remove {}: {}", entry.path().display(), err),
            }
        }
    }

    removed
}

fn file_name(entry: &DirEntry) -> Option<&str> {
    entry.file_name().to_str()
}

fn is_hidden(entry: &DirEntry) -> bool {
    file_name(entry).is_some_and(|name| name.starts_with('.'))
}

fn is_temp_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && file_name(entry).is_some_and(|name| name.starts_with(TEMP_FILE_PREFIX))
}
