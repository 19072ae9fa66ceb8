//! Cache Store Module
//!
//! Main cache engine: locates the shard file of a key and runs every mutation
//! as a locked read-modify-write of that file.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fs2::FileExt;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::Builder;
use tracing::{debug, info, warn};

use crate::cache::clock::to_system_time;
use crate::cache::{
    sweep, CacheEntry, CacheFile, CacheStats, Clock, GcTrigger, Probability, ShardLocator,
    SystemClock, LOCK_FILE_NAME, TEMP_FILE_PREFIX,
};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Sharded filesystem cache rooted at one directory.
///
/// All operations take `&self`; a store can be shared between threads, and
/// several processes may open the same root.
pub struct CacheStore {
    /// Absolute cache root
    root: PathBuf,
    /// Key to shard file mapping
    locator: ShardLocator,
    /// Decides whether a write runs a sweep first
    trigger: Box<dyn GcTrigger>,
    /// Source of "now" for expiry
    clock: Box<dyn Clock>,
    /// TTL used by `set_default`
    default_ttl: u64,
    /// Performance statistics
    stats: Mutex<CacheStats>,
}

impl CacheStore {
    // == Constructor ==
    /// Opens a store over `config.root`.
    ///
    /// The root must already exist and be a directory; it is resolved to an
    /// absolute path once, here.
    pub fn open(config: &Config) -> Result<Self> {
        let locator = ShardLocator::new(config.max_path, config.max_file)?;

        let root = config
            .root
            .canonicalize()
            .map_err(|e| CacheError::InvalidRoot {
                path: config.root.clone(),
                reason: e.to_string(),
            })?;
        if !root.is_dir() {
            return Err(CacheError::InvalidRoot {
                path: config.root.clone(),
                reason: "not a directory".to_string(),
            });
        }

        Ok(Self {
            root,
            locator,
            trigger: Box::new(Probability::new(config.gc_probability)),
            clock: Box::new(SystemClock),
            default_ttl: config.default_ttl,
            stats: Mutex::new(CacheStats::new()),
        })
    }

    /// Replaces the GC trigger.
    pub fn with_trigger(mut self, trigger: impl GcTrigger + 'static) -> Self {
        self.trigger = Box::new(trigger);
        self
    }

    /// Replaces the clock used for expiry and sweeps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    /// Returns the shard file a key maps to, without touching the disk.
    pub fn shard_path(&self, key: &str) -> PathBuf {
        self.locator.file_path(&self.root, key)
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl_seconds`.
    ///
    /// Overwrites any previous value of the key. The shard file's modification
    /// time becomes this entry's expiry, whatever else shares the file.
    pub fn set<V>(&self, key: &str, value: &V, ttl_seconds: u64) -> Result<()>
    where
        V: Serialize + ?Sized,
    {
        if self.trigger.should_collect() {
            self.gc();
        }

        let value = serde_json::to_value(value).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

        let path = self.prepare(key)?;
        let _lock = self.lock_shard(&path)?;

        let mut file = read_shard(&path);
        let entry = CacheEntry::new(value, self.clock.now(), ttl_seconds);
        let expires_at = entry.expires_at;
        file.insert(key, entry);

        write_shard(&path, &file, to_system_time(expires_at))?;
        self.stats.lock().record_write();
        debug!("set {} -> {} (expires {})", key, path.display(), expires_at);

        Ok(())
    }

    /// Stores `value` under `key` with the configured default TTL.
    pub fn set_default<V>(&self, key: &str, value: &V) -> Result<()>
    where
        V: Serialize + ?Sized,
    {
        self.set(key, value, self.default_ttl)
    }

    // == Get ==
    /// Retrieves the value of `key`.
    ///
    /// Missing, undecodable, expired and wrongly typed entries are all misses.
    /// An expired entry is deleted on the way out.
    pub fn get<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        let path = match self.prepare(key) {
            Ok(path) => path,
            Err(err) => {
                debug!("get {}: shard unavailable: {}", key, err);
                self.stats.lock().record_miss();
                return None;
            }
        };

        let file = read_shard(&path);
        let Some(entry) = file.get(key) else {
            self.stats.lock().record_miss();
            return None;
        };

        let now = self.clock.now();
        if entry.is_expired(now) {
            debug!("get {}: expired at {}", key, entry.expires_at);
            self.stats.lock().record_expired();
            match self.delete_if_expired(key, now) {
                Ok(true) => {}
                Ok(false) => debug!("get {}: rewritten since read, kept", key),
                Err(err) => warn!("failed to drop expired key {}: {}", key, err),
            }
            return None;
        }

        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => {
                self.stats.lock().record_hit();
                Some(value)
            }
            Err(err) => {
                debug!("get {}: stored value has another type: {}", key, err);
                self.stats.lock().record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes `key` from its shard file.
    ///
    /// The file is removed once no key is left in it; otherwise it is
    /// rewritten with its previous modification time. Deleting an absent key
    /// succeeds.
    pub fn delete(&self, key: &str) -> Result<()> {
        let removed = self.remove_where(key, |_| true)?;
        if removed {
            self.stats.lock().record_delete();
        }
        debug!("delete {} (present: {})", key, removed);
        Ok(())
    }

    /// Drops `key` only if it is still expired at `now` once the shard is
    /// locked, so a value written after the caller's read survives.
    fn delete_if_expired(&self, key: &str, now: i64) -> Result<bool> {
        self.remove_where(key, |entry| entry.is_expired(now))
    }

    /// Locked read-modify-write removing `key` when `should_remove` holds for
    /// its current entry. Returns whether the key was removed.
    fn remove_where<F>(&self, key: &str, should_remove: F) -> Result<bool>
    where
        F: FnOnce(&CacheEntry) -> bool,
    {
        let path = self.prepare(key)?;
        let _lock = self.lock_shard(&path)?;

        let mut file = read_shard(&path);
        let removed = file.get(key).is_some_and(should_remove) && file.remove(key).is_some();

        if file.is_empty() {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(CacheError::Write { path, source }),
            }
        } else if removed {
            let mtime = fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or_else(|_| to_system_time(self.clock.now()));
            write_shard(&path, &file, mtime)?;
        }

        Ok(removed)
    }

    // == GC ==
    /// Sweeps the whole root, removing files whose expiry marker has passed.
    ///
    /// Returns the number of files removed.
    pub fn gc(&self) -> usize {
        let removed = sweep(&self.root, self.clock.as_ref());
        self.stats.lock().record_sweep(removed);

        if removed > 0 {
            info!("GC sweep: removed {} expired cache files", removed);
        } else {
            debug!("GC sweep: no expired cache files found");
        }
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    /// Ensures the shard directory and a placeholder file exist.
    fn prepare(&self, key: &str) -> Result<PathBuf> {
        let path = self.shard_path(key);
        let write_err = |source| CacheError::Write {
            path: path.clone(),
            source,
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(write_err)?;

        Ok(path)
    }

    fn lock_shard(&self, path: &Path) -> Result<ShardLock> {
        let dir = path.parent().unwrap_or(&self.root);
        ShardLock::acquire(dir).map_err(|source| CacheError::Write {
            path: dir.join(LOCK_FILE_NAME),
            source,
        })
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("root", &self.root)
            .field("locator", &self.locator)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

// == Shard Lock ==
/// Exclusive advisory lock on a shard directory, released on drop.
///
/// Every acquisition opens its own handle, so it excludes threads of this
/// process as well as other processes.
struct ShardLock {
    file: File,
}

impl ShardLock {
    fn acquire(dir: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE_NAME))?;
        FileExt::lock_exclusive(&file)?;
        Ok(Self { file })
    }
}

impl Drop for ShardLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Reads and decodes a shard file; anything unreadable is an empty mapping.
fn read_shard(path: &Path) -> CacheFile {
    fs::read(path)
        .map(|bytes| CacheFile::decode(&bytes))
        .unwrap_or_default()
}

/// Replaces a shard file atomically and stamps it with `mtime`.
///
/// The temp file lives next to the target so the rename stays on one
/// filesystem. It keeps its creation time until renamed; sweeps only reclaim
/// temp files that are long past it.
fn write_shard(path: &Path, file: &CacheFile, mtime: SystemTime) -> Result<()> {
    let bytes = file.encode()?;
    let write_err = |source| CacheError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    let persisted = tmp.persist(path).map_err(|e| write_err(e.error))?;
    persisted.set_modified(mtime).map_err(write_err)?;

    Ok(())
}
