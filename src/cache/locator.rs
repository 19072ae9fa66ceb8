//! Shard Locator Module
//!
//! Maps keys to their `root/<directory>/<bucket>` file.

use std::path::{Path, PathBuf};

use crate::cache::hash;
use crate::error::{CacheError, Result};

// == Shard Locator ==
/// Places keys into `max_path` directories of `max_file` bucket files each.
///
/// Directory and bucket are both taken from the same hash value, so keys that
/// share a hash always share a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardLocator {
    max_path: u32,
    max_file: u32,
}

impl ShardLocator {
    // == Constructor ==
    /// Creates a locator, rejecting zero shard counts.
    pub fn new(max_path: u32, max_file: u32) -> Result<Self> {
        if max_path == 0 || max_file == 0 {
            return Err(CacheError::InvalidConfig(format!(
                "max_path and max_file must be at least 1 (got {max_path} and {max_file})"
            )));
        }
        Ok(Self { max_path, max_file })
    }

    pub fn directory_index(&self, hash: u32) -> u32 {
        hash % self.max_path
    }

    pub fn bucket_index(&self, hash: u32) -> u32 {
        hash % self.max_file
    }

    /// Returns `(directory_index, bucket_index)` for a key.
    pub fn locate(&self, key: &str) -> (u32, u32) {
        let hash = hash(key);
        (self.directory_index(hash), self.bucket_index(hash))
    }

    /// Returns the shard file path of a key below `root`.
    pub fn file_path(&self, root: &Path, key: &str) -> PathBuf {
        let (dir, bucket) = self.locate(key);
        root.join(dir.to_string()).join(bucket.to_string())
    }
}
