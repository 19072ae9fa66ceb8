//! Configuration Module
//!
//! Handles loading cache and server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::DEFAULT_TTL;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory holding the shard directories
    pub root: PathBuf,
    /// Number of shard directories below the root
    pub max_path: u32,
    /// Number of bucket files per shard directory
    pub max_file: u32,
    /// GC probability per `set`, in parts per million
    pub gc_probability: u32,
    /// TTL in seconds applied when the caller gives none
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Periodic sweep interval in seconds, 0 disables the task
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FILECACHE_ROOT` - Cache root directory (default: `cache`)
    /// - `FILECACHE_MAX_PATH` - Shard directory count (default: 100)
    /// - `FILECACHE_MAX_FILE` - Bucket files per directory (default: 50000)
    /// - `FILECACHE_GC_PROBABILITY` - GC chance per write, per million (default: 100)
    /// - `FILECACHE_DEFAULT_TTL` - Default TTL in seconds (default: one year)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Background sweep frequency in seconds (default: 0, off)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            root: env::var("FILECACHE_ROOT")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.root),
            max_path: env_or("FILECACHE_MAX_PATH", defaults.max_path),
            max_file: env_or("FILECACHE_MAX_FILE", defaults.max_file),
            gc_probability: env_or("FILECACHE_GC_PROBABILITY", defaults.gc_probability),
            default_ttl: env_or("FILECACHE_DEFAULT_TTL", defaults.default_ttl),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            sweep_interval: env_or("SWEEP_INTERVAL", defaults.sweep_interval),
        }
    }

    /// Returns a default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("cache"),
            max_path: 100,
            max_file: 50_000,
            gc_probability: 100,
            default_ttl: DEFAULT_TTL,
            server_port: 3000,
            sweep_interval: 0,
        }
    }
}
