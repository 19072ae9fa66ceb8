//! filecache - A sharded filesystem cache
//!
//! Stores keyed values in hashed shard files with per-entry TTL, sweeps
//! expired files probabilistically, and caches generated output fragments.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStore, FragmentCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
