//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - GC Sweep: Removes expired shard files at a fixed interval, on top of
//!   the probabilistic sweep that writes trigger

mod sweep;

pub use sweep::spawn_sweep_task;
