//! Calculator - a small calculation HTTP service with a durable result cache
//!
//! Evaluates arithmetic requests and caches their results on disk, keyed by
//! a canonical request fingerprint, with TTL expiration, LRU eviction and a
//! single-flight guarantee for concurrent duplicate requests.

pub mod api;
pub mod cache;
pub mod calc;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
