//! In-memory key-value cache with per-entry TTL and lazy eviction.
//!
//! [`cache::ExpiringCache`] is the core type and has no I/O of its own.
//! The [`server`] module puts one explicitly constructed cache behind a
//! RESP endpoint so it can be used from any Redis client.

pub mod args;
pub mod cache;
pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod handlers;
pub mod server;

pub use cache::ExpiringCache;
pub use error::CacheError;
