//! # Larder
//!
//! Namespaced, disk-backed caching for JSON-serializable values, built for
//! the template/asset/config caching needs of a web application: many small
//! documents, read-heavy traffic, and a cache directory that must survive
//! restarts and tolerate whatever it finds on disk.
//!
//! ## Architecture
//!
//! A [`CacheRegistry`] hands out one [`Cache`] per namespace name. Each
//! cache owns a directory of record files, an in-memory index over them,
//! and a background cleaner:
//!
//! - The **index** is the source of truth for fast decisions. Every entry
//!   tracks the record path, a usage count bumped on each hit, and the
//!   write/expiry timestamps.
//! - **Records** are single JSON documents,
//!   `{"data": <any>, "addedAt": <epoch ms>, "expiresAt": <epoch ms | null>}`,
//!   one file per key, written via a tempfile and an atomic rename so a
//!   partially written record is never observable.
//! - **Recovery**: a read for a key the index does not know falls back to
//!   the candidate file on disk. A live record rebuilds its index entry in
//!   place; an expired or corrupt one is deleted. A restarted process
//!   therefore serves its old cache without a warm-up pass, and garbage in
//!   the cache directory cleans itself up lazily.
//! - **Eviction**: when a write grows the index past its configured cap,
//!   the least-used slice (usage count ascending, oldest first on ties) is
//!   dropped, sized as a percentage of the index so eviction stays
//!   proportional to growth.
//! - The **cleaner** sweeps expired entries on a fixed interval,
//!   independent of read traffic, and is cancelled deterministically when
//!   the namespace is cleared or deleted.
//!
//! ## Error philosophy
//!
//! The cache is an optimization layer. Reads never fail: invalid keys,
//! missing files, expired records, corrupt records and type mismatches all
//! come back as `None`, indistinguishable from a key that never existed.
//! Only the write path surfaces errors ([`CacheError`]), since a failed
//! write means the value was not cached.
//!
//! ## Example
//!
//! ```
//! use larder::CacheRegistry;
//! use serde_json::{Value, json};
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), larder::CacheError> {
//! let registry = CacheRegistry::new("/var/cache/app");
//! let templates = registry.get("templates");
//!
//! templates
//!     .set("home", &json!({"title": "Home"}), Some(Duration::from_secs(60)))
//!     .await?;
//! let page: Option<Value> = templates.get("home").await;
//! # Ok(())
//! # }
//! ```
//!
//! Metric names are listed in [`telemetry`]; all counters carry a `cache`
//! label with the namespace name.

mod cache;
mod cleaner;
mod config;
mod error;
mod index;
mod key;
mod record;
mod registry;
pub mod telemetry;


pub use cache::Cache;
pub use config::{
    CacheConfig, CacheOptions, DEFAULT_CLEANUP_INTERVAL, DEFAULT_MAX_ENTRIES, DEFAULT_TRIM_PERCENT,
};
pub use error::CacheError;
pub use record::CacheRecord;
pub use registry::{CacheRegistry, DEFAULT_CACHE_NAME};
