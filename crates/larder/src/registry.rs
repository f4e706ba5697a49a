use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::cache::Cache;
use crate::config::CacheOptions;
use crate::key::safe_dir_segment;

/// Name used when a caller does not pick a namespace.
pub const DEFAULT_CACHE_NAME: &str = "default";

pub(crate) type CacheMap = Mutex<HashMap<String, Arc<Cache>>>;

/// Process-wide access point for named caches.
///
/// Owned by application startup and passed around by handle (cloning shares
/// the underlying map); at most one live [`Cache`] exists per name.
/// Instances are created lazily on first lookup and stay registered until
/// [`Cache::clear`] or [`CacheRegistry::delete`] frees their slot.
#[derive(Debug, Clone)]
pub struct CacheRegistry {
    root: PathBuf,
    caches: Arc<CacheMap>,
}

impl CacheRegistry {
    /// Creates a registry rooted at `root`. Namespace directories appear
    /// beneath it on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CacheRegistry {
            root: root.into(),
            caches: Arc::default(),
        }
    }

    /// Returns the cache for `name`, created with default options if it
    /// does not exist yet.
    ///
    /// Must run inside a Tokio runtime: a fresh instance spawns its
    /// background cleaner.
    pub fn get(&self, name: &str) -> Arc<Cache> {
        self.get_with_options(name, &CacheOptions::default())
    }

    /// Returns the cache for `name`, creating it with `options`.
    ///
    /// Options apply on first creation only; an existing instance is
    /// returned unchanged. An empty name falls back to
    /// [`DEFAULT_CACHE_NAME`].
    pub fn get_with_options(&self, name: &str, options: &CacheOptions) -> Arc<Cache> {
        let name = if name.is_empty() { DEFAULT_CACHE_NAME } else { name };
        let mut slots = self.caches.lock().unwrap();
        if let Some(cache) = slots.get(name) {
            return Arc::clone(cache);
        }

        let path = self.root.join(safe_dir_segment(name));
        let cache = Cache::new(name, path, options.resolve(), Arc::downgrade(&self.caches));
        cache.start_cleaning();
        slots.insert(name.to_owned(), Arc::clone(&cache));
        tracing::debug!(cache = name, config = ?cache.config(), "opened cache namespace");
        cache
    }

    /// Stops `name`'s cleaner and frees its slot; a no-op for unknown
    /// names. Record files stay on disk, ready for recovery by a future
    /// instance; use [`Cache::clear`] to destroy them too.
    pub fn delete(&self, name: &str) {
        let cache = self.caches.lock().unwrap().remove(name);
        if let Some(cache) = cache {
            cache.stop_cleaning();
        }
    }

    /// Whether a live instance for `name` currently exists.
    pub fn contains(&self, name: &str) -> bool {
        self.caches.lock().unwrap().contains_key(name)
    }
}
