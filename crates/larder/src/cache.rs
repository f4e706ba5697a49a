use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tokio::task::JoinHandle;

use crate::cleaner;
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::index::{CacheIndex, IndexEntry};
use crate::key::record_path;
use crate::record::{self, CacheRecord, RecordState};
use crate::registry::CacheMap;
use crate::telemetry::{
    METRIC_CORRUPT_TOTAL, METRIC_EVICT_TOTAL, METRIC_EXPIRED_TOTAL, METRIC_HIT_TOTAL,
    METRIC_MISS_TOTAL, METRIC_RECOVERED_TOTAL, METRIC_WRITE_TOTAL,
};

/// One cache namespace: a directory of record files plus the in-memory
/// index over them.
///
/// Obtained from a [`CacheRegistry`](crate::CacheRegistry), which guarantees
/// one live instance per name. All operations are infallible reads or
/// explicitly fallible writes; see [`CacheError`] for the split.
pub struct Cache {
    name: String,
    path: PathBuf,
    config: CacheConfig,
    /// Guards the index across whole operations, filesystem awaits
    /// included, so same-namespace operations serialize and the last write
    /// for a key always wins.
    index: tokio::sync::Mutex<CacheIndex>,
    /// At most one live sweep task.
    cleaner: Mutex<Option<JoinHandle<()>>>,
    /// Slot map of the owning registry, for freeing our slot on `clear`.
    registry: Weak<CacheMap>,
}

enum Lookup {
    Live,
    Expired,
    Absent,
}

impl Cache {
    pub(crate) fn new(
        name: &str,
        path: PathBuf,
        config: CacheConfig,
        registry: Weak<CacheMap>,
    ) -> Arc<Self> {
        Arc::new(Cache {
            name: name.to_owned(),
            path,
            config,
            index: tokio::sync::Mutex::new(CacheIndex::default()),
            cleaner: Mutex::new(None),
            registry,
        })
    }

    /// The namespace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The directory holding this namespace's record files.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The resolved configuration this namespace was created with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Number of indexed entries.
    pub async fn len(&self) -> usize {
        self.index.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Looks up `key`, returning the cached value if a live record backs it.
    ///
    /// Never fails: unusable keys, missing files, expired or corrupt records
    /// and data of the wrong shape all come back as `None`; chain
    /// `unwrap_or` for a fallback value. A hit bumps the entry's usage
    /// count. Keys the index does not know are recovered from disk, so a
    /// restarted process serves its old cache without a warm-up pass.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let Some(path) = record_path(&self.path, key) else {
            return None;
        };
        let now = record::now_ms();
        let mut index = self.index.lock().await;

        let lookup = match index.get_mut(key) {
            Some(entry) if entry.is_expired(now) => Lookup::Expired,
            Some(entry) => {
                entry.usage_count += 1;
                Lookup::Live
            }
            None => Lookup::Absent,
        };

        match lookup {
            Lookup::Live => match tokio::fs::read(&path).await {
                Ok(bytes) => match record::parse_record(&bytes) {
                    Some(found) => {
                        counter!(METRIC_HIT_TOTAL, "cache" => self.name.clone()).increment(1);
                        serde_json::from_value(found.data).ok()
                    }
                    None => {
                        // recovery owns deleting the file itself
                        tracing::warn!(
                            cache = %self.name,
                            key,
                            "dropping index entry backed by an unparsable record"
                        );
                        index.remove(key);
                        self.count_miss();
                        None
                    }
                },
                Err(e) => {
                    if e.kind() != io::ErrorKind::NotFound {
                        tracing::warn!(
                            error = &e as &dyn std::error::Error,
                            cache = %self.name,
                            key,
                            "failed to read indexed record"
                        );
                    }
                    index.remove(key);
                    self.count_miss();
                    None
                }
            },
            Lookup::Expired => {
                if let Some(entry) = index.remove(key) {
                    remove_record(&entry.path).await;
                }
                counter!(METRIC_EXPIRED_TOTAL, "cache" => self.name.clone()).increment(1);
                self.count_miss();
                None
            }
            Lookup::Absent => self.recover(&mut index, key, path, now).await,
        }
    }

    /// Rebuilds an index entry from the candidate record file, the
    /// cold-start path for keys the index has never seen.
    async fn recover<T: DeserializeOwned>(
        &self,
        index: &mut CacheIndex,
        key: &str,
        path: PathBuf,
        now: i64,
    ) -> Option<T> {
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::debug!(
                        error = &e as &dyn std::error::Error,
                        cache = %self.name,
                        key,
                        "failed to read candidate record"
                    );
                }
                self.count_miss();
                return None;
            }
        };

        match record::evaluate_record(&bytes, now) {
            RecordState::Live(found) => {
                index.insert(
                    key.to_owned(),
                    IndexEntry {
                        path,
                        // the read that recovered the entry counts as a hit
                        usage_count: 1,
                        added_at: found.added_at,
                        expires_at: found.expires_at,
                    },
                );
                counter!(METRIC_RECOVERED_TOTAL, "cache" => self.name.clone()).increment(1);
                counter!(METRIC_HIT_TOTAL, "cache" => self.name.clone()).increment(1);
                serde_json::from_value(found.data).ok()
            }
            RecordState::Expired => {
                remove_record(&path).await;
                counter!(METRIC_EXPIRED_TOTAL, "cache" => self.name.clone()).increment(1);
                self.count_miss();
                None
            }
            RecordState::Corrupt => {
                tracing::warn!(cache = %self.name, key, "deleting corrupt cache record");
                remove_record(&path).await;
                counter!(METRIC_CORRUPT_TOTAL, "cache" => self.name.clone()).increment(1);
                self.count_miss();
                None
            }
        }
    }

    /// Writes `value` under `key`, replacing any prior record.
    ///
    /// With a `ttl` the record expires that far in the future; without one
    /// it lives until evicted or deleted. The record file becomes visible
    /// only through an atomic rename and the index is updated after the
    /// rename, so a reader never observes a partial write. Growing the
    /// index past its cap triggers an eviction pass before this returns.
    ///
    /// Unusable keys are silently ignored.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let Some(path) = record_path(&self.path, key) else {
            return Ok(());
        };
        let now = record::now_ms();
        let written = CacheRecord {
            data: serde_json::to_value(value)?,
            added_at: now,
            expires_at: ttl.map(|d| now + d.as_millis() as i64),
        };

        let mut index = self.index.lock().await;
        tokio::fs::create_dir_all(&self.path).await?;
        self.persist_record(&path, &written)?;
        index.insert(
            key.to_owned(),
            IndexEntry {
                path,
                usage_count: 0,
                added_at: now,
                expires_at: written.expires_at,
            },
        );
        counter!(METRIC_WRITE_TOTAL, "cache" => self.name.clone()).increment(1);

        if index.len() > self.config.max_entries {
            self.evict(&mut index).await;
        }
        Ok(())
    }

    /// Writes the record beside its final location and renames it in place.
    fn persist_record(&self, path: &Path, written: &CacheRecord) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(written)?;
        let mut temp = NamedTempFile::new_in(&self.path)?;
        temp.write_all(&bytes)?;
        temp.persist(path).map_err(|e| CacheError::Io(e.error))?;
        Ok(())
    }

    /// Removes the least-useful slice of the index, coldest first.
    async fn evict(&self, index: &mut CacheIndex) {
        let victims = index.eviction_victims(self.config.trim_percent, self.config.max_entries);
        if victims.is_empty() {
            return;
        }
        let count = victims.len();
        for key in victims {
            if let Some(entry) = index.remove(&key) {
                remove_record(&entry.path).await;
            }
        }
        counter!(METRIC_EVICT_TOTAL, "cache" => self.name.clone()).increment(count as u64);
        tracing::debug!(
            cache = %self.name,
            count,
            remaining = index.len(),
            "evicted cold cache entries"
        );
    }

    /// Drops `key` from the index and disk.
    ///
    /// Missing and unusable keys are no-ops; only a filesystem fault other
    /// than absence surfaces.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let Some(path) = record_path(&self.path, key) else {
            return Ok(());
        };
        let mut index = self.index.lock().await;
        index.remove(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Runs one expiry pass over the index, the body of the background
    /// cleaner. Live entries are left alone regardless of usage. Returns
    /// how many entries were removed.
    pub async fn sweep(&self) -> usize {
        let now = record::now_ms();
        let mut index = self.index.lock().await;
        let expired = index.expired(now);
        if expired.is_empty() {
            return 0;
        }
        let count = expired.len();
        for (key, path) in expired {
            index.remove(&key);
            remove_record(&path).await;
        }
        counter!(METRIC_EXPIRED_TOTAL, "cache" => self.name.clone()).increment(count as u64);
        tracing::debug!(cache = %self.name, count, "swept expired cache entries");
        count
    }

    /// Destroys the namespace: stops the cleaner, empties the index,
    /// removes the directory recursively and frees the registry slot, so
    /// the next lookup by this name builds a fresh instance.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.stop_cleaning();
        {
            let mut index = self.index.lock().await;
            index.clear();
            match tokio::fs::remove_dir_all(&self.path).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(registry) = self.registry.upgrade() {
            let mut slots = registry.lock().unwrap();
            if slots
                .get(&self.name)
                .is_some_and(|cache| std::ptr::eq(cache.as_ref(), self))
            {
                slots.remove(&self.name);
            }
        }
        tracing::debug!(cache = %self.name, "cleared cache namespace");
        Ok(())
    }

    /// Starts the periodic expiry sweep. A no-op while one is running.
    pub fn start_cleaning(self: &Arc<Self>) {
        let mut slot = self.cleaner.lock().unwrap();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        *slot = Some(cleaner::spawn(
            Arc::downgrade(self),
            self.config.cleanup_interval,
        ));
    }

    /// Stops the periodic sweep. A no-op when none is running.
    pub fn stop_cleaning(&self) {
        if let Some(task) = self.cleaner.lock().unwrap().take() {
            task.abort();
        }
    }

    fn count_miss(&self) {
        counter!(METRIC_MISS_TOTAL, "cache" => self.name.clone()).increment(1);
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        // no sweep timer may outlive its namespace
        self.stop_cleaning();
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Best-effort removal: a record that is already gone is fine, anything
/// else is logged and otherwise ignored.
async fn remove_record(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(
                error = &e as &dyn std::error::Error,
                path = %path.display(),
                "failed to remove cache record"
            );
        }
    }
}
