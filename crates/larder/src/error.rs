use thiserror::Error;

/// A failure surfaced by the write path.
///
/// The cache is an optimization layer: invalid keys, missing files and
/// corrupt records all degrade to a miss instead of failing the caller.
/// Only writes can fail observably, because a failed write means the value
/// was not cached and the caller may want to know.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache directory or a record file could not be written or removed.
    #[error("cache i/o failed")]
    Io(#[from] std::io::Error),

    /// The value could not be serialized to JSON.
    #[error("failed to serialize cache value")]
    Serialize(#[from] serde_json::Error),
}
