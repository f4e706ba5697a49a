//! Helpers for testing the cache engine.
//!
//! When writing tests, keep the following points in mind:
//!
//!  - In every test, call [`setup`]. This will set up the logger so that all
//!    console output is captured by the test runner.
//!
//!  - When using [`tempdir`], hold the handle for the entire lifetime of the
//!    test. When dropped too early the directory disappears under the cache,
//!    which then recreates it lazily on the next write and the test asserts
//!    against a stale view. Assign it to a variable in the test function
//!    (e.g. `let root = tempdir()`).
//!
//!  - Use [`write_record`] and [`record_body`] to drop fixture files into a
//!    namespace directory *before* opening it, to exercise the recovery
//!    paths over pre-existing disk state.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::fmt;

pub use tempfile::TempDir;

/// Setup the test environment.
///
///  - Initializes logs: the logger only captures logs from the `larder`
///    crate and mutes everything else.
pub fn setup() {
    fmt()
        .with_env_filter(EnvFilter::new("larder=trace"))
        .with_target(false)
        .pretty()
        .with_test_writer()
        .try_init()
        .ok();
}

/// Creates a temporary directory.
///
/// The directory is deleted when the [`TempDir`] instance is dropped. Use it
/// as a guard to automatically clean up after tests.
pub fn tempdir() -> TempDir {
    TempDir::new().unwrap()
}

/// Writes raw bytes as a record file inside `dir`, creating the directory
/// first. Returns the file path.
pub fn write_record(dir: &Path, file_name: &str, contents: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(file_name);
    fs::write(&path, contents).unwrap();
    path
}

/// A well-formed record body for fixture files.
pub fn record_body(data: Value, added_at: i64, expires_at: Option<i64>) -> String {
    serde_json::json!({
        "data": data,
        "addedAt": added_at,
        "expiresAt": expires_at,
    })
    .to_string()
}

/// Sorted file names inside `dir`; empty if the directory does not exist.
pub fn basenames(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<_> = entries
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}
