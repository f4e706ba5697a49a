use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::cache::Cache;

/// Spawns the periodic expiry sweep for a cache.
///
/// The task holds only a weak handle: dropping the cache ends the loop at
/// its next tick, and `stop_cleaning` aborts it immediately. Either way no
/// timer outlives the namespace that owns it.
pub(crate) fn spawn(cache: Weak<Cache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await; // skip the first immediate tick
        loop {
            interval.tick().await;
            let Some(cache) = cache.upgrade() else {
                break;
            };
            cache.sweep().await;
        }
    })
}
