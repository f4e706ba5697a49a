//! Metric names and registration.
//!
//! Counters are emitted through the [`metrics`] facade and carry a `cache`
//! label with the namespace name. The embedding application installs the
//! recorder; without one the macros are no-ops.

use std::sync::Once;

use metrics::{Unit, describe_counter};

/// Reads served from a live record.
pub const METRIC_HIT_TOTAL: &str = "larder_cache_hit_total";
/// Reads that fell through to the caller.
pub const METRIC_MISS_TOTAL: &str = "larder_cache_miss_total";
/// Records written to disk.
pub const METRIC_WRITE_TOTAL: &str = "larder_cache_write_total";
/// Entries removed by capacity eviction.
pub const METRIC_EVICT_TOTAL: &str = "larder_cache_evict_total";
/// Entries removed because their deadline passed.
pub const METRIC_EXPIRED_TOTAL: &str = "larder_cache_expired_total";
/// Index entries rebuilt from disk.
pub const METRIC_RECOVERED_TOTAL: &str = "larder_cache_recovered_total";
/// Unreadable record files deleted.
pub const METRIC_CORRUPT_TOTAL: &str = "larder_cache_corrupt_total";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Registers descriptions for all cache metrics with the installed
/// recorder. Safe to call more than once.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_HIT_TOTAL,
            Unit::Count,
            "Total number of reads served from a live cache record."
        );
        describe_counter!(
            METRIC_MISS_TOTAL,
            Unit::Count,
            "Total number of reads that fell through to the caller."
        );
        describe_counter!(
            METRIC_WRITE_TOTAL,
            Unit::Count,
            "Total number of cache records written to disk."
        );
        describe_counter!(
            METRIC_EVICT_TOTAL,
            Unit::Count,
            "Total number of entries removed by capacity eviction."
        );
        describe_counter!(
            METRIC_EXPIRED_TOTAL,
            Unit::Count,
            "Total number of entries removed past their deadline."
        );
        describe_counter!(
            METRIC_RECOVERED_TOTAL,
            Unit::Count,
            "Total number of index entries rebuilt from on-disk records."
        );
        describe_counter!(
            METRIC_CORRUPT_TOTAL,
            Unit::Count,
            "Total number of unreadable record files deleted."
        );
    });
}
