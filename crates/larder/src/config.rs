use std::time::Duration;

use serde::Deserialize;

/// Default cap on indexed entries per namespace.
pub const DEFAULT_MAX_ENTRIES: usize = 500;
/// Default share of entries removed per eviction pass, in percent.
pub const DEFAULT_TRIM_PERCENT: u32 = 10;
/// Default delay between background expiry sweeps.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Raw, not-yet-validated options for one cache namespace.
///
/// Collaborators hand these over when a namespace is first opened, typically
/// deserialized straight out of application configuration. Each field is
/// validated independently and falls back to its default silently; a bad
/// value never fails the caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Cap on indexed entries. Non-positive values fall back to 500.
    pub max_entries: Option<i64>,

    /// Share of entries removed per eviction pass, in percent.
    /// Values outside `(0, 100]` fall back to 10.
    pub trim_percent: Option<i64>,

    /// Delay between background expiry sweeps, e.g. `"30s"`.
    /// Zero falls back to one minute.
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Option<Duration>,
}

impl CacheOptions {
    /// Resolves raw options into a usable configuration, one fallback rule
    /// per field.
    pub fn resolve(&self) -> CacheConfig {
        let max_entries = match self.max_entries {
            Some(n) if n > 0 => n as usize,
            _ => DEFAULT_MAX_ENTRIES,
        };
        let trim_percent = match self.trim_percent {
            Some(p) if (1..=100).contains(&p) => p as u32,
            _ => DEFAULT_TRIM_PERCENT,
        };
        let cleanup_interval = match self.cleanup_interval {
            Some(d) if !d.is_zero() => d,
            _ => DEFAULT_CLEANUP_INTERVAL,
        };

        CacheConfig {
            max_entries,
            trim_percent,
            cleanup_interval,
        }
    }
}

/// Resolved configuration of one cache namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Cap on indexed entries; exceeding it on a write triggers eviction.
    pub max_entries: usize,
    /// Share of entries removed per eviction pass, in percent.
    pub trim_percent: u32,
    /// Delay between background expiry sweeps.
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_entries: DEFAULT_MAX_ENTRIES,
            trim_percent: DEFAULT_TRIM_PERCENT,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_resolve_to_defaults() {
        assert_eq!(CacheOptions::default().resolve(), CacheConfig::default());
    }

    #[test]
    fn valid_options_pass_through() {
        let options = CacheOptions {
            max_entries: Some(5),
            trim_percent: Some(100),
            cleanup_interval: Some(Duration::from_millis(250)),
        };
        let config = options.resolve();
        assert_eq!(config.max_entries, 5);
        assert_eq!(config.trim_percent, 100);
        assert_eq!(config.cleanup_interval, Duration::from_millis(250));
    }

    #[test]
    fn non_positive_max_entries_falls_back() {
        for bad in [0, -1, -500] {
            let options = CacheOptions {
                max_entries: Some(bad),
                ..Default::default()
            };
            assert_eq!(options.resolve().max_entries, DEFAULT_MAX_ENTRIES);
        }
    }

    #[test]
    fn out_of_range_trim_percent_falls_back() {
        for bad in [0, -10, 101, 1000] {
            let options = CacheOptions {
                trim_percent: Some(bad),
                ..Default::default()
            };
            assert_eq!(options.resolve().trim_percent, DEFAULT_TRIM_PERCENT);
        }
    }

    #[test]
    fn zero_cleanup_interval_falls_back() {
        let options = CacheOptions {
            cleanup_interval: Some(Duration::ZERO),
            ..Default::default()
        };
        assert_eq!(options.resolve().cleanup_interval, DEFAULT_CLEANUP_INTERVAL);
    }

    #[test]
    fn options_deserialize_with_humantime_intervals() {
        let options: CacheOptions =
            serde_json::from_str(r#"{"max_entries": 50, "cleanup_interval": "30s"}"#).unwrap();
        let config = options.resolve();
        assert_eq!(config.max_entries, 50);
        assert_eq!(config.trim_percent, DEFAULT_TRIM_PERCENT);
        assert_eq!(config.cleanup_interval, Duration::from_secs(30));
    }
}
