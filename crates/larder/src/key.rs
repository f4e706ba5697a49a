use std::path::{Path, PathBuf};

/// Extension carried by every record file.
const RECORD_EXT: &str = ".json";

/// Longest sanitized stem kept before the extension is appended.
const MAX_STEM_LEN: usize = 100;

/// Turns an arbitrary cache key into a safe record file name.
///
/// Leading dots and path separators are stripped so the result can neither
/// escape the cache directory nor turn into a hidden or parent reference.
/// Every remaining character outside `[A-Za-z0-9._-]` maps to `-`, the stem
/// is capped at 100 characters, and the `.json` extension is appended.
/// Equal keys always produce equal names.
///
/// Returns `None` for keys with nothing left after stripping; such keys
/// cannot name a record file and the cache operations ignore them.
pub(crate) fn record_file_name(key: &str) -> Option<String> {
    let stem = key.trim_start_matches(['.', '/', '\\']);
    if stem.is_empty() {
        return None;
    }

    let mut name: String = stem
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '-',
        })
        .collect();
    // sanitized names are pure ASCII, so this cannot split a character
    name.truncate(MAX_STEM_LEN);
    name.push_str(RECORD_EXT);
    Some(name)
}

/// Path of the record file backing `key` inside `dir`.
pub(crate) fn record_path(dir: &Path, key: &str) -> Option<PathBuf> {
    record_file_name(key).map(|name| dir.join(name))
}

/// Replaces path-hostile characters in a namespace name before it becomes a
/// directory segment under the cache root.
///
/// Protects against `..`, absolute paths and `:`.
pub(crate) fn safe_dir_segment(name: &str) -> String {
    name.replace(['.', '/', '\\', ':'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_same_name() {
        assert_eq!(record_file_name("pages/home"), record_file_name("pages/home"));
        assert_eq!(record_file_name("pages/home").unwrap(), "pages-home.json");
    }

    #[test]
    fn traversal_prefixes_are_stripped() {
        assert_eq!(record_file_name("../../../weird$key").unwrap(), "weird-key.json");
        assert_eq!(record_file_name("weird$key").unwrap(), "weird-key.json");
        assert_eq!(record_file_name("...x").unwrap(), "x.json");
    }

    #[test]
    fn names_never_leave_the_directory() {
        let dir = Path::new("/var/cache/app/pages");
        for key in ["../../etc/passwd", "/absolute", "\\\\share\\x", "a/../../b"] {
            let path = record_path(dir, key).unwrap();
            assert!(path.starts_with(dir), "{key} escaped to {}", path.display());
        }
    }

    #[test]
    fn hostile_characters_become_hyphens() {
        assert_eq!(record_file_name("a b:c*d").unwrap(), "a-b-c-d.json");
        assert_eq!(record_file_name("héllo").unwrap(), "h-llo.json");
    }

    #[test]
    fn long_keys_are_truncated() {
        let name = record_file_name(&"x".repeat(500)).unwrap();
        assert_eq!(name.len(), 100 + RECORD_EXT.len());
    }

    #[test]
    fn dot_only_keys_are_invalid() {
        assert_eq!(record_file_name(""), None);
        assert_eq!(record_file_name("..."), None);
        assert_eq!(record_file_name(".././/"), None);
    }

    #[test]
    fn dir_segments_are_neutralized() {
        assert_eq!(safe_dir_segment("../evil"), "___evil");
        assert_eq!(safe_dir_segment("pages"), "pages");
    }
}
