use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use tracing::warn;

/// Reserved IDs for built-in rule sources. User lists are always positive;
/// the non-positive space belongs to the core.
pub mod builtin {
    pub const CUSTOM_RULES: i32 = -1;
    pub const OS_HOSTS: i32 = -2;
    pub const BLOCKED_SERVICES: i32 = -3;
    pub const PARENTAL: i32 = -4;
    pub const SAFE_BROWSING: i32 = -5;
    pub const SAFE_SEARCH: i32 = -6;
}

/// Metadata of one filter list (a named, versioned rule source).
///
/// Content lives on disk at `file_path()`; only the Filter Lifecycle mutates
/// it. Name/URL/enabled are mutated by admin actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterListConf {
    pub id: i32,

    pub enabled: bool,

    /// `http(s)` URL or an absolute filesystem path.
    pub url: String,

    pub name: String,

    #[serde(default)]
    pub rules_count: u32,

    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,

    /// CRC32 of the on-disk rule-list bytes.
    #[serde(default)]
    pub checksum: u32,

    /// True when the list contributes allow rules instead of block rules.
    /// Derived from which config section the list came from, not persisted.
    #[serde(skip)]
    pub white: bool,

    /// Set when the display name was given by the user rather than taken
    /// from a `! Title:` header, so refreshes never overwrite it.
    #[serde(skip)]
    pub user_named: bool,
}

impl FilterListConf {
    pub fn new(id: i32, url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            enabled: true,
            url: url.into(),
            name: name.into(),
            rules_count: 0,
            last_updated: None,
            checksum: 0,
            white: false,
            user_named: false,
        }
    }

    /// Canonical on-disk location: `<data_dir>/filters/<id>.txt`.
    pub fn file_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join("filters").join(format!("{}.txt", self.id))
    }

    /// True when the source is a local file rather than a URL.
    pub fn is_local_source(&self) -> bool {
        Path::new(&self.url).is_absolute()
    }
}

/// Thread-safe monotonic filter-ID generator, seeded from the clock at
/// startup so IDs stay unique across restarts without persistence.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicI32,
}

impl IdGenerator {
    pub fn new() -> Self {
        let seed = (Utc::now().timestamp() & i64::from(i32::MAX)) as i32;
        Self {
            next: AtomicI32::new(seed.max(1)),
        }
    }

    pub fn next(&self) -> i32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Reassign duplicate or zero IDs across all loaded lists.
///
/// Runs once at startup, before any storage is built. Emits a warning per
/// reassignment; the invariant afterwards is pairwise-distinct non-zero IDs.
pub fn normalize_filter_ids(lists: &mut [&mut FilterListConf], gen: &IdGenerator) {
    let mut seen = std::collections::HashSet::new();
    for list in lists.iter_mut() {
        if list.id == 0 || !seen.insert(list.id) {
            let old = list.id;
            list.id = gen.next();
            while !seen.insert(list.id) {
                list.id = gen.next();
            }
            warn!(old_id = old, new_id = list.id, url = %list.url, "Reassigned filter list ID");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_uses_id() {
        let f = FilterListConf::new(7, "https://example.org/list.txt", "seven");
        assert_eq!(
            f.file_path(Path::new("/var/lib/dnswarden")),
            PathBuf::from("/var/lib/dnswarden/filters/7.txt")
        );
    }

    #[test]
    fn test_local_source_detection() {
        let url = FilterListConf::new(1, "https://example.org/a.txt", "a");
        let path = FilterListConf::new(2, "/etc/filters/a.txt", "b");
        assert!(!url.is_local_source());
        assert!(path.is_local_source());
    }

    #[test]
    fn test_normalize_reassigns_zero_and_duplicate_ids() {
        let gen = IdGenerator::new();
        let mut a = FilterListConf::new(5, "https://one", "one");
        let mut b = FilterListConf::new(5, "https://two", "two");
        let mut c = FilterListConf::new(0, "https://three", "three");
        normalize_filter_ids(&mut [&mut a, &mut b, &mut c], &gen);

        assert_eq!(a.id, 5);
        assert_ne!(b.id, 5);
        assert_ne!(c.id, 0);
        assert_ne!(b.id, c.id);
    }

    #[test]
    fn test_id_generator_monotonic() {
        let gen = IdGenerator::new();
        let first = gen.next();
        let second = gen.next();
        assert_eq!(second, first + 1);
        assert!(first > 0);
    }
}
