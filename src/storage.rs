//! # Local persistence
//! Synchronous string key-value stores injected into trackers and toggles.
//!
//! One store instance is created per process and shared as [`SharedStore`].
//! Reads never fail: a store that cannot answer behaves as empty.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};

/// Durable per-origin key-value surface (`localStorage`-like).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;

// ------------------------------------------------------------
// Key layout
// ------------------------------------------------------------

pub const DEFAULT_SEEN_PREFIX: &str = "fluxlynx:lastChangelogVersion";
pub const DEFAULT_INTERACTION_PREFIX: &str = "flx_int";

/// Value written for an active interaction flag. Only presence is checked.
pub const INTERACTION_FLAG_VALUE: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StorageKeys {
    #[serde(default = "default_seen_prefix")]
    pub seen_prefix: String,
    #[serde(default = "default_interaction_prefix")]
    pub interaction_prefix: String,
}

fn default_seen_prefix() -> String {
    DEFAULT_SEEN_PREFIX.to_string()
}
fn default_interaction_prefix() -> String {
    DEFAULT_INTERACTION_PREFIX.to_string()
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            seen_prefix: default_seen_prefix(),
            interaction_prefix: default_interaction_prefix(),
        }
    }
}

impl StorageKeys {
    /// Key holding the last acknowledged version of a feed kind.
    pub fn seen_version(&self, kind: &str) -> String {
        format!("{}:{}", self.seen_prefix, kind)
    }

    /// Key whose presence means "this client submitted `kind` on `target_id`".
    pub fn interaction_flag(&self, kind: &str, target_id: &str) -> String {
        format!("{}_{}_{}", self.interaction_prefix, kind, target_id)
    }
}

// ------------------------------------------------------------
// In-memory store
// ------------------------------------------------------------

/// Process-local store. Used as the default and as the test fake.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("memory store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let map = self.inner.lock().expect("memory store mutex poisoned");
        map.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.inner.lock().expect("memory store mutex poisoned");
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.inner.lock().expect("memory store mutex poisoned");
        map.remove(key);
        Ok(())
    }
}

// ------------------------------------------------------------
// File-backed store
// ------------------------------------------------------------

/// JSON object on disk, rewritten on every mutation.
/// A missing or unparsable file opens as an empty store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let map = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "store file unreadable, starting empty");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            inner: Mutex::new(map),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating store dir {}", dir.display()))?;
            }
        }
        let bytes = serde_json::to_vec_pretty(map).context("serialize store")?;
        fs::write(&self.path, bytes)
            .with_context(|| format!("writing store {}", self.path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let map = self.inner.lock().expect("file store mutex poisoned");
        map.get(key).cloned()
    }

    // memory only changes once the file write succeeded
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.inner.lock().expect("file store mutex poisoned");
        let mut next = map.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *map = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.inner.lock().expect("file store mutex poisoned");
        if !map.contains_key(key) {
            return Ok(());
        }
        let mut next = map.clone();
        next.remove(key);
        self.flush(&next)?;
        *map = next;
        Ok(())
    }
}

// ------------------------------------------------------------
// No persistence (non-browser context)
// ------------------------------------------------------------

/// Permanently empty store; writes are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl UnavailableStore {
    pub fn shared() -> SharedStore {
        Arc::new(Self)
    }
}

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, key: &str, _value: &str) -> Result<()> {
        tracing::trace!(key, "persistence unavailable; write dropped");
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout_matches_widget_defaults() {
        let keys = StorageKeys::default();
        assert_eq!(
            keys.seen_version("changelog"),
            "fluxlynx:lastChangelogVersion:changelog"
        );
        assert_eq!(keys.interaction_flag("like", "t1"), "flx_int_like_t1");
    }

    #[test]
    fn memory_store_set_get_remove() {
        let s = MemoryStore::new();
        assert!(s.get("a").is_none());
        s.set("a", "1").unwrap();
        assert_eq!(s.get("a").as_deref(), Some("1"));
        s.remove("a").unwrap();
        assert!(s.get("a").is_none());
        assert!(s.is_empty());
    }

    #[test]
    fn file_store_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/state.json");
        {
            let s = FileStore::open(&path);
            s.set("k", "v").unwrap();
            s.set("gone", "x").unwrap();
            s.remove("gone").unwrap();
        }
        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("k").as_deref(), Some("v"));
        assert!(reopened.get("gone").is_none());
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        let s = FileStore::open(&path);
        assert!(s.get("anything").is_none());
        s.set("k", "v").unwrap();
        assert_eq!(FileStore::open(&path).get("k").as_deref(), Some("v"));
    }

    #[test]
    fn failed_write_leaves_store_unchanged() {
        let tmp = tempfile::tempdir().unwrap();

        // parent is a regular file, so the directory can't be created
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let s = FileStore::open(blocker.join("state.json"));
        assert!(s.set("k", "v").is_err());
        assert!(s.get("k").is_none());

        // path turns into a directory after a successful write
        let path = tmp.path().join("state.json");
        let s = FileStore::open(&path);
        s.set("k", "v").unwrap();
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        assert!(s.set("k", "w").is_err());
        assert!(s.remove("k").is_err());
        assert_eq!(s.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn unavailable_store_never_remembers() {
        let s = UnavailableStore;
        s.set("k", "v").unwrap();
        assert!(s.get("k").is_none());
        s.remove("k").unwrap();
    }
}
