//! # Seen-version tracking
//! Compares the latest remote version of a feed kind against the version this
//! client last acknowledged.
//!
//! State machine per feed kind:
//! `Unknown → NoneSeen | Seen(v)` once persistence has been read, then
//! `→ Seen(v')` only through [`SeenVersionTracker::acknowledge`].
//!
//! Until persistence is consulted the tracker is not `ready` and never reports
//! unread, so a first paint cannot flash an unread badge.

use crate::feed::FeedSnapshot;
use crate::storage::{SharedStore, StorageKeys};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeenState {
    /// Persistence not consulted yet.
    Unknown,
    /// Consulted; nothing acknowledged.
    NoneSeen,
    Seen(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeenStatus {
    pub has_unread: bool,
    pub ready: bool,
}

pub struct SeenVersionTracker {
    store: SharedStore,
    kind: String,
    key: String,
    state: SeenState,
    latest: Option<String>,
}

impl SeenVersionTracker {
    pub fn new(store: SharedStore, keys: &StorageKeys, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        let key = keys.seen_version(&kind);
        Self {
            store,
            kind,
            key,
            state: SeenState::Unknown,
            latest: None,
        }
    }

    /// Tracker that has already consulted persistence.
    pub fn loaded(store: SharedStore, keys: &StorageKeys, kind: impl Into<String>) -> Self {
        let mut t = Self::new(store, keys, kind);
        t.load();
        t
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn state(&self) -> &SeenState {
        &self.state
    }

    pub fn latest(&self) -> Option<&str> {
        self.latest.as_deref()
    }

    /// Read the persisted version. Re-reading picks up acknowledgements made
    /// by other trackers sharing the store.
    pub fn load(&mut self) -> SeenStatus {
        self.state = match self.store.get(&self.key) {
            Some(v) => SeenState::Seen(v),
            None => SeenState::NoneSeen,
        };
        tracing::debug!(kind = %self.kind, state = ?self.state, "seen state loaded");
        self.status()
    }

    /// Currently known latest version; `None` while loading or when the feed
    /// has nothing versioned.
    pub fn set_latest(&mut self, latest: Option<&str>) -> SeenStatus {
        self.latest = latest
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        self.status()
    }

    pub fn observe(&mut self, feed: &FeedSnapshot) -> SeenStatus {
        self.set_latest(feed.latest_version())
    }

    pub fn is_ready(&self) -> bool {
        self.state != SeenState::Unknown
    }

    pub fn has_unread(&self) -> bool {
        let Some(latest) = self.latest.as_deref() else {
            return false;
        };
        match &self.state {
            SeenState::Unknown => false,
            SeenState::NoneSeen => true,
            SeenState::Seen(v) => v != latest,
        }
    }

    pub fn status(&self) -> SeenStatus {
        SeenStatus {
            has_unread: self.has_unread(),
            ready: self.is_ready(),
        }
    }

    /// Mark the latest version as seen. Persists first, then updates memory.
    /// No-op when no latest version is known.
    ///
    /// A failed write is logged; the in-memory state still moves to `Seen`.
    pub fn acknowledge(&mut self) -> SeenStatus {
        let Some(latest) = self.latest.clone() else {
            return self.status();
        };
        self.acknowledge_version(&latest)
    }

    /// Mark a specific version as seen, even if the current latest has since
    /// been cleared by an empty or failed refetch.
    pub fn acknowledge_version(&mut self, version: &str) -> SeenStatus {
        if let Err(e) = self.store.set(&self.key, version) {
            tracing::warn!(error = ?e, kind = %self.kind, "persisting seen version failed");
        }
        tracing::debug!(kind = %self.kind, version = %version, "version acknowledged");
        self.state = SeenState::Seen(version.to_string());
        self.status()
    }
}
