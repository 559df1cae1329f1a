//! Changelog bell and unread indicator.
//!
//! The bell owns a [`ContentFeed`] and a [`SeenVersionTracker`] for the same
//! kind. Opening the panel acknowledges the latest version.

use crate::config::FeedConfig;
use crate::feed::{ContentFeed, FeedEntry};
use crate::rpc::WidgetApi;
use crate::seen::{SeenStatus, SeenVersionTracker};
use crate::storage::{SharedStore, StorageKeys};

pub struct ChangelogBell {
    feed: ContentFeed,
    tracker: SeenVersionTracker,
    open: bool,
}

impl ChangelogBell {
    pub fn new(feed: ContentFeed, tracker: SeenVersionTracker) -> Self {
        Self {
            feed,
            tracker,
            open: false,
        }
    }

    pub fn from_config(
        api: WidgetApi,
        store: SharedStore,
        keys: &StorageKeys,
        cfg: &FeedConfig,
    ) -> Self {
        let feed = ContentFeed::new(api, cfg.kind.clone(), cfg.bell_limit);
        let tracker = SeenVersionTracker::loaded(store, keys, cfg.kind.clone());
        Self::new(feed, tracker)
    }

    pub async fn refresh(&mut self) -> SeenStatus {
        self.feed.refresh().await;
        self.sync()
    }

    fn sync(&mut self) -> SeenStatus {
        self.tracker.observe(self.feed.snapshot());
        if self.open {
            self.tracker.acknowledge();
        }
        self.tracker.status()
    }

    /// Red dot on the bell.
    pub fn badge(&self) -> bool {
        self.tracker.has_unread()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) -> SeenStatus {
        self.open = open;
        self.sync()
    }

    pub fn is_loading(&self) -> bool {
        self.feed.is_loading()
    }

    pub fn entries(&self) -> &[FeedEntry] {
        self.feed.items()
    }

    pub fn feed(&self) -> &ContentFeed {
        &self.feed
    }
}

/// Bare unread dot; visible only while something is unread.
pub struct ChangelogIndicator {
    feed: ContentFeed,
    tracker: SeenVersionTracker,
}

impl ChangelogIndicator {
    pub fn from_config(
        api: WidgetApi,
        store: SharedStore,
        keys: &StorageKeys,
        cfg: &FeedConfig,
    ) -> Self {
        Self {
            feed: ContentFeed::new(api, cfg.kind.clone(), cfg.indicator_limit),
            tracker: SeenVersionTracker::loaded(store, keys, cfg.kind.clone()),
        }
    }

    pub async fn refresh(&mut self) -> bool {
        self.feed.refresh().await;
        // pick up acknowledgements made by other widgets on the same store
        self.tracker.load();
        self.tracker.observe(self.feed.snapshot());
        self.visible()
    }

    pub fn visible(&self) -> bool {
        self.tracker.has_unread()
    }
}
