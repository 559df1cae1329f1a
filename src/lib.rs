// src/lib.rs
// Public library surface for the widget binary and integration tests.

pub mod config;
pub mod metrics;
pub mod rpc;
pub mod storage;

// Feed model + seen-version reconciliation
pub mod feed;
pub mod prompt;
pub mod seen;

// Widgets
pub mod changelog;
pub mod feedback;
pub mod toggle;

// ---- Re-exports for stable public API ----
pub use crate::changelog::{ChangelogBell, ChangelogIndicator};
pub use crate::config::WidgetConfig;
pub use crate::feed::{ContentFeed, FeedEntry, FeedMetadata, FeedSnapshot};
pub use crate::feedback::{ContactForm, StarRating};
pub use crate::prompt::{extract_highlights, UpdatePrompt, UpdatePromptPolicy};
pub use crate::rpc::http::HttpRpcClient;
pub use crate::rpc::types::{InteractionAggregate, InteractionTarget};
pub use crate::rpc::{DynRpcClient, RpcClient, WidgetApi};
pub use crate::seen::{SeenState, SeenStatus, SeenVersionTracker};
pub use crate::storage::{
    FileStore, KeyValueStore, MemoryStore, SharedStore, StorageKeys, UnavailableStore,
};
pub use crate::toggle::{FailurePolicy, InteractionToggle, Submission, ToggleOutcome, ToggleView};

use std::sync::Arc;

/// Everything a host needs to build widgets: one RPC facade, one store.
#[derive(Clone)]
pub struct WidgetContext {
    pub config: WidgetConfig,
    pub api: WidgetApi,
    pub store: SharedStore,
}

impl WidgetContext {
    pub fn new(config: WidgetConfig, client: DynRpcClient, store: SharedStore) -> Self {
        Self {
            config,
            api: WidgetApi::new(client),
            store,
        }
    }

    /// HTTP transport and the configured store.
    pub fn from_config(config: WidgetConfig) -> anyhow::Result<Self> {
        let client: DynRpcClient = Arc::new(HttpRpcClient::from_config(&config.rpc)?);
        let store = config.storage.open_store();
        Ok(Self::new(config, client, store))
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.config.storage.keys
    }

    pub fn seen_tracker(&self) -> SeenVersionTracker {
        SeenVersionTracker::loaded(self.store.clone(), self.keys(), self.config.feed.kind.clone())
    }

    pub fn feed(&self, limit: u32) -> ContentFeed {
        ContentFeed::new(self.api.clone(), self.config.feed.kind.clone(), limit)
    }

    pub fn bell(&self) -> ChangelogBell {
        ChangelogBell::from_config(self.api.clone(), self.store.clone(), self.keys(), &self.config.feed)
    }

    pub fn indicator(&self) -> ChangelogIndicator {
        ChangelogIndicator::from_config(
            self.api.clone(),
            self.store.clone(),
            self.keys(),
            &self.config.feed,
        )
    }

    pub fn update_prompt(&self) -> UpdatePromptPolicy {
        UpdatePromptPolicy::from_config(self.seen_tracker(), &self.config.feed)
    }

    pub fn toggle(&self, target: InteractionTarget) -> InteractionToggle {
        InteractionToggle::new(self.api.clone(), self.store.clone(), self.keys(), target)
            .with_policy(self.config.toggle.on_submit_failure)
    }
}
