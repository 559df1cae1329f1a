//! # Content feed
//! Versioned entries of a named feed kind (e.g. `changelog`) and the loader
//! that keeps the last known list for a widget.
//!
//! Entries are decoded leniently at the RPC boundary: anything the core needs
//! gets an explicit default, and an item without a usable `id` is dropped.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::metrics;
use crate::rpc::WidgetApi;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedMetadata {
    pub version: Option<String>,
    pub changes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    pub id: String,
    pub title: String,
    pub body: String,
    pub published_at: Option<DateTime<Utc>>,
    pub metadata: FeedMetadata,
}

impl FeedEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            body: String::new(),
            published_at: None,
            metadata: FeedMetadata::default(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.metadata.version = Some(version.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_changes<I, S>(mut self, changes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.changes = Some(changes.into_iter().map(Into::into).collect());
        self
    }

    /// Version identity for seen-tracking: `metadata.version`, else `id`.
    /// Blank values count as absent.
    pub fn version(&self) -> Option<&str> {
        self.metadata
            .version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| Some(self.id.trim()).filter(|id| !id.is_empty()))
    }

    /// Decode one item of a `content.list` payload. `None` when there is no id.
    pub fn from_value(v: &Value) -> Option<Self> {
        let obj = v.as_object()?;
        let id = scalar_string(obj.get("id")?)?;
        let meta = obj.get("metadata").and_then(Value::as_object);

        let version = meta.and_then(|m| m.get("version")).and_then(scalar_string);
        let changes = meta
            .and_then(|m| m.get("changes"))
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|c| c.as_str().map(str::to_string))
                    .collect::<Vec<_>>()
            });

        Some(Self {
            id,
            title: text_field(obj.get("title")),
            body: text_field(obj.get("body")),
            published_at: obj.get("publishedAt").and_then(parse_timestamp),
            metadata: FeedMetadata { version, changes },
        })
    }
}

/// Strings and numbers both serve as identifiers.
fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_field(v: Option<&Value>) -> String {
    v.and_then(Value::as_str).unwrap_or_default().to_string()
}

/// RFC 3339 string or epoch milliseconds.
fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Last known state of one feed, as seen by a single widget instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub items: Vec<FeedEntry>,
    pub loading: bool,
}

impl FeedSnapshot {
    pub fn loading() -> Self {
        Self {
            items: Vec::new(),
            loading: true,
        }
    }

    pub fn loaded(items: Vec<FeedEntry>) -> Self {
        Self {
            items,
            loading: false,
        }
    }

    pub fn latest(&self) -> Option<&FeedEntry> {
        self.items.first()
    }

    pub fn latest_version(&self) -> Option<&str> {
        self.latest().and_then(FeedEntry::version)
    }
}

/// Loader for one feed kind. Fetch failures keep the last known list.
pub struct ContentFeed {
    api: WidgetApi,
    kind: String,
    limit: u32,
    snapshot: FeedSnapshot,
    last_error: Option<String>,
}

impl ContentFeed {
    pub fn new(api: WidgetApi, kind: impl Into<String>, limit: u32) -> Self {
        Self {
            api,
            kind: kind.into(),
            limit: limit.max(1),
            snapshot: FeedSnapshot::loading(),
            last_error: None,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn snapshot(&self) -> &FeedSnapshot {
        &self.snapshot
    }

    pub fn items(&self) -> &[FeedEntry] {
        &self.snapshot.items
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot.loading
    }

    pub fn latest(&self) -> Option<&FeedEntry> {
        self.snapshot.latest()
    }

    pub fn latest_version(&self) -> Option<&str> {
        self.snapshot.latest_version()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fetch `content.list`. Never fails: on error the previous snapshot stays
    /// (still `loading` if nothing was ever fetched) and the error is recorded.
    pub async fn refresh(&mut self) -> &FeedSnapshot {
        match self.api.content_list(&self.kind, self.limit).await {
            Ok(items) => {
                tracing::debug!(kind = %self.kind, count = items.len(), "feed loaded");
                self.snapshot = FeedSnapshot::loaded(items);
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!(error = ?e, kind = %self.kind, "feed fetch failed; keeping last known state");
                metrics::incr(metrics::FEED_FETCH_ERRORS);
                self.last_error = Some(format!("{e:#}"));
            }
        }
        &self.snapshot
    }
}
