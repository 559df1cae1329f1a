//! # Update prompt
//! One-shot "new update available" decision on top of [`SeenVersionTracker`].
//!
//! The prompt opens on the edge where `ready && !loading && has_unread`
//! becomes true, at most once per version. Re-evaluating with unchanged
//! inputs never reopens it; [`UpdatePromptPolicy::dismiss`] acknowledges the
//! version and closes.

use serde::Serialize;

use crate::config::{FeedConfig, DEFAULT_PROMPT_TITLE};
use crate::feed::{FeedEntry, FeedSnapshot};
use crate::metrics;
use crate::seen::{SeenStatus, SeenVersionTracker};

pub const DEFAULT_HIGHLIGHT_COUNT: usize = 3;

/// Content shown while the prompt is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatePrompt {
    pub title: String,
    /// `metadata.version` of the latest entry, when it has one.
    pub version: Option<String>,
    pub highlights: Vec<String>,
    /// Full body; shown when there are no highlights.
    pub body: String,
}

/// Structured `changes` win; otherwise non-blank trimmed body lines.
/// Both are capped at `cap`.
pub fn extract_highlights(entry: &FeedEntry, cap: usize) -> Vec<String> {
    match &entry.metadata.changes {
        Some(changes) => changes.iter().take(cap).cloned().collect(),
        None => entry
            .body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(cap)
            .map(str::to_string)
            .collect(),
    }
}

pub struct UpdatePromptPolicy {
    tracker: SeenVersionTracker,
    title: String,
    highlight_count: usize,
    open: bool,
    opened_for: Option<String>,
    content: Option<UpdatePrompt>,
}

impl UpdatePromptPolicy {
    pub fn new(tracker: SeenVersionTracker) -> Self {
        Self {
            tracker,
            title: DEFAULT_PROMPT_TITLE.to_string(),
            highlight_count: DEFAULT_HIGHLIGHT_COUNT,
            open: false,
            opened_for: None,
            content: None,
        }
    }

    pub fn from_config(tracker: SeenVersionTracker, cfg: &FeedConfig) -> Self {
        Self::new(tracker)
            .with_title(cfg.prompt_title.clone())
            .with_highlight_count(cfg.highlight_count)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_highlight_count(mut self, n: usize) -> Self {
        self.highlight_count = n;
        self
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn status(&self) -> SeenStatus {
        self.tracker.status()
    }

    pub fn tracker(&self) -> &SeenVersionTracker {
        &self.tracker
    }

    /// Visible prompt, if open and the latest entry is versioned.
    pub fn prompt(&self) -> Option<&UpdatePrompt> {
        if self.open {
            self.content.as_ref()
        } else {
            None
        }
    }

    /// Feed the current feed state through the tracker and update the prompt.
    pub fn evaluate(&mut self, feed: &FeedSnapshot) -> Option<&UpdatePrompt> {
        let status = self.tracker.observe(feed);
        let latest = self.tracker.latest().map(str::to_string);

        if !self.open && status.ready && !feed.loading && status.has_unread {
            if latest != self.opened_for {
                self.open = true;
                metrics::incr(metrics::PROMPT_OPENED);
                tracing::debug!(kind = %self.tracker.kind(), version = ?latest, "update prompt opened");
            } else {
                tracing::trace!(version = ?latest, "prompt already shown for this version");
            }
        }
        // an empty refetch while open keeps the version the prompt is showing
        if self.open && latest.is_some() {
            self.opened_for = latest;
        }

        self.content = match (feed.latest(), feed.latest_version()) {
            (Some(entry), Some(_)) => Some(UpdatePrompt {
                title: self.title.clone(),
                version: entry.metadata.version.clone(),
                highlights: extract_highlights(entry, self.highlight_count),
                body: entry.body.clone(),
            }),
            _ => None,
        };
        self.prompt()
    }

    /// Acknowledge the version the prompt opened for and close. No-op when
    /// already closed.
    pub fn dismiss(&mut self) -> bool {
        if !self.open {
            return false;
        }
        match self.opened_for.clone() {
            Some(version) => self.tracker.acknowledge_version(&version),
            None => self.tracker.acknowledge(),
        };
        self.open = false;
        tracing::debug!(kind = %self.tracker.kind(), "update prompt dismissed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_changes_take_precedence() {
        let e = FeedEntry::new("a")
            .with_body("ignored line")
            .with_changes(["one", "two", "three", "four"]);
        assert_eq!(extract_highlights(&e, 3), vec!["one", "two", "three"]);
    }

    #[test]
    fn body_lines_are_trimmed_and_blank_lines_dropped() {
        let e = FeedEntry::new("a").with_body("  first  \n\n   \r\nsecond\n\t\nthird\nfourth");
        assert_eq!(extract_highlights(&e, 3), vec!["first", "second", "third"]);
        assert!(extract_highlights(&FeedEntry::new("a").with_body(" \n \n"), 3).is_empty());
        assert!(extract_highlights(&e, 0).is_empty());
    }
}
