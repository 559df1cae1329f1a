// src/config/mod.rs
//! Widget configuration: TOML or JSON file plus env overrides.
//!
//! Lookup order:
//! 1) `$WIDGETS_CONFIG_PATH` (must exist)
//! 2) `config/widgets.toml`
//! 3) `config/widgets.json`
//! 4) built-in defaults
//!
//! Afterwards `WIDGETS_RPC_URL` and `WIDGETS_STORE_PATH` override the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::storage::{FileStore, MemoryStore, SharedStore, StorageKeys, UnavailableStore};
use crate::toggle::FailurePolicy;

pub const ENV_CONFIG_PATH: &str = "WIDGETS_CONFIG_PATH";
pub const ENV_RPC_URL: &str = "WIDGETS_RPC_URL";
pub const ENV_STORE_PATH: &str = "WIDGETS_STORE_PATH";

pub const DEFAULT_FEED_KIND: &str = "changelog";
pub const DEFAULT_PROMPT_TITLE: &str = "New update available!";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub toggle: ToggleConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Attempts per call, including the first (minimum 1).
    pub max_retries: u8,
    pub backoff_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api/trpc".to_string(),
            timeout_ms: 10_000,
            connect_timeout_ms: 4_000,
            max_retries: 3,
            backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file for a durable store; `None` keeps state in memory only.
    pub path: Option<PathBuf>,
    /// Behave as a host without persistence (nothing is ever remembered).
    pub disabled: bool,
    #[serde(flatten)]
    pub keys: StorageKeys,
}

impl StorageConfig {
    pub fn open_store(&self) -> SharedStore {
        if self.disabled {
            return UnavailableStore::shared();
        }
        match &self.path {
            Some(p) => Arc::new(FileStore::open(p)),
            None => MemoryStore::shared(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub kind: String,
    pub list_limit: u32,
    pub bell_limit: u32,
    pub prompt_limit: u32,
    pub indicator_limit: u32,
    pub highlight_count: usize,
    pub prompt_title: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            kind: DEFAULT_FEED_KIND.to_string(),
            list_limit: 20,
            bell_limit: 10,
            prompt_limit: 5,
            indicator_limit: 1,
            highlight_count: 3,
            prompt_title: DEFAULT_PROMPT_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleConfig {
    pub on_submit_failure: FailurePolicy,
}

impl WidgetConfig {
    /// Load from an explicit path. Format is picked by extension, TOML otherwise.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading widget config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: WidgetConfig = if ext == "json" {
            serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
        };
        Ok(cfg.sanitized())
    }

    /// File lookup (see module docs) followed by env overrides.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let toml_p = PathBuf::from("config/widgets.toml");
            let json_p = PathBuf::from("config/widgets.json");
            if toml_p.exists() {
                Self::load_from(&toml_p)?
            } else if json_p.exists() {
                Self::load_from(&json_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_RPC_URL) {
            if !url.trim().is_empty() {
                self.rpc.base_url = url.trim().to_string();
            }
        }
        if let Ok(p) = std::env::var(ENV_STORE_PATH) {
            if !p.trim().is_empty() {
                self.storage.path = Some(PathBuf::from(p.trim()));
            }
        }
    }

    fn sanitized(mut self) -> Self {
        if self.feed.kind.trim().is_empty() {
            self.feed.kind = DEFAULT_FEED_KIND.to_string();
        }
        for limit in [
            &mut self.feed.list_limit,
            &mut self.feed.bell_limit,
            &mut self.feed.prompt_limit,
            &mut self.feed.indicator_limit,
        ] {
            *limit = (*limit).max(1);
        }
        self.rpc.max_retries = self.rpc.max_retries.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn partial_toml_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("widgets.toml");
        fs::write(
            &p,
            r#"
[rpc]
base_url = "https://example.test/trpc"

[feed]
kind = "releases"
bell_limit = 0

[storage]
seen_prefix = "app:seen"

[toggle]
on_submit_failure = "rollback"
"#,
        )
        .unwrap();
        let cfg = WidgetConfig::load_from(&p).unwrap();
        assert_eq!(cfg.rpc.base_url, "https://example.test/trpc");
        assert_eq!(cfg.rpc.max_retries, 3);
        assert_eq!(cfg.feed.kind, "releases");
        assert_eq!(cfg.feed.bell_limit, 1);
        assert_eq!(cfg.feed.highlight_count, 3);
        assert_eq!(cfg.storage.keys.seen_prefix, "app:seen");
        assert_eq!(cfg.storage.keys.interaction_prefix, "flx_int");
        assert_eq!(cfg.toggle.on_submit_failure, FailurePolicy::Rollback);
    }

    #[test]
    fn json_is_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("widgets.json");
        fs::write(&p, r#"{ "feed": { "highlight_count": 5 }, "storage": { "disabled": true } }"#)
            .unwrap();
        let cfg = WidgetConfig::load_from(&p).unwrap();
        assert_eq!(cfg.feed.highlight_count, 5);
        assert!(cfg.storage.disabled);
        assert_eq!(cfg.toggle.on_submit_failure, FailurePolicy::Keep);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD so a real config/ in the repo does not leak in
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_RPC_URL);
        env::remove_var(ENV_STORE_PATH);

        let cfg = WidgetConfig::load_default().unwrap();
        assert_eq!(cfg, WidgetConfig::default());

        fs::create_dir_all("config").unwrap();
        fs::write("config/widgets.json", r#"{ "feed": { "kind": "news" } }"#).unwrap();
        assert_eq!(WidgetConfig::load_default().unwrap().feed.kind, "news");

        let explicit = tmp.path().join("other.toml");
        fs::write(&explicit, "[feed]\nkind = \"explicit\"\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, explicit.display().to_string());
        env::set_var(ENV_RPC_URL, "http://override.test");
        env::set_var(ENV_STORE_PATH, "state/widgets.json");
        let cfg = WidgetConfig::load_default().unwrap();
        assert_eq!(cfg.feed.kind, "explicit");
        assert_eq!(cfg.rpc.base_url, "http://override.test");
        assert_eq!(cfg.storage.path, Some(PathBuf::from("state/widgets.json")));

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(WidgetConfig::load_default().is_err());

        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_RPC_URL);
        env::remove_var(ENV_STORE_PATH);
        env::set_current_dir(&old).unwrap();
    }
}
