//! # Optimistic interaction toggle
//! Like/upvote button state reconciled against an append-only backend counter.
//!
//! - `count` comes from `interactions.stats`; `active` comes from the local
//!   flag only (the server has no per-user identity). An active flag is assumed
//!   to be already included in the server count.
//! - `toggle()` inverts `active` and moves `count` by one in a single locked
//!   step, persisting the flag before anything is sent.
//! - Only activation is submitted (`value: 1`). Deactivation stays local: the
//!   interaction log cannot be negated, so the server count may drift above the
//!   number of currently active clients.
//! - A failed submission keeps the optimistic state unless
//!   [`FailurePolicy::Rollback`] is configured.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::metrics;
use crate::rpc::types::InteractionTarget;
use crate::rpc::WidgetApi;
use crate::storage::{SharedStore, StorageKeys, INTERACTION_FLAG_VALUE};

/// What to do with the optimistic state when `interactions.submit` fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Leave flag and count as set.
    #[default]
    Keep,
    /// Undo the toggle, unless the user toggled again in the meantime.
    Rollback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleView {
    pub count: u64,
    pub active: bool,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Deactivation; nothing is sent.
    Skipped,
    Accepted,
    /// Sent, but the backend failed or answered `ok: false`.
    Failed { rolled_back: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// State right after the optimistic update (before any rollback).
    pub view: ToggleView,
    pub submission: Submission,
}

#[derive(Debug)]
struct Inner {
    count: u64,
    active: bool,
    loading: bool,
    // bumped on every state change; guards rollback against later toggles
    generation: u64,
}

impl Inner {
    fn view(&self) -> ToggleView {
        ToggleView {
            count: self.count,
            active: self.active,
            loading: self.loading,
        }
    }
}

pub struct InteractionToggle {
    api: WidgetApi,
    store: SharedStore,
    target: InteractionTarget,
    flag_key: String,
    policy: FailurePolicy,
    inner: Mutex<Inner>,
}

impl InteractionToggle {
    pub fn new(
        api: WidgetApi,
        store: SharedStore,
        keys: &StorageKeys,
        target: InteractionTarget,
    ) -> Self {
        let flag_key = keys.interaction_flag(&target.kind, &target.target_id);
        Self {
            api,
            store,
            target,
            flag_key,
            policy: FailurePolicy::default(),
            inner: Mutex::new(Inner {
                count: 0,
                active: false,
                loading: true,
                generation: 0,
            }),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn target(&self) -> &InteractionTarget {
        &self.target
    }

    pub fn view(&self) -> ToggleView {
        self.inner.lock().expect("toggle mutex poisoned").view()
    }

    fn flag_is_set(&self) -> bool {
        self.store.get(&self.flag_key).is_some()
    }

    /// Fetch the aggregate and read the local flag. A failed fetch leaves the
    /// toggle `loading`; a late response simply overwrites the display state.
    pub async fn load(&self) -> ToggleView {
        match self.api.interaction_stats(&self.target).await {
            Ok(agg) => {
                let active = self.flag_is_set();
                let mut s = self.inner.lock().expect("toggle mutex poisoned");
                s.count = agg.count(&self.target.kind);
                s.active = active;
                s.loading = false;
                s.generation += 1;
                tracing::debug!(
                    target_id = %self.target.target_id,
                    kind = %self.target.kind,
                    count = s.count,
                    active,
                    "interaction stats loaded"
                );
                s.view()
            }
            Err(e) => {
                tracing::warn!(error = ?e, target_id = %self.target.target_id, "interaction stats fetch failed");
                self.view()
            }
        }
    }

    fn persist_flag(&self, active: bool) {
        let res = if active {
            self.store.set(&self.flag_key, INTERACTION_FLAG_VALUE)
        } else {
            self.store.remove(&self.flag_key)
        };
        if let Err(e) = res {
            tracing::warn!(error = ?e, key = %self.flag_key, "persisting interaction flag failed");
        }
    }

    /// Invert `active`, adjust `count`, persist the flag; then submit if the
    /// toggle turned on. The local update completes before the first await.
    pub async fn toggle(&self) -> ToggleOutcome {
        let (view, generation) = {
            let mut s = self.inner.lock().expect("toggle mutex poisoned");
            let next = !s.active;
            s.active = next;
            s.count = if next {
                s.count.saturating_add(1)
            } else {
                s.count.saturating_sub(1)
            };
            s.generation += 1;
            self.persist_flag(next);
            (s.view(), s.generation)
        };
        metrics::incr(metrics::TOGGLE_TOTAL);

        if !view.active {
            tracing::debug!(target_id = %self.target.target_id, "deactivated locally; nothing to submit");
            return ToggleOutcome {
                view,
                submission: Submission::Skipped,
            };
        }

        metrics::incr(metrics::INTERACTION_SUBMIT);
        let ok = match self.api.submit_interaction(&self.target, 1).await {
            Ok(ack) if ack.ok => true,
            Ok(_) => {
                tracing::warn!(target_id = %self.target.target_id, "interaction submit rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = ?e, target_id = %self.target.target_id, "interaction submit failed");
                false
            }
        };

        let submission = if ok {
            Submission::Accepted
        } else {
            metrics::incr(metrics::INTERACTION_SUBMIT_ERRORS);
            Submission::Failed {
                rolled_back: self.policy == FailurePolicy::Rollback && self.rollback(generation),
            }
        };
        ToggleOutcome { view, submission }
    }

    fn rollback(&self, generation: u64) -> bool {
        let mut s = self.inner.lock().expect("toggle mutex poisoned");
        if s.generation != generation || !s.active {
            return false;
        }
        s.active = false;
        s.count = s.count.saturating_sub(1);
        s.generation += 1;
        self.persist_flag(false);
        tracing::debug!(target_id = %self.target.target_id, "optimistic toggle rolled back");
        true
    }
}
