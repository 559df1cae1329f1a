//! Remote procedure surface used by every widget.
//!
//! [`RpcClient`] is the untyped transport seam (`query`/`mutate` by operation
//! name). [`WidgetApi`] wraps it with the four operations the widgets call and
//! validates payloads before they reach the state machines.

pub mod http;
pub mod types;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::feed::FeedEntry;
use types::{
    ContentListArgs, FeedbackSubmission, InteractionAggregate, InteractionTarget, MutationAck,
    SubmitInteractionArgs, OP_CONTENT_LIST, OP_FEEDBACK_SUBMIT, OP_INTERACTION_STATS,
    OP_INTERACTION_SUBMIT,
};

#[async_trait::async_trait]
pub trait RpcClient: Send + Sync {
    async fn query(&self, name: &str, args: Value) -> Result<Value>;
    async fn mutate(&self, name: &str, args: Value) -> Result<Value>;
}

pub type DynRpcClient = Arc<dyn RpcClient>;

// --- tolerant shapes of content.list output ---

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListAny {
    Wrapped { items: Vec<Value> },
    Bare(Vec<Value>),
}

/// Typed facade over an [`RpcClient`].
#[derive(Clone)]
pub struct WidgetApi {
    client: DynRpcClient,
}

impl WidgetApi {
    pub fn new(client: DynRpcClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &DynRpcClient {
        &self.client
    }

    /// `content.list { kind, limit }` → entries, newest first.
    /// Malformed entries are dropped; a payload without an item list is an error.
    pub async fn content_list(&self, kind: &str, limit: u32) -> Result<Vec<FeedEntry>> {
        let args = serde_json::to_value(ContentListArgs { kind, limit })?;
        let raw = self
            .client
            .query(OP_CONTENT_LIST, args)
            .await
            .with_context(|| format!("{OP_CONTENT_LIST} kind={kind}"))?;

        let items = match serde_json::from_value::<ListAny>(raw) {
            Ok(ListAny::Wrapped { items }) | Ok(ListAny::Bare(items)) => items,
            Err(e) => bail!("{OP_CONTENT_LIST} returned no item list: {e}"),
        };

        let total = items.len();
        let entries: Vec<FeedEntry> = items.iter().filter_map(FeedEntry::from_value).collect();
        if entries.len() < total {
            tracing::warn!(
                kind,
                dropped = total - entries.len(),
                "malformed feed entries dropped"
            );
        }
        Ok(entries)
    }

    pub async fn interaction_stats(
        &self,
        target: &InteractionTarget,
    ) -> Result<InteractionAggregate> {
        let args = serde_json::to_value(target)?;
        let raw = self
            .client
            .query(OP_INTERACTION_STATS, args)
            .await
            .with_context(|| format!("{OP_INTERACTION_STATS} target={}", target.target_id))?;
        Ok(InteractionAggregate::from_value(&raw))
    }

    /// Appends one interaction. The backend log has no negate/delete operation.
    pub async fn submit_interaction(
        &self,
        target: &InteractionTarget,
        value: i64,
    ) -> Result<MutationAck> {
        let args = serde_json::to_value(SubmitInteractionArgs {
            target_id: &target.target_id,
            kind: &target.kind,
            value,
        })?;
        let raw = self
            .client
            .mutate(OP_INTERACTION_SUBMIT, args)
            .await
            .with_context(|| format!("{OP_INTERACTION_SUBMIT} target={}", target.target_id))?;
        Ok(MutationAck::from_value(&raw))
    }

    pub async fn submit_feedback(&self, submission: &FeedbackSubmission) -> Result<MutationAck> {
        let args = serde_json::to_value(submission)?;
        let raw = self
            .client
            .mutate(OP_FEEDBACK_SUBMIT, args)
            .await
            .with_context(|| format!("{OP_FEEDBACK_SUBMIT} kind={}", submission.kind))?;
        Ok(MutationAck::from_value(&raw))
    }
}

impl From<DynRpcClient> for WidgetApi {
    fn from(client: DynRpcClient) -> Self {
        Self::new(client)
    }
}
