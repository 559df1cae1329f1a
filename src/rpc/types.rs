// src/rpc/types.rs
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const OP_CONTENT_LIST: &str = "content.list";
pub const OP_INTERACTION_STATS: &str = "interactions.stats";
pub const OP_INTERACTION_SUBMIT: &str = "interactions.submit";
pub const OP_FEEDBACK_SUBMIT: &str = "feedback.submit";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContentListArgs<'a> {
    pub kind: &'a str,
    pub limit: u32,
}

/// A likeable/votable thing: `(targetId, kind)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractionTarget {
    #[serde(rename = "targetId")]
    pub target_id: String,
    pub kind: String,
}

impl InteractionTarget {
    pub fn new(target_id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            kind: kind.into(),
        }
    }

    pub fn like(target_id: impl Into<String>) -> Self {
        Self::new(target_id, "like")
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubmitInteractionArgs<'a> {
    #[serde(rename = "targetId")]
    pub target_id: &'a str,
    pub kind: &'a str,
    pub value: i64,
}

/// Server-reported counts for one target. Read-only on the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionAggregate {
    pub counts: BTreeMap<String, u64>,
}

impl InteractionAggregate {
    /// `counts[kind] ?? 0`
    pub fn count(&self, kind: &str) -> u64 {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    /// Lenient decode of `{ counts: { kind: integer } }`.
    /// Missing map → empty; negative, fractional or non-numeric counts are skipped.
    pub fn from_value(v: &Value) -> Self {
        let mut counts = BTreeMap::new();
        if let Some(map) = v.get("counts").and_then(Value::as_object) {
            for (kind, n) in map {
                match as_count(n) {
                    Some(c) => {
                        counts.insert(kind.clone(), c);
                    }
                    None => tracing::debug!(kind = %kind, value = %n, "ignoring non-integer count"),
                }
            }
        }
        Self { counts }
    }
}

fn as_count(n: &Value) -> Option<u64> {
    if let Some(u) = n.as_u64() {
        return Some(u);
    }
    // JSON numbers like 5.0 are still integers
    let f = n.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

/// `{ kind, componentId?, data }` as sent to `feedback.submit`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedbackSubmission {
    pub kind: String,
    #[serde(rename = "componentId", skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    pub data: Map<String, Value>,
}

/// `{ ok }` returned by mutations. A missing or non-boolean `ok` reads as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationAck {
    pub ok: bool,
}

impl MutationAck {
    pub fn from_value(v: &Value) -> Self {
        Self {
            ok: v.get("ok").and_then(Value::as_bool).unwrap_or(false),
        }
    }
}
