// tests/common/mod.rs
// Scripted in-memory RpcClient shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use engagement_widgets::rpc::types::{
    OP_CONTENT_LIST, OP_FEEDBACK_SUBMIT, OP_INTERACTION_STATS, OP_INTERACTION_SUBMIT,
};
use engagement_widgets::{DynRpcClient, RpcClient, WidgetApi};
use serde_json::{json, Value};

#[derive(Default)]
pub struct FakeRpc {
    calls: Mutex<Vec<(String, Value)>>,
    responses: Mutex<HashMap<String, std::result::Result<Value, String>>>,
}

impl FakeRpc {
    pub fn new() -> Arc<Self> {
        let fake = Self::default();
        fake.respond(OP_CONTENT_LIST, json!({ "items": [] }));
        fake.respond(OP_INTERACTION_STATS, json!({ "counts": {} }));
        fake.respond(OP_INTERACTION_SUBMIT, json!({ "ok": true }));
        fake.respond(OP_FEEDBACK_SUBMIT, json!({ "ok": true }));
        Arc::new(fake)
    }

    pub fn respond(&self, op: &str, payload: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(op.to_string(), Ok(payload));
    }

    pub fn fail(&self, op: &str, msg: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(op.to_string(), Err(msg.to_string()));
    }

    pub fn calls_to(&self, op: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == op)
            .map(|(_, args)| args.clone())
            .collect()
    }

    fn answer(&self, name: &str, args: Value) -> Result<Value> {
        self.calls.lock().unwrap().push((name.to_string(), args));
        match self.responses.lock().unwrap().get(name) {
            Some(Ok(v)) => Ok(v.clone()),
            Some(Err(msg)) => Err(anyhow!("{msg}")),
            None => Err(anyhow!("no scripted response for {name}")),
        }
    }
}

#[async_trait::async_trait]
impl RpcClient for FakeRpc {
    async fn query(&self, name: &str, args: Value) -> Result<Value> {
        self.answer(name, args)
    }

    async fn mutate(&self, name: &str, args: Value) -> Result<Value> {
        self.answer(name, args)
    }
}

pub fn api(fake: &Arc<FakeRpc>) -> WidgetApi {
    let client: DynRpcClient = fake.clone();
    WidgetApi::new(client)
}

pub fn changelog_items(versions: &[&str]) -> Value {
    let items: Vec<Value> = versions
        .iter()
        .enumerate()
        .map(|(i, v)| {
            json!({
                "id": format!("entry-{i}"),
                "title": format!("Release {v}"),
                "body": format!("Line one of {v}\n\n  Line two  \nLine three\nLine four"),
                "metadata": { "version": v }
            })
        })
        .collect();
    json!({ "items": items })
}
