// tests/http_transport.rs
//
// HttpRpcClient against an in-process axum stub speaking the tRPC-style wire
// format (GET ?input=<json> for queries, POST body for mutations).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use engagement_widgets::config::RpcConfig;
use engagement_widgets::{
    DynRpcClient, HttpRpcClient, InteractionTarget, InteractionToggle, MemoryStore, RpcClient,
    StorageKeys, WidgetApi,
};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Stub {
    submits: Arc<Mutex<Vec<Value>>>,
    stats_hits: Arc<AtomicUsize>,
}

async fn content_list(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let input: Value = serde_json::from_str(q.get("input").map(String::as_str).unwrap_or("{}"))
        .unwrap_or(Value::Null);
    let kind = input["kind"].as_str().unwrap_or_default().to_string();
    Json(json!({
        "result": { "data": { "items": [
            { "id": "e1", "title": kind, "body": "a\nb", "metadata": { "version": "9.9" } }
        ] } }
    }))
}

// first call fails with 503 to exercise the retry path
async fn stats(State(stub): State<Stub>) -> Response {
    if stub.stats_hits.fetch_add(1, Ordering::SeqCst) == 0 {
        return (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response();
    }
    Json(json!({ "counts": { "like": 12 } })).into_response()
}

async fn submit(State(stub): State<Stub>, Json(body): Json<Value>) -> Json<Value> {
    stub.submits.lock().unwrap().push(body);
    Json(json!({ "result": { "data": { "ok": true } } }))
}

async fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, "nope").into_response()
}

async fn spawn_stub(stub: Stub) -> String {
    let app = Router::new()
        .route("/trpc/content.list", get(content_list))
        .route("/trpc/interactions.stats", get(stats))
        .route("/trpc/interactions.submit", post(submit))
        .route("/trpc/feedback.submit", post(forbidden))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/trpc/")
}

fn client(base_url: String) -> DynRpcClient {
    let cfg = RpcConfig {
        base_url,
        backoff_ms: 10,
        max_retries: 3,
        ..RpcConfig::default()
    };
    Arc::new(HttpRpcClient::from_config(&cfg).unwrap())
}

#[tokio::test]
async fn query_sends_input_and_unwraps_envelope() {
    let base = spawn_stub(Stub::default()).await;
    let api = WidgetApi::new(client(base));

    let items = api.content_list("changelog", 5).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "changelog");
    assert_eq!(items[0].version(), Some("9.9"));
}

#[tokio::test]
async fn toggle_round_trip_with_retry() {
    let stub = Stub::default();
    let base = spawn_stub(stub.clone()).await;
    let api = WidgetApi::new(client(base));

    let t = InteractionToggle::new(
        api,
        MemoryStore::shared(),
        &StorageKeys::default(),
        InteractionTarget::like("post-1"),
    );
    let view = t.load().await;
    assert_eq!(view.count, 12, "503 is retried");
    assert_eq!(stub.stats_hits.load(Ordering::SeqCst), 2);

    let out = t.toggle().await;
    assert_eq!(out.view.count, 13);
    assert_eq!(
        stub.submits.lock().unwrap().clone(),
        vec![json!({ "targetId": "post-1", "kind": "like", "value": 1 })]
    );
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let base = spawn_stub(Stub::default()).await;
    let rpc = client(base);
    let err = rpc
        .mutate("feedback.submit", json!({ "kind": "stars", "data": {} }))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("403"), "{err}");
}

#[tokio::test]
async fn unreachable_backend_is_an_error() {
    // bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = WidgetApi::new(client(format!("http://{addr}")));
    assert!(api.content_list("changelog", 1).await.is_err());
}
