// src/rpc/http.rs
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::RpcClient;
use crate::config::RpcConfig;

/// JSON-over-HTTP transport.
/// - query:  `GET  {base}/{name}?input=<json>`
/// - mutate: `POST {base}/{name}` with the args as JSON body
///
/// Responses may be the bare payload or wrapped as `{ "result": { "data": … } }`.
#[derive(Clone)]
pub struct HttpRpcClient {
    base_url: String,
    client: Client,
    timeout: Duration,
    // total attempts, including the first
    max_retries: u8,
    backoff: Duration,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope {
    Wrapped { result: EnvelopeData },
    Bare(Value),
}

impl Envelope {
    fn into_payload(self) -> Value {
        match self {
            Envelope::Wrapped { result } => result.data,
            Envelope::Bare(v) => v,
        }
    }
}

#[derive(Clone, Copy)]
enum Method {
    Get,
    Post,
}

impl HttpRpcClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_config(&RpcConfig {
            base_url: base_url.into(),
            ..RpcConfig::default()
        })
    }

    pub fn from_config(cfg: &RpcConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("engagement-widgets/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .build()
            .context("building http client")?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            client,
            timeout: Duration::from_millis(cfg.timeout_ms),
            max_retries: cfg.max_retries.max(1),
            backoff: Duration::from_millis(cfg.backoff_ms),
        })
    }

    pub fn with_timeout(mut self, ms: u64) -> Self {
        self.timeout = Duration::from_millis(ms);
        self
    }

    /// Total attempts per call, including the first; 0 is treated as 1.
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    async fn call(&self, method: Method, name: &str, args: &Value) -> Result<Value> {
        let url = self.url(name);
        let input = serde_json::to_string(args)?;

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let req = match method {
                Method::Get => self.client.get(&url).query(&[("input", input.as_str())]),
                Method::Post => self.client.post(&url).json(args),
            };
            let res = req.timeout(self.timeout).send().await;

            let retryable = match res {
                Ok(rsp) => {
                    let status = rsp.status();
                    if status.is_success() {
                        let env: Envelope = rsp
                            .json()
                            .await
                            .with_context(|| format!("decode {name} response"))?;
                        return Ok(env.into_payload());
                    }
                    if !is_retryable(status) || attempt >= self.max_retries {
                        return Err(anyhow!("{name}: backend returned HTTP {status}"));
                    }
                    format!("HTTP {status}")
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(anyhow!("{name}: request failed: {e}"));
                    }
                    e.to_string()
                }
            };

            let wait = self.backoff * (1u32 << (attempt - 1).min(16));
            tracing::debug!(op = name, attempt, reason = %retryable, ?wait, "retrying rpc call");
            tokio::time::sleep(wait).await;
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait::async_trait]
impl RpcClient for HttpRpcClient {
    async fn query(&self, name: &str, args: Value) -> Result<Value> {
        self.call(Method::Get, name, &args).await
    }

    async fn mutate(&self, name: &str, args: Value) -> Result<Value> {
        self.call(Method::Post, name, &args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_unwraps_result_data() {
        let env: Envelope =
            serde_json::from_value(json!({ "result": { "data": { "ok": true } } })).unwrap();
        assert_eq!(env.into_payload(), json!({ "ok": true }));

        let bare: Envelope = serde_json::from_value(json!({ "items": [] })).unwrap();
        assert_eq!(bare.into_payload(), json!({ "items": [] }));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = HttpRpcClient::new("http://localhost:3000/api/trpc/").unwrap();
        assert_eq!(c.url("content.list"), "http://localhost:3000/api/trpc/content.list");
    }

    #[test]
    fn retries_count_the_first_attempt() {
        let c = HttpRpcClient::new("http://localhost").unwrap();
        assert_eq!(c.clone().with_retries(0).max_retries, 1);
        assert_eq!(c.with_retries(3).max_retries, 3);
    }
}
