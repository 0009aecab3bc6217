use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{IdentityStore, Keypair};
use crate::error::StoreError;

/// Keypair store on a Redis-compatible REST endpoint (Upstash / Vercel KV).
///
/// Every command is a JSON array POSTed to the base URL with a bearer token;
/// the reply is `{"result": ...}` or `{"error": "..."}`.
pub struct KvIdentityStore {
    client: reqwest::Client,
    url: String,
    token: String,
    key_prefix: String,
}

#[derive(Debug, Deserialize)]
struct KvResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

impl KvIdentityStore {
    pub fn new(url: &str, token: &str, key_prefix: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build key-value store HTTP client")?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            key_prefix: key_prefix.to_string(),
        })
    }

    fn key(&self, handle: &str) -> String {
        format!("{}{}", self.key_prefix, handle)
    }

    async fn command(&self, args: &[&str]) -> Result<Value, StoreError> {
        debug!("KV command {} {}", args[0], args.get(1).unwrap_or(&""));

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: Option<KvResponse> = serde_json::from_str(&body).ok();

        match parsed {
            Some(KvResponse {
                error: Some(error), ..
            }) => Err(StoreError::Remote(error)),
            Some(reply) if status.is_success() => Ok(reply.result),
            _ => Err(StoreError::Remote(format!("HTTP {}: {}", status, body))),
        }
    }
}

/// Decode a stored record. Some writers JSON-encode the record twice, so a
/// string holding JSON is unwrapped once more.
fn decode_keypair(value: Value) -> Result<Option<Keypair>, StoreError> {
    match value {
        Value::Null => Ok(None),
        Value::String(raw) => match serde_json::from_str::<Value>(&raw)? {
            Value::String(inner) => Ok(Some(serde_json::from_str(&inner)?)),
            record => Ok(Some(serde_json::from_value(record)?)),
        },
        record => Ok(Some(serde_json::from_value(record)?)),
    }
}

#[async_trait]
impl IdentityStore for KvIdentityStore {
    async fn get(&self, handle: &str) -> Result<Option<Keypair>, StoreError> {
        let value = self.command(&["GET", &self.key(handle)]).await?;
        decode_keypair(value)
    }

    async fn create_if_absent(&self, handle: &str, keypair: &Keypair) -> Result<bool, StoreError> {
        let record = serde_json::to_string(keypair)?;
        // NX: the write only lands if the key is unset. No expiry.
        let value = self
            .command(&["SET", &self.key(handle), &record, "NX"])
            .await?;
        Ok(value.as_str() == Some("OK"))
    }
}
