/**
* author : HAMA
* date: 2025. 4. 5.
* description: reqwest transport for monerod's RPC server.
**/

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::coin::coin_trait::DaemonTransport;
use crate::types::{DaemonError, Result, WireRecord};

#[derive(Clone)]
pub struct HttpTransport {
  client: Client,
  api_url: String,
}

impl HttpTransport {
  pub fn new(api_url: String, timeout: Duration) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      api_url: api_url.trim_end_matches('/').to_string(),
    })
  }

  pub fn api_url(&self) -> &str {
    &self.api_url
  }

  async fn post_json(&self, url: &str, payload: &Value) -> Result<WireRecord> {
    let response = self
      .client
      .post(url)
      .header("Content-Type", "application/json")
      .json(payload)
      .send()
      .await?
      .error_for_status()?;
    match response.json::<Value>().await? {
      Value::Object(record) => Ok(record),
      other => Err(DaemonError::malformed(format!("response from {} is not a record: {}", url, other))),
    }
  }
}

/// Surface a JSON-RPC `error` member as [`DaemonError::JsonRpc`].
fn check_json_rpc_error(envelope: &WireRecord) -> Result<()> {
  let Some(error) = envelope.get("error") else {
    return Ok(());
  };
  let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
  let message = error
    .get("message")
    .and_then(Value::as_str)
    .unwrap_or_default()
    .to_string();
  Err(DaemonError::JsonRpc { code, message })
}

#[async_trait]
impl DaemonTransport for HttpTransport {
  async fn send_json_request(&self, method: &str, params: Option<Value>) -> Result<WireRecord> {
    let mut payload = json!({
      "jsonrpc": "2.0",
      "id": "0",
      "method": method,
    });
    if let Some(params) = params {
      payload["params"] = params;
    }
    let url = format!("{}/json_rpc", self.api_url);
    debug!("POST {} {}", url, method);
    let envelope = self.post_json(&url, &payload).await?;
    check_json_rpc_error(&envelope)?;
    Ok(envelope)
  }

  async fn send_path_request(&self, path: &str, params: Option<Value>) -> Result<WireRecord> {
    let url = format!("{}/{}", self.api_url, path.trim_start_matches('/'));
    debug!("POST {}", url);
    self.post_json(&url, &params.unwrap_or_else(|| json!({}))).await
  }

  async fn send_binary_request(&self, path: &str, body: Vec<u8>) -> Result<Vec<u8>> {
    let url = format!("{}/{}", self.api_url, path.trim_start_matches('/'));
    debug!("POST {} ({} bytes)", url, body.len());
    let bytes = self
      .client
      .post(&url)
      .header("Content-Type", "application/octet-stream")
      .body(body)
      .send()
      .await?
      .error_for_status()?
      .bytes()
      .await?;
    Ok(bytes.to_vec())
  }
}
