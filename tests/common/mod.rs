#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use xmr_daemon_rpc::{BinaryCodec, DaemonError, DaemonTransport, Result, WireRecord};

pub const NULL_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

pub fn record(value: Value) -> WireRecord {
  match value {
    Value::Object(record) => record,
    other => panic!("not a record: {}", other),
  }
}

/// Canned responses keyed by JSON-RPC method, path or binary path.
#[derive(Default)]
pub struct ScriptedTransport {
  json: HashMap<String, Value>,
  paths: HashMap<String, Value>,
  binary: HashMap<String, Vec<u8>>,
  calls: Mutex<Vec<(String, Option<Value>)>>,
}

impl ScriptedTransport {
  pub fn new() -> Self {
    Self::default()
  }

  /// Script the `result` member of a JSON-RPC method.
  pub fn json(mut self, method: &str, result: Value) -> Self {
    self.json.insert(method.to_string(), json!({ "jsonrpc": "2.0", "id": "0", "result": result }));
    self
  }

  pub fn path(mut self, path: &str, resp: Value) -> Self {
    self.paths.insert(path.to_string(), resp);
    self
  }

  pub fn binary(mut self, path: &str, raw: Vec<u8>) -> Self {
    self.binary.insert(path.to_string(), raw);
    self
  }

  /// Params of every call made to `name`, in order.
  pub fn calls_to(&self, name: &str) -> Vec<Option<Value>> {
    self
      .calls
      .lock()
      .unwrap()
      .iter()
      .filter(|(called, _)| called == name)
      .map(|(_, params)| params.clone())
      .collect()
  }

  fn log(&self, name: &str, params: Option<Value>) {
    self.calls.lock().unwrap().push((name.to_string(), params));
  }
}

fn unscripted(name: &str) -> DaemonError {
  DaemonError::Transport(format!("no script for {}", name))
}

#[async_trait]
impl DaemonTransport for ScriptedTransport {
  async fn send_json_request(&self, method: &str, params: Option<Value>) -> Result<WireRecord> {
    self.log(method, params);
    match self.json.get(method) {
      Some(Value::Object(envelope)) => Ok(envelope.clone()),
      _ => Err(unscripted(method)),
    }
  }

  async fn send_path_request(&self, path: &str, params: Option<Value>) -> Result<WireRecord> {
    self.log(path, params);
    match self.paths.get(path) {
      Some(Value::Object(resp)) => Ok(resp.clone()),
      _ => Err(unscripted(path)),
    }
  }

  async fn send_binary_request(&self, path: &str, body: Vec<u8>) -> Result<Vec<u8>> {
    self.log(path, serde_json::from_slice(&body).ok());
    self.binary.get(path).cloned().ok_or_else(|| unscripted(path))
  }
}

/// Encodes params as JSON and "decodes" any payload to a fixed record.
pub struct ScriptedCodec {
  pub decoded: WireRecord,
}

impl BinaryCodec for ScriptedCodec {
  fn encode_params(&self, params: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(params)?)
  }

  fn decode_blocks(&self, _raw: &[u8]) -> Result<WireRecord> {
    Ok(self.decoded.clone())
  }
}

/// Coinbase record as found under `miner_tx`.
pub fn miner_tx(height: u64) -> Value {
  json!({
    "version": 2,
    "unlock_time": height + 60,
    "vin": [{ "gen": { "height": height } }],
    "vout": [{ "amount": 600000000000u64, "target": { "tagged_key": { "key": format!("cb{}", height), "view_tag": "0b" } } }],
    "extra": [1, 2, 3],
    "rct_signatures": { "type": 0 }
  })
}

/// Hashless tx record as found in a binary block payload.
pub fn block_tx(key_image: &str) -> Value {
  json!({
    "version": 2,
    "unlock_time": 0,
    "vin": [{ "key": { "amount": 0, "k_image": key_image, "key_offsets": [5, 9, 14] } }],
    "vout": [
      { "amount": 0, "target": { "tagged_key": { "key": format!("{}-out0", key_image), "view_tag": "a1" } } },
      { "amount": 0, "target": { "tagged_key": { "key": format!("{}-out1", key_image), "view_tag": "a2" } } }
    ],
    "extra": [1],
    "rct_signatures": { "type": 6, "txnFee": 30000 }
  })
}
