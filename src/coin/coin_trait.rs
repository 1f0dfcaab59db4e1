/**
* filename : coin_trait
* author : HAMA
* date: 2025. 4. 7.
* description: Collaborator seams around the reconciliation core. The
*              transport moves payloads; the codec turns binary payloads
*              into wire records.
**/

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{Result, WireRecord};

#[async_trait]
pub trait DaemonTransport: Send + Sync {
  /// JSON-RPC call against `/json_rpc`. Returns the whole response
  /// envelope (`result`, `id`, ...).
  async fn send_json_request(&self, method: &str, params: Option<Value>) -> Result<WireRecord>;

  /// Plain JSON call against `/{path}`.
  async fn send_path_request(&self, path: &str, params: Option<Value>) -> Result<WireRecord>;

  /// Binary call against `/{path}` with an already encoded body.
  async fn send_binary_request(&self, path: &str, body: Vec<u8>) -> Result<Vec<u8>>;
}

/// Portable-storage codec for the `.bin` endpoints.
pub trait BinaryCodec: Send + Sync {
  fn encode_params(&self, params: &Value) -> Result<Vec<u8>>;

  /// Decode a `get_blocks_by_height.bin` response into a record with
  /// `status` and the parallel `blocks` / `txs` arrays.
  fn decode_blocks(&self, raw: &[u8]) -> Result<WireRecord>;
}
