/**
* filename : router
* author : HAMA
* date: 2025. 4. 8.
* description: Picks the RPC shape for a call and enforces the status envelope.
*              Nothing downstream sees a payload whose `status` is not "OK".
**/
use crate::coin::coin_trait::{BinaryCodec, DaemonTransport};
use crate::types::{DaemonError, Result, WireRecord};
use log::debug;
use serde_json::Value;
use std::sync::Arc;

pub const STATUS_OK: &str = "OK";

/// Fail with [`DaemonError::RpcStatus`] unless the record's status is `"OK"`.
/// A missing status is reported as such.
pub fn check_status(record: &WireRecord) -> Result<()> {
  match record.get("status") {
    Some(Value::String(status)) if status == STATUS_OK => Ok(()),
    Some(Value::String(status)) => Err(DaemonError::RpcStatus(status.clone())),
    Some(other) => Err(DaemonError::RpcStatus(other.to_string())),
    None => Err(DaemonError::RpcStatus("missing status".to_string())),
  }
}

#[derive(Clone)]
pub struct Router {
  transport: Arc<dyn DaemonTransport>,
  codec: Option<Arc<dyn BinaryCodec>>,
}

impl Router {
  pub fn new(transport: Arc<dyn DaemonTransport>, codec: Option<Arc<dyn BinaryCodec>>) -> Self {
    Self { transport, codec }
  }

  /// The raw `result` member of a JSON-RPC response, unchecked.
  pub async fn json_value(&self, method: &str, params: Option<Value>) -> Result<Value> {
    debug!("json_rpc {} {:?}", method, params);
    let mut envelope = self.transport.send_json_request(method, params).await?;
    envelope
      .remove("result")
      .ok_or_else(|| DaemonError::malformed(format!("'{}' response has no result", method)))
  }

  /// The `result` record of a JSON-RPC response, without the status check.
  /// For methods whose error states arrive in-band.
  pub async fn json_result_unchecked(&self, method: &str, params: Option<Value>) -> Result<WireRecord> {
    match self.json_value(method, params).await? {
      Value::Object(result) => Ok(result),
      other => Err(DaemonError::malformed(format!("'{}' result is not a record: {}", method, other))),
    }
  }

  /// The `result` record of a JSON-RPC response, status checked.
  pub async fn json_result(&self, method: &str, params: Option<Value>) -> Result<WireRecord> {
    let result = self.json_result_unchecked(method, params).await?;
    check_status(&result)?;
    Ok(result)
  }

  /// A bare path call, status checked.
  pub async fn path(&self, path: &str, params: Option<Value>) -> Result<WireRecord> {
    let resp = self.path_unchecked(path, params).await?;
    check_status(&resp)?;
    Ok(resp)
  }

  pub async fn path_unchecked(&self, path: &str, params: Option<Value>) -> Result<WireRecord> {
    debug!("path {} {:?}", path, params);
    self.transport.send_path_request(path, params).await
  }

  /// The codec for binary calls, if one was configured.
  pub fn codec(&self) -> Result<&dyn BinaryCodec> {
    self.codec
      .as_deref()
      .ok_or(DaemonError::Unimplemented("binary requests without a codec"))
  }

  /// Encode `params`, send them to a `.bin` path and return the raw reply.
  pub async fn binary(&self, path: &str, params: &Value) -> Result<Vec<u8>> {
    let body = self.codec()?.encode_params(params)?;
    debug!("binary {} ({} bytes)", path, body.len());
    self.transport.send_binary_request(path, body).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn only_ok_passes() {
    assert!(check_status(json!({ "status": "OK" }).as_object().unwrap()).is_ok());
    let busy = check_status(json!({ "status": "BUSY" }).as_object().unwrap()).unwrap_err();
    assert!(matches!(busy, DaemonError::RpcStatus(ref s) if s == "BUSY"));
    assert!(check_status(json!({}).as_object().unwrap()).is_err());
  }
}
