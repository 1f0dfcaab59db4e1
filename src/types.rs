use crate::coin::monero::model::BlockHeader;
use serde_json::{Map, Value};
use tokio::sync::mpsc::{Receiver, Sender};

// ====== Wire records ======
/// One loosely-typed key/value payload as returned by a single RPC call.
pub type WireRecord = Map<String, Value>;

// ====== Channel aliases ======
pub type HeaderSender = Sender<BlockHeader>;
pub type HeaderReceiver = Receiver<BlockHeader>;

pub type Result<T> = std::result::Result<T, DaemonError>;

// ====== Unified Error Type ======
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
  #[error("Transport error: {0}")]
  Transport(String),

  #[error("RPC status: {0}")]
  RpcStatus(String),

  #[error("JSON-RPC error {code}: {message}")]
  JsonRpc { code: i64, message: String },

  #[error("Conflicting values for '{field}': existing {existing}, observed {observed}")]
  DataConflict {
    field: &'static str,
    existing: String,
    observed: String,
  },

  #[error("Cannot merge {entity} {existing} with {entity} {observed}")]
  IdentityMismatch {
    entity: &'static str,
    existing: String,
    observed: String,
  },

  #[error("Malformed response: {0}")]
  MalformedResponse(String),

  #[error("Invalid argument: {0}")]
  InvalidArgument(String),

  #[error("Invalid transaction id")]
  InvalidTransactionId,

  #[error("Not implemented: {0}")]
  Unimplemented(&'static str),

  #[error("Configuration error: {0}")]
  Config(String),
}

impl DaemonError {
  pub fn malformed(msg: impl Into<String>) -> Self {
    DaemonError::MalformedResponse(msg.into())
  }

  pub fn invalid_argument(msg: impl Into<String>) -> Self {
    DaemonError::InvalidArgument(msg.into())
  }
}

// ====== Error Conversions (From impls) ======

impl From<reqwest::Error> for DaemonError {
  fn from(err: reqwest::Error) -> Self {
    DaemonError::Transport(format!("Reqwest error: {}", err))
  }
}

impl From<serde_json::Error> for DaemonError {
  fn from(err: serde_json::Error) -> Self {
    DaemonError::MalformedResponse(format!("JSON parse error: {}", err))
  }
}

impl From<config::ConfigError> for DaemonError {
  fn from(err: config::ConfigError) -> Self {
    DaemonError::Config(err.to_string())
  }
}
