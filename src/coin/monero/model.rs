/**
* filename : model
* author : HAMA
* description: Typed Monero daemon entities. Every field is optional so partial
*              views from different RPC calls can be merged field by field.
**/

use crate::types::{DaemonError, Result};
use serde::Serialize;
use serde_json::Value;

// ====== Blocks ======

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockHeader {
  pub hash: Option<String>,
  pub height: Option<u64>,
  pub prev_hash: Option<String>,
  pub timestamp: Option<u64>,
  pub difficulty: Option<u128>,
  pub cumulative_difficulty: Option<u128>,
  pub size: Option<u64>,
  pub weight: Option<u64>,
  pub long_term_weight: Option<u64>,
  pub depth: Option<u64>,
  pub nonce: Option<u64>,
  pub major_version: Option<u32>,
  pub minor_version: Option<u32>,
  pub num_txs: Option<u64>,
  pub reward: Option<u64>,
  pub pow_hash: Option<String>,
  pub orphan_status: Option<bool>,
  pub miner_tx_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Block {
  pub header: BlockHeader,
  pub hex: Option<String>,
  /// Hashes of the non-coinbase transactions, in block order.
  pub tx_hashes: Option<Vec<String>>,
  pub coinbase_tx: Option<Tx>,
  /// Materialized transactions; each identity appears once.
  pub txs: Vec<Tx>,
}

impl Block {
  pub fn tx(&self, hash: &str) -> Option<&Tx> {
    self.txs.iter().find(|tx| tx.hash.as_deref() == Some(hash))
  }
}

/// Non-owning pointer from a transaction to the block that contains it.
///
/// Holds identifiers for lookup plus the timestamp the daemon reported next
/// to them; the block itself owns the transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockRef {
  pub hash: Option<String>,
  pub height: Option<u64>,
  pub timestamp: Option<u64>,
}

impl BlockRef {
  pub fn of(header: &BlockHeader) -> Self {
    Self {
      hash: header.hash.clone(),
      height: header.height,
      timestamp: header.timestamp,
    }
  }
}

// ====== Transactions ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TxState {
  MemPool,
  Confirmed,
  FailedUnconfirmed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tx {
  pub hash: Option<String>,
  pub block: Option<BlockRef>,
  pub version: Option<u32>,
  pub is_coinbase: Option<bool>,
  pub size: Option<u64>,
  pub weight: Option<u64>,
  pub fee: Option<u64>,
  pub extra: Option<Vec<u8>>,
  pub unlock_time: Option<u64>,
  pub full_hex: Option<String>,
  pub pruned_hex: Option<String>,
  pub prunable_hex: Option<String>,
  pub prunable_hash: Option<String>,
  pub signatures: Option<Vec<String>>,
  pub rct_signatures: Option<Value>,
  pub rct_sig_prunable: Option<Value>,
  pub is_relayed: Option<bool>,
  pub do_not_relay: Option<bool>,
  pub in_tx_pool: Option<bool>,
  pub is_confirmed: Option<bool>,
  pub num_confirmations: Option<u64>,
  pub is_double_spend: Option<bool>,
  pub is_failed: Option<bool>,
  pub last_failed_height: Option<u64>,
  pub last_failed_hash: Option<String>,
  pub max_used_block_height: Option<u64>,
  pub max_used_block_hash: Option<String>,
  pub is_kept_by_block: Option<bool>,
  pub received_timestamp: Option<u64>,
  pub last_relayed_timestamp: Option<u64>,
  pub output_indices: Option<Vec<u64>>,
  pub inputs: Option<Vec<Output>>,
  pub outputs: Option<Vec<Output>>,
}

impl Tx {
  /// Stub for a transaction read out of a block body.
  pub fn in_block() -> Self {
    Self {
      is_confirmed: Some(true),
      in_tx_pool: Some(false),
      is_coinbase: Some(false),
      do_not_relay: Some(false),
      is_relayed: Some(true),
      is_failed: Some(false),
      is_double_spend: Some(false),
      ..Default::default()
    }
  }

  /// Stub for a transaction listed by the pool.
  pub fn in_pool() -> Self {
    Self {
      is_confirmed: Some(false),
      in_tx_pool: Some(true),
      is_coinbase: Some(false),
      num_confirmations: Some(0),
      ..Default::default()
    }
  }

  pub fn coinbase() -> Self {
    Self {
      is_confirmed: Some(true),
      in_tx_pool: Some(false),
      is_coinbase: Some(true),
      ..Default::default()
    }
  }

  pub fn height(&self) -> Option<u64> {
    self.block.as_ref().and_then(|block| block.height)
  }

  /// Derived lifecycle state; `None` while the flags are still unknown.
  pub fn state(&self) -> Option<TxState> {
    if self.is_confirmed == Some(true) {
      Some(TxState::Confirmed)
    } else if self.in_tx_pool == Some(true) {
      Some(TxState::MemPool)
    } else if self.is_failed == Some(true) {
      Some(TxState::FailedUnconfirmed)
    } else {
      None
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyImage {
  pub hex: String,
  pub signature: Option<String>,
}

impl KeyImage {
  pub fn new(hex: impl Into<String>) -> Self {
    Self {
      hex: hex.into(),
      signature: None,
    }
  }
}

/// A transaction input (key image, ring) or output (stealth key, index).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Output {
  pub amount: Option<u64>,
  pub key_image: Option<KeyImage>,
  pub ring_output_indices: Option<Vec<u64>>,
  pub stealth_public_key: Option<String>,
  pub view_tag: Option<String>,
  /// Global output index, known once the tx's `output_indices` are merged in.
  pub index: Option<u64>,
}

// ====== Closed enumerations ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyImageSpentStatus {
  NotSpent,
  Confirmed,
  InPool,
}

impl KeyImageSpentStatus {
  pub fn from_code(code: u64) -> Result<Self> {
    match code {
      0 => Ok(KeyImageSpentStatus::NotSpent),
      1 => Ok(KeyImageSpentStatus::Confirmed),
      2 => Ok(KeyImageSpentStatus::InPool),
      other => Err(DaemonError::malformed(format!("invalid spent status: {}", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HardForkState {
  LikelyForked,
  UpdateNeeded,
  Ready,
}

impl HardForkState {
  pub fn from_code(code: u64) -> Result<Self> {
    match code {
      0 => Ok(HardForkState::LikelyForked),
      1 => Ok(HardForkState::UpdateNeeded),
      2 => Ok(HardForkState::Ready),
      other => Err(DaemonError::malformed(format!("invalid hard fork state: {}", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NetworkType {
  Mainnet,
  Testnet,
  Stagenet,
  Fakechain,
}

impl NetworkType {
  pub fn parse(name: &str) -> Result<Self> {
    match name {
      "mainnet" => Ok(NetworkType::Mainnet),
      "testnet" => Ok(NetworkType::Testnet),
      "stagenet" => Ok(NetworkType::Stagenet),
      "fakechain" => Ok(NetworkType::Fakechain),
      other => Err(DaemonError::malformed(format!("invalid network type: {}", other))),
    }
  }
}

// ====== Flat records ======

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Peer {
  pub id: Option<String>,
  pub address: Option<String>,
  pub host: Option<String>,
  pub port: Option<u32>,
  pub rpc_port: Option<u32>,
  pub is_online: Option<bool>,
  pub last_seen_timestamp: Option<u64>,
  pub pruning_seed: Option<u32>,
  pub rpc_credits_per_hash: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Connection {
  pub id: Option<String>,
  pub peer: Peer,
  pub address_type: Option<u32>,
  pub avg_download: Option<u64>,
  pub avg_upload: Option<u64>,
  pub current_download: Option<u64>,
  pub current_upload: Option<u64>,
  pub height: Option<u64>,
  pub is_incoming: Option<bool>,
  pub live_time: Option<u64>,
  pub is_local_ip: Option<bool>,
  pub is_local_host: Option<bool>,
  pub num_receives: Option<u64>,
  pub receive_idle_time: Option<u64>,
  pub num_sends: Option<u64>,
  pub send_idle_time: Option<u64>,
  pub state: Option<String>,
  pub num_support_flags: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MiningStatus {
  pub is_active: Option<bool>,
  pub is_background: Option<bool>,
  pub address: Option<String>,
  pub speed: Option<u64>,
  pub num_threads: Option<u32>,
  pub pow_algorithm: Option<String>,
  pub block_reward: Option<u64>,
  pub block_target: Option<u64>,
  pub difficulty: Option<u128>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncInfo {
  pub height: Option<u64>,
  pub target_height: Option<u64>,
  pub next_needed_pruning_seed: Option<u32>,
  pub connections: Option<Vec<Connection>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HardForkInfo {
  pub earliest_height: Option<u64>,
  pub is_enabled: Option<bool>,
  pub state: Option<HardForkState>,
  pub threshold: Option<u32>,
  pub version: Option<u32>,
  pub num_votes: Option<u32>,
  pub voting: Option<u32>,
  pub window: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmitTxResult {
  pub is_good: Option<bool>,
  pub is_relayed: Option<bool>,
  pub is_double_spend: Option<bool>,
  pub is_fee_too_low: Option<bool>,
  pub is_mixin_too_low: Option<bool>,
  pub has_invalid_input: Option<bool>,
  pub has_invalid_output: Option<bool>,
  pub has_too_few_outputs: Option<bool>,
  pub is_rct: Option<bool>,
  pub is_overspend: Option<bool>,
  pub is_too_big: Option<bool>,
  pub sanity_check_failed: Option<bool>,
  pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateCheckResult {
  pub is_update_available: Option<bool>,
  pub version: Option<String>,
  pub hash: Option<String>,
  pub auto_uri: Option<String>,
  pub user_uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateDownloadResult {
  pub check: UpdateCheckResult,
  pub download_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DaemonInfo {
  pub version: Option<String>,
  pub network_type: Option<NetworkType>,
  pub height: Option<u64>,
  pub height_without_bootstrap: Option<u64>,
  pub target_height: Option<u64>,
  pub target: Option<u64>,
  pub top_block_hash: Option<String>,
  pub difficulty: Option<u128>,
  pub cumulative_difficulty: Option<u128>,
  pub num_alt_blocks: Option<u64>,
  pub block_size_limit: Option<u64>,
  pub block_size_median: Option<u64>,
  pub block_weight_limit: Option<u64>,
  pub block_weight_median: Option<u64>,
  pub bootstrap_daemon_address: Option<String>,
  pub free_space: Option<u64>,
  pub database_size: Option<u64>,
  pub num_offline_peers: Option<u64>,
  pub num_online_peers: Option<u64>,
  pub num_incoming_connections: Option<u64>,
  pub num_outgoing_connections: Option<u64>,
  pub num_rpc_connections: Option<u64>,
  pub num_txs: Option<u64>,
  pub num_txs_pool: Option<u64>,
  pub start_timestamp: Option<u64>,
  pub is_offline: Option<bool>,
  pub is_busy_syncing: Option<bool>,
  pub is_synchronized: Option<bool>,
  pub was_bootstrap_ever_used: Option<bool>,
  pub update_available: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockTemplate {
  pub block_template_blob: Option<String>,
  pub block_hashing_blob: Option<String>,
  pub difficulty: Option<u128>,
  pub expected_reward: Option<u64>,
  pub height: Option<u64>,
  pub prev_hash: Option<String>,
  pub reserved_offset: Option<u64>,
  pub seed_height: Option<u64>,
  pub seed_hash: Option<String>,
  pub next_seed_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoinbaseTxSum {
  pub emission_sum: Option<u128>,
  pub fee_sum: Option<u128>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputHistogramEntry {
  pub amount: Option<u64>,
  pub num_instances: Option<u64>,
  pub num_unlocked_instances: Option<u64>,
  pub num_recent_instances: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ban {
  pub host: Option<String>,
  pub ip: Option<u32>,
  pub is_banned: Option<bool>,
  pub seconds: Option<u64>,
}
